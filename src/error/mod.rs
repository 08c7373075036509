use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Storage failure outside a submission.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Analysis client setup failure.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Listener or runtime failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not open the database or pool.
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    /// Embedded migrations did not apply.
    #[error("Migration failed: {message}")]
    Migration { message: String },

    /// A stored column could not be decoded.
    #[error("Corrupt record {record_id}: {message}")]
    Corrupt { record_id: String, message: String },

    /// Driver-level failure.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Analysis provider errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Retryable failures persisted through every retry.
    #[error("Analysis provider unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    /// Non-2xx response from the provider.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response or completion was not the expected JSON.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Attempt or overall deadline elapsed.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AnalysisError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, transport failures, rate limiting and 5xx responses are
    /// retryable. Client errors and unparseable payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Timeout { .. } | AnalysisError::Http(_) => true,
            AnalysisError::Api { status, .. } => *status == 429 || *status >= 500,
            AnalysisError::Unavailable { .. } | AnalysisError::InvalidResponse { .. } => false,
        }
    }
}

/// Failures of a single submission or lookup, as seen at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Required input absent or malformed. Client error, never retried.
    #[error("{message}")]
    Validation { message: String },

    /// The analysis step failed or timed out. Nothing was persisted.
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// The storage engine rejected a write or read.
    #[error("{0}")]
    Persistence(#[from] StorageError),
}

impl AssessmentError {
    /// Build a validation error from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        AssessmentError::Validation {
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            AssessmentError::Validation { .. } => 400,
            AssessmentError::Analysis(_) | AssessmentError::Persistence(_) => 500,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for analysis provider operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Result type alias for orchestrator operations
pub type AssessmentResult<T> = Result<T, AssessmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");

        let err = StorageError::Corrupt {
            record_id: "rec-1".to_string(),
            message: "bad json".to_string(),
        };
        assert_eq!(err.to_string(), "Corrupt record rec-1: bad json");
    }

    #[test]
    fn test_analysis_error_display() {
        let err = AnalysisError::Unavailable {
            message: "server down".to_string(),
            retries: 3,
        };
        assert_eq!(
            err.to_string(),
            "Analysis provider unavailable: server down (retries: 3)"
        );

        let err = AnalysisError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = AnalysisError::InvalidResponse {
            message: "malformed JSON".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid response: malformed JSON");

        let err = AnalysisError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_analysis_error_retryability() {
        assert!(AnalysisError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(AnalysisError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(AnalysisError::Api {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!AnalysisError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!AnalysisError::InvalidResponse {
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_assessment_error_is_transparent() {
        let err = AssessmentError::validation("Missing userId or answers.");
        assert_eq!(err.to_string(), "Missing userId or answers.");
        assert_eq!(err.status_code(), 400);

        let err: AssessmentError = AnalysisError::Timeout { timeout_ms: 100 }.into();
        assert_eq!(err.to_string(), "Request timeout after 100ms");
        assert_eq!(err.status_code(), 500);

        let err: AssessmentError = StorageError::Connection {
            message: "disk full".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Database connection failed: disk full");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let storage_err = StorageError::Connection {
            message: "x".to_string(),
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }

    #[test]
    fn test_analysis_error_conversion_to_app_error() {
        let analysis_err = AnalysisError::Timeout { timeout_ms: 1000 };
        let app_err: AppError = analysis_err.into();
        assert!(matches!(app_err, AppError::Analysis(_)));
    }
}
