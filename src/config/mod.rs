use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini credentials and model.
    pub analysis: AnalysisConfig,
    /// SQLite location and pool size.
    pub database: DatabaseConfig,
    /// Log level and output format.
    pub logging: LoggingConfig,
    /// Per-request timeout and retry policy.
    pub request: RequestConfig,
    /// Submission pipeline policy.
    pub assessment: AssessmentConfig,
    /// HTTP listener address.
    pub server: ServerConfig,
}

/// Analysis provider (Gemini) configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// API key sent as `x-goog-api-key` (`GEMINI_API_KEY`).
    pub api_key: String,
    /// API root without a trailing slash (`GEMINI_BASE_URL`).
    pub base_url: String,
    /// Model name (`GEMINI_MODEL`).
    pub model: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file; parent directories are created (`DATABASE_PATH`).
    pub path: PathBuf,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`).
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (`LOG_LEVEL`).
    pub level: String,
    /// Output format (`LOG_FORMAT`).
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// HTTP request configuration for the analysis call
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Timeout for a single attempt (`REQUEST_TIMEOUT_MS`).
    pub timeout_ms: u64,
    /// Extra attempts after the first (`MAX_RETRIES`).
    pub max_retries: u32,
    /// Base backoff, doubled per retry (`RETRY_DELAY_MS`).
    pub retry_delay_ms: u64,
}

/// Submission pipeline policy
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    /// Bound on the whole analysis step, retries included.
    pub analysis_deadline_ms: u64,
    /// Append rule-engine suggestions after the AI object when persisting.
    pub persist_rule_suggestions: bool,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let analysis = AnalysisConfig {
            api_key: env::var("GEMINI_API_KEY").map_err(|_| AppError::Config {
                message: "GEMINI_API_KEY is required".to_string(),
            })?,
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/assessments.db".to_string()),
            ),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let defaults = RequestConfig::default();
        let request = RequestConfig {
            timeout_ms: parse_var("REQUEST_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            max_retries: parse_var("MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay_ms: parse_var("RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
        };

        let defaults = AssessmentConfig::default();
        let assessment = AssessmentConfig {
            analysis_deadline_ms: parse_var("ANALYSIS_DEADLINE_MS")
                .unwrap_or(defaults.analysis_deadline_ms),
            persist_rule_suggestions: parse_var("PERSIST_RULE_SUGGESTIONS")
                .unwrap_or(defaults.persist_rule_suggestions),
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
        };

        Ok(Config {
            analysis,
            database,
            logging,
            request,
            assessment,
            server,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            analysis_deadline_ms: 60000,
            persist_rule_suggestions: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_config_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay_ms, 500);
    }

    #[test]
    fn test_assessment_config_defaults_keep_rules_inert() {
        let config = AssessmentConfig::default();
        assert!(!config.persist_rule_suggestions);
        assert_eq!(config.analysis_deadline_ms, 60000);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
    }
}
