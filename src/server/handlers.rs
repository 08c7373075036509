use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use super::SharedState;
use crate::assessment::{Stage, SubmitAssessment};
use crate::error::AssessmentError;
use crate::storage::AssessmentRecord;
use crate::suggestions::SuggestionObject;

/// Body of a successful submission response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Fixed confirmation text.
    pub message: &'static str,
    /// The stored record.
    pub assessment: AssessmentRecord,
    /// The provider's analysis object.
    pub ai_analysis: SuggestionObject,
}

/// Body of a client or server error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Client-facing summary.
    pub message: String,
    /// Underlying cause, server errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Client error carrying only a message
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// Server error with the underlying cause
    pub fn server(cause: impl std::fmt::Display) -> Self {
        Self {
            message: "Server error".to_string(),
            error: Some(cause.to_string()),
        }
    }
}

fn error_response(err: &AssessmentError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match err {
        AssessmentError::Validation { message } => ErrorResponse::client(message.clone()),
        other => ErrorResponse::server(other),
    };
    (status, Json(body)).into_response()
}

/// `POST /api/assessment`
pub async fn submit_assessment(
    State(state): State<SharedState>,
    payload: Result<Json<SubmitAssessment>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed submission body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::client(rejection.body_text())),
            )
                .into_response();
        }
    };

    match state.service.submit(request).await {
        Ok(outcome) => {
            debug!(assessment_id = %outcome.record.id, stage = %Stage::Responded, "Responding");
            let body = SubmissionResponse {
                message: "Assessment submitted!",
                assessment: outcome.record,
                ai_analysis: outcome.ai_analysis,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/assessment/:user_id`
pub async fn latest_assessment(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.service.latest(&user_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::client("No assessment found")),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, StorageError};

    #[test]
    fn test_server_error_shape() {
        let value = serde_json::to_value(ErrorResponse::server("boom")).unwrap();
        assert_eq!(value, json!({"message": "Server error", "error": "boom"}));
    }

    #[test]
    fn test_client_error_shape_has_no_error_field() {
        let value = serde_json::to_value(ErrorResponse::client("Missing userId or answers."))
            .unwrap();
        assert_eq!(value, json!({"message": "Missing userId or answers."}));
    }

    #[test]
    fn test_error_response_status_codes() {
        let resp = error_response(&AssessmentError::validation("bad"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(&AnalysisError::Timeout { timeout_ms: 5 }.into());
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = error_response(
            &StorageError::Connection {
                message: "x".to_string(),
            }
            .into(),
        );
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
