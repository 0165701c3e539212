use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::upstream::UpstreamError;

/// Errors surfaced at the HTTP boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required parameter missing or malformed (400)
    #[error("{0}")]
    Validation(String),
    /// Upstream answered without a usable payload (400, raw diagnostic attached)
    #[error("{message}")]
    Rejected { message: String, diagnostic: Value },
    /// No response from upstream after the retry (500, generic body)
    #[error("upstream transport failure: {0}")]
    Transport(String),
    /// Proxy could not reach the CDN (502)
    #[error("proxy error: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Map an upstream failure, using `message` for rejections
    pub fn from_upstream(err: UpstreamError, message: &str) -> Self {
        match err {
            UpstreamError::Transport(e) => ApiError::Transport(e.to_string()),
            UpstreamError::Rejected { raw, .. } => ApiError::Rejected {
                message: message.to_string(),
                diagnostic: raw,
            },
            UpstreamError::Setup(e) => ApiError::Internal(e),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Rejected { .. } => StatusCode::BAD_REQUEST,
            ApiError::Transport(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(message) => json!({ "error": message }),
            ApiError::Rejected {
                message,
                diagnostic,
            } => {
                tracing::warn!("Upstream rejected request: {}", message);
                json!({ "error": message, "apiResponse": diagnostic })
            }
            ApiError::Transport(detail) => {
                tracing::error!("Upstream transport failure: {}", detail);
                json!({ "error": "Internal server error" })
            }
            ApiError::BadGateway(detail) => {
                tracing::error!("Video proxy error: {}", detail);
                json!({ "error": "Proxy error", "detail": detail })
            }
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::validation("Missing subjectId or detailPath").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Transport("reset".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadGateway("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_rejection_keeps_raw_diagnostic() {
        let err = ApiError::from_upstream(
            UpstreamError::Rejected {
                code: Some(500),
                message: None,
                raw: json!({"code": 500}),
            },
            "No streams available",
        );
        match err {
            ApiError::Rejected {
                message,
                diagnostic,
            } => {
                assert_eq!(message, "No streams available");
                assert_eq!(diagnostic["code"], 500);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
