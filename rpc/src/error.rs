//! RPC error types and the JSON error envelope.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use attest_node::{ErrorKind, PipelineError};

const INTERNAL_MESSAGE: &str = "internal error";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{error}")]
    Pipeline {
        error: PipelineError,
        /// Show internal messages to the caller (development mode only).
        expose_internal: bool,
    },

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl RpcError {
    pub fn pipeline(error: impl Into<PipelineError>, expose_internal: bool) -> Self {
        RpcError::Pipeline {
            error: error.into(),
            expose_internal,
        }
    }
}

/// `{"error": {...}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (error, expose_internal) = match self {
            RpcError::Pipeline {
                error,
                expose_internal,
            } => (error, expose_internal),
            RpcError::InvalidBody(message) => (PipelineError::validation(message), false),
            RpcError::Server(e) => (PipelineError::internal(e.to_string()), false),
        };

        if error.kind == ErrorKind::Internal {
            tracing::error!(error = %error.message, "internal error");
        }
        let message = if error.kind == ErrorKind::Internal && !expose_internal {
            INTERNAL_MESSAGE.to_string()
        } else {
            error.message
        };

        let status = status_for(error.kind);
        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: error.kind.as_str(),
                message,
                retryable: error.retryable,
                reason: error.reason,
                retry_after: error.retry_after_secs,
            },
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = error.retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::ExternalService), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn rate_limit_sets_retry_after_header() {
        let response = RpcError::pipeline(PipelineError::rate_limited(30), false).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
    }

    #[test]
    fn internal_status_is_kept_when_hidden() {
        let response =
            RpcError::pipeline(PipelineError::internal("lock poisoned"), false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
