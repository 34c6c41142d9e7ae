//! Structured JSON errors for every route.

use std::any::Any;

use axum::{
    body::Body,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::domains::intake::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    UpstreamError,
    UpstreamTimeout,
    ServerError,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{error, message, status?, detail?}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorKind,
    pub message: String,
    /// Upstream HTTP status, for upstream failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Raw upstream payload, for upstream failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ApiError {
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidInput(message) => ApiError::invalid_request(message),
            ChatError::Upstream {
                status,
                detail,
                message,
            } => ApiError {
                error: ErrorKind::UpstreamError,
                message: format!("LLM error: {}", message),
                status,
                detail: Some(detail),
            },
            ChatError::Timeout(secs) => ApiError::new(
                ErrorKind::UpstreamTimeout,
                format!("LLM did not answer within {}s", secs),
            ),
            ChatError::Internal(e) => {
                error!(error = ?e, "Chat request failed");
                ApiError::server_error(e.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = ?err, "Request failed");
        ApiError::server_error(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.error.status_code(), Json(self)).into_response()
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    error!(panic = %message, "Handler panicked");

    let body = serde_json::to_string(&ApiError::server_error("Internal server error"))
        .unwrap_or_else(|_| r#"{"error":"server_error","message":"Internal server error"}"#.to_string());

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
