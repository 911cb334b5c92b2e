use crate::error::AdventureError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// JSON error body `{"error": "..."}` with a status derived from the failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub fn status_for(err: &AdventureError) -> StatusCode {
    match err {
        AdventureError::SessionNotFound(_) | AdventureError::UnknownImageReference { .. } => {
            StatusCode::NOT_FOUND
        }
        AdventureError::MalformedReply { .. } => StatusCode::BAD_GATEWAY,
        AdventureError::GenerationTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AdventureError::Llm(llm) if llm.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        AdventureError::Llm(_) => StatusCode::BAD_GATEWAY,
        AdventureError::Storage(_) | AdventureError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<AdventureError> for ApiError {
    fn from(err: AdventureError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {err}");
        }
        // Storage and internal details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            err.to_string()
        };
        Self { status, message }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        AdventureError::Other(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
