use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Headline of every failed quote response.
pub const QUOTE_FAILED: &str = "Failed to create quote";

/// Errors the HTTP bridge turns into JSON error responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request body was malformed or named an unknown coverage type.
    #[error("{0}")]
    BadRequest(String),

    /// The quotation call did not answer within the bounded wait.
    #[error("timed out after {0:?} waiting for the quotation service")]
    Timeout(std::time::Duration),

    /// The quotation call failed.
    #[error("quotation service error: {}", .0.message())]
    Rpc(tonic::Status),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Rpc(status) if status.code() == tonic::Code::InvalidArgument => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Rpc(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tonic::Status> for ApiError {
    fn from(status: tonic::Status) -> Self {
        ApiError::Rpc(status)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(status = status.as_u16(), error = %self, "Quote request failed");
        (
            status,
            Json(ErrorBody {
                error: QUOTE_FAILED.to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
