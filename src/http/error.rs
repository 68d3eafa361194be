//! HTTP-facing error representation: domain `Error`s are translated into an `ApiError`
//! carrying a status code, a stable machine-readable `code`, and a human `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, code: code.into(), message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse { code: self.code, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

/// Maps domain errors to HTTP status. `ProcessingFailure` never reaches here in
/// practice (it surfaces as a Failed job, not an HTTP error) but is mapped
/// defensively in case a processor-only error type leaks into a handler.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownProcessor(_) => ApiError::bad_request(err.to_string()),
            Error::ExtensionNotAccepted { .. } => ApiError::bad_request(err.to_string()),
            Error::MalformedOptions(_) => ApiError::bad_request(err.to_string()),
            Error::DimensionOutOfRange { .. } => ApiError::bad_request(err.to_string()),
            Error::MissingResult => ApiError::bad_request(err.to_string()),
            Error::JobNotFound(_) => ApiError::not_found(err.to_string()),
            Error::BatchNotFound(_) => ApiError::not_found(err.to_string()),
            Error::ProcessingFailure(_) => ApiError::bad_request(err.to_string()),
            Error::Io(e) => {
                tracing::error!(error = %e, "IO error");
                ApiError::internal("IO error occurred")
            }
            Error::Serialization(_) => ApiError::bad_request(err.to_string()),
            Error::Other(_) => {
                tracing::error!(error = %err, "unexpected error");
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
