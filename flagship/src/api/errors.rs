use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

/// Structured error body returned to API callers.
#[derive(Debug, Serialize)]
pub struct FlagErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
    pub detail: String,
}

/// Failures surfaced over the API. The evaluation path never produces these:
/// unknown keys and malformed conditions resolve to disabled/false there.
/// Only request decoding and administrative mutations can fail.
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("failed to decode request: {0}")]
    RequestDecodingError(String),
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error("flag not found: {0}")]
    FlagNotFound(String),
    #[error("flag already exists: {0}")]
    FlagAlreadyExists(String),
    #[error("invalid flag definition: {0}")]
    InvalidFlagDefinition(String),
}

impl FlagError {
    /// Returns (error_code, status_code) for this error.
    ///
    /// Consolidates error classification in one place so codes and HTTP
    /// statuses cannot drift apart as variants are added.
    fn error_metadata(&self) -> (&'static str, StatusCode) {
        match self {
            FlagError::RequestDecodingError(_) => {
                ("request_decoding_error", StatusCode::BAD_REQUEST)
            }
            FlagError::RequestParsingError(_) => ("request_parsing_error", StatusCode::BAD_REQUEST),
            FlagError::InvalidFlagDefinition(_) => {
                ("invalid_flag_definition", StatusCode::BAD_REQUEST)
            }
            FlagError::FlagAlreadyExists(_) => ("flag_already_exists", StatusCode::BAD_REQUEST),
            FlagError::FlagNotFound(_) => ("flag_not_found", StatusCode::NOT_FOUND),
        }
    }
}

impl IntoResponse for FlagError {
    fn into_response(self) -> Response {
        let (code, status) = self.error_metadata();
        let body = FlagErrorResponse {
            error_type: if status.is_client_error() {
                "validation_error"
            } else {
                "server_error"
            }
            .to_string(),
            code: code.to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
