//! # Error Handling
//!
//! HTTP-facing errors and how they are turned into responses.
//!
//! ## Error Categories:
//! - **BadRequest**: the client's request could not be read (400)
//! - **TempFile**: staging the upload on disk failed (500)
//! - **Storage**: every storage backend failed (500)
//!
//! Responses are plain text and deliberately generic. The underlying cause
//! is logged where the error is turned into a response and never returned to
//! the client.

use crate::storage::StorageError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    /// Client sent a request we could not read
    BadRequest(String),

    /// The upload could not be staged in the temp directory
    TempFile(std::io::Error),

    /// No storage backend accepted the upload
    Storage(StorageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::TempFile(err) => write!(f, "Temp file error: {}", err),
            AppError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::TempFile(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl AppError {
    /// The text sent to the client.
    fn public_message(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "Failed to read request body",
            AppError::TempFile(_) => "Failed to create temp file",
            AppError::Storage(_) => "Failed to save audio file",
        }
    }
}

/// ## HTTP Status Code Mapping:
/// - BadRequest → 400 (Bad Request)
/// - everything else → 500 (Internal Server Error)
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TempFile(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(self.public_message())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
