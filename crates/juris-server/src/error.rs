//! HTTP error mapping
//!
//! Input errors become 400, unknown records 404, everything else 500. The
//! body is always `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use juris_extractor::ExtractorError;
use juris_store::{QueryError, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller sent something invalid
    #[error("{0}")]
    BadRequest(String),

    /// The requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Pipeline, model or storage failure
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<ExtractorError> for AppError {
    fn from(e: ExtractorError) -> Self {
        if e.is_client_error() {
            AppError::BadRequest(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::NotFound(e.to_string()),
            StoreError::Invalid(_) => AppError::BadRequest(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Invalid(e) => AppError::BadRequest(e.to_string()),
            QueryError::Store(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use juris_domain::{DomainError, FileType};

    #[test]
    fn test_extractor_errors_split_by_fault() {
        let input = ExtractorError::from(DomainError::UnsupportedMediaType("image/png".to_string()));
        assert_eq!(AppError::from(input).status(), StatusCode::BAD_REQUEST);

        let too_large = ExtractorError::FileTooLarge {
            file_type: FileType::Pdf,
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        let err = AppError::from(too_large);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "File size exceeds maximum allowed size of 10MB");

        let model = ExtractorError::SchemaValidation("missing title".to_string());
        assert_eq!(AppError::from(model).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors() {
        let missing = AppError::from(StoreError::NotFound("abc".to_string()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Extraction with ID abc not found");

        let invalid = AppError::from(StoreError::Invalid(DomainError::EmptyField("title")));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let timeout = AppError::from(StoreError::Timeout("lock".to_string()));
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_errors() {
        let invalid = QueryError::Invalid(DomainError::InvalidPagination("limit".to_string()));
        assert_eq!(AppError::from(invalid).status(), StatusCode::BAD_REQUEST);
    }
}
