use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::{AppwriteError, PostgresError};

/// Errors surfaced by the recommendation flow
///
/// External ranker failures never appear here; they are recovered by the
/// heuristic fallback inside the recommender.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User store error: {0}")]
    UserStore(#[from] AppwriteError),

    #[error("Block store error: {0}")]
    BlockStore(#[from] PostgresError),
}

impl RecommendError {
    /// HTTP status the error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            RecommendError::Validation(_) => StatusCode::BAD_REQUEST,
            RecommendError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller can fix the request
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl ResponseError for RecommendError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    /// Client errors carry their message; server errors stay generic
    fn error_response(&self) -> HttpResponse {
        let status = self.status();

        let (error, message) = match self {
            RecommendError::Validation(msg) => ("Validation failed", msg.clone()),
            RecommendError::NotFound(msg) => ("Not found", msg.clone()),
            _ => ("Internal server error", "An internal error occurred".to_string()),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}
