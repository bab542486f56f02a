use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use crate::blockchain::IndexerError;
use crate::db::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream RPC error: {0}")]
    Upstream(String),

    #[error("Invalid address format")]
    InvalidAddress,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred".to_string()),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            ApiError::InvalidAddress => (StatusCode::BAD_REQUEST, "Invalid blockchain address format".to_string()),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidSolanaAddress(_) => ApiError::InvalidAddress,
            ValidationError::InvalidAction(msg) =>
                ApiError::InvalidParameter(format!("Invalid action: {}", msg)),
            ValidationError::MissingParameter(param) =>
                ApiError::BadRequest(format!("Missing parameter: {}", param)),
            ValidationError::InvalidSignature(sig) =>
                ApiError::InvalidParameter(format!("Invalid signature: {}", sig)),
        }
    }
}

impl From<IndexerError> for ApiError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::NoSignatures(address) =>
                ApiError::NotFound(format!("No transactions found for {}", address)),
            IndexerError::BackfillRunning(address) =>
                ApiError::Conflict(format!("Backfill already running for {}", address)),
            IndexerError::Store(e) => ApiError::Store(e),
            IndexerError::Source(e) => ApiError::Upstream(e.to_string()),
        }
    }
}
