//! Store and HTTP error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credo_sdk::ErrorResponse;

/// Persistence failure. Fatal for the request that hit it; never retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Credential data is required")]
    MissingCredential,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingCredential => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Credential data is required")),
            )
                .into_response(),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
