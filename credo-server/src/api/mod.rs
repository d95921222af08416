//! HTTP API for the issuance and verification services.
//!
//! Handlers read the raw body and parse it themselves so that a missing body,
//! malformed JSON, a non-object and `{}` all get the same 400 response.

pub mod issue;
pub mod verify;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::ApiError;
use crate::identity::CredentialData;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Apply the layers shared by both services.
pub fn with_layers(router: Router, cors_origins: &[String]) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn credential_from_body(body: &[u8]) -> Result<CredentialData, ApiError> {
    CredentialData::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected credential body: {e}");
        ApiError::MissingCredential
    })
}
