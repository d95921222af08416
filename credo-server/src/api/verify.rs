//! Verification service routes.
//!
//! - `POST /api/verify`: check a credential against the issuance state and
//!   log the attempt (200 valid, 404 not found)
//! - `GET  /api/history?limit=N`: recent attempts, newest first
//! - `GET  /api/health`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use credo_sdk::{HealthResponse, HistoryResponse, VerifyResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::lookup::IssuanceLookup;
use crate::verification::{DEFAULT_HISTORY_LIMIT, VerificationStore};

pub const SERVICE_NAME: &str = "verification";

pub struct VerificationState {
    pub store: VerificationStore,
    pub lookup: IssuanceLookup,
}

pub fn router(state: Arc<VerificationState>) -> Router {
    Router::new()
        .route("/api/verify", post(verify))
        .route("/api/history", get(history))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn verify(State(state): State<Arc<VerificationState>>, body: Bytes) -> Result<Response, ApiError> {
    let data = super::credential_from_body(&body)?;
    let issued = state.lookup.find(&data).await;

    let result = state.store.record_verification(
        &data,
        issued.is_some(),
        issued.as_ref().map(|c| c.issued_by.as_str()),
        issued.as_ref().map(|c| c.issued_at.as_str()),
    )?;
    tracing::info!(
        credential_id = %data.id(),
        valid = result.valid,
        worker = %result.verified_by,
        "credential verified"
    );

    let status = if result.valid {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(VerifyResponse::from(result))).into_response())
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    /// Kept as text so a bad value falls back to the default instead of a 400.
    limit: Option<String>,
}

/// Read `?limit=` from its leading digits (`"5abc"` is 5, `"2.7"` is 2).
/// Anything without a positive leading integer gets the default.
fn history_limit(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_HISTORY_LIMIT;
    };
    let raw = raw.trim_start();
    if raw.starts_with('-') {
        return DEFAULT_HISTORY_LIMIT;
    }
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return DEFAULT_HISTORY_LIMIT;
    }
    match digits[..end].parse::<u32>().unwrap_or(u32::MAX) {
        0 => DEFAULT_HISTORY_LIMIT,
        n => n,
    }
}

async fn history(
    State(state): State<Arc<VerificationState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = history_limit(params.limit.as_deref());
    let history = state.store.history(limit)?;
    Ok(Json(HistoryResponse {
        success: true,
        history,
        error: None,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(SERVICE_NAME))
}
