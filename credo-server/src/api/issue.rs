//! Issuance service routes.
//!
//! - `POST /api/issue`: issue a credential (201, 409)
//! - `POST /api/lookup`: read-only existence check used by verifiers (200, 404)
//! - `GET  /api/health`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use credo_sdk::{HealthResponse, IssueResponse, LookupResponse};

use crate::error::ApiError;
use crate::issuance::{IssuanceStore, IssueOutcome};

pub const SERVICE_NAME: &str = "issuance";

pub struct IssuanceState {
    pub store: IssuanceStore,
}

pub fn router(state: Arc<IssuanceState>) -> Router {
    Router::new()
        .route("/api/issue", post(issue))
        .route("/api/lookup", post(lookup))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn issue(State(state): State<Arc<IssuanceState>>, body: Bytes) -> Result<Response, ApiError> {
    let data = super::credential_from_body(&body)?;
    let outcome = state.store.issue(&data)?;
    let message = outcome.message();

    match outcome {
        IssueOutcome::Issued(record) => {
            tracing::info!(credential_id = %record.id, worker = %record.issued_by, "credential issued");
            let resp = IssueResponse {
                success: true,
                message: Some(message),
                credential: Some(data.into_fields()),
                issued_by: Some(record.issued_by),
                timestamp: Some(record.issued_at),
                error: None,
            };
            Ok((StatusCode::CREATED, Json(resp)).into_response())
        }
        IssueOutcome::AlreadyIssued(record) => {
            tracing::info!(credential_id = %record.id, issued_by = %record.issued_by, "duplicate issuance rejected");
            let resp = IssueResponse {
                success: false,
                message: Some(message),
                issued_by: Some(record.issued_by),
                ..Default::default()
            };
            Ok((StatusCode::CONFLICT, Json(resp)).into_response())
        }
    }
}

async fn lookup(State(state): State<Arc<IssuanceState>>, body: Bytes) -> Result<Response, ApiError> {
    let data = super::credential_from_body(&body)?;
    let resp = match state.store.lookup(&data)? {
        Some(record) => (
            StatusCode::OK,
            Json(LookupResponse {
                success: true,
                id: Some(record.id.to_string()),
                issued_by: Some(record.issued_by),
                issued_at: Some(record.issued_at),
                message: None,
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(LookupResponse {
                success: false,
                message: Some("Credential not found".to_string()),
                ..Default::default()
            }),
        ),
    };
    Ok(resp.into_response())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(SERVICE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state() -> Arc<IssuanceState> {
        Arc::new(IssuanceState {
            store: IssuanceStore::open_memory("issuer-test").unwrap(),
        })
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn john() -> String {
        json!({"name": "John Doe", "email": "john@example.com", "course": "Kubernetes"}).to_string()
    }

    #[tokio::test]
    async fn issue_new_credential_returns_201() {
        let app = router(test_state());
        let (status, body) = post_json(app, "/api/issue", &john()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "credential issued by issuer-test");
        assert_eq!(body["issuedBy"], "issuer-test");
        assert_eq!(
            body["credential"],
            json!({"name": "John Doe", "email": "john@example.com", "course": "Kubernetes"})
        );
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn issue_duplicate_returns_409_with_original_issuer() {
        let state = test_state();
        let (first, _) = post_json(router(state.clone()), "/api/issue", &john()).await;
        assert_eq!(first, StatusCode::CREATED);

        let (status, body) = post_json(router(state.clone()), "/api/issue", &john()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Credential already issued");
        assert_eq!(body["issuedBy"], "issuer-test");
        assert!(body.get("credential").is_none());
        assert_eq!(state.store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn issue_rejects_empty_bodies_without_writing() {
        let state = test_state();
        for body in ["{}", "", "[]", "null", "{not json"] {
            let (status, resp) = post_json(router(state.clone()), "/api/issue", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(resp["success"], false);
            assert_eq!(resp["error"], "Credential data is required");
        }
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn lookup_reports_found_and_missing() {
        let state = test_state();
        let (status, body) = post_json(router(state.clone()), "/api/lookup", &john()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        post_json(router(state.clone()), "/api/issue", &john()).await;
        let (status, body) = post_json(router(state.clone()), "/api/lookup", &john()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["issuedBy"], "issuer-test");
        assert_eq!(body["id"].as_str().unwrap().len(), 64);
        assert_eq!(state.store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn store_failure_returns_500() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.db");
        let state = Arc::new(IssuanceState {
            store: IssuanceStore::open(&path, "issuer-test").unwrap(),
        });
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE credentials")
            .unwrap();

        let (status, body) = post_json(router(state.clone()), "/api/issue", &john()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Internal server error"}));

        let (status, _) = post_json(router(state), "/api/lookup", &john()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_names_service() {
        let resp = router(test_state())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "healthy", "service": "issuance"}));
    }
}
