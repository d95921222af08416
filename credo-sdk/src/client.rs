//! Async HTTP client for the issuance and verification services.
//!
//! Conflict (409) and not-found (404) are normal outcomes on these APIs, so
//! every response with a JSON body is decoded and returned whatever its status.
//! Only transport and decode failures surface as [`ClientError`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{HealthResponse, HistoryResponse, IssueResponse, LookupResponse, VerifyResponse};

/// Default issuance service base URL.
pub const DEFAULT_ISSUANCE_URL: &str = "http://localhost:3001";
/// Default verification service base URL.
pub const DEFAULT_VERIFICATION_URL: &str = "http://localhost:3002";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

/// Which of the two services a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Issuance,
    Verification,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Issuance => "issuance",
            Service::Verification => "verification",
        }
    }
}

/// Client for both services. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    issuance_api: String,
    verification_api: String,
}

impl Client {
    /// Build a client from the two services' base URLs (scheme, host, port).
    pub fn new(issuance_url: &str, verification_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(issuance_url, verification_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        issuance_url: &str,
        verification_url: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            issuance_api: api_base(issuance_url)?,
            verification_api: api_base(verification_url)?,
        })
    }

    /// Submit credential data for issuance.
    pub async fn issue<T: Serialize + ?Sized>(&self, data: &T) -> Result<IssueResponse, ClientError> {
        self.post(&format!("{}/issue", self.issuance_api), data).await
    }

    /// Submit credential data for verification.
    pub async fn verify<T: Serialize + ?Sized>(&self, data: &T) -> Result<VerifyResponse, ClientError> {
        self.post(&format!("{}/verify", self.verification_api), data).await
    }

    /// Ask the issuance service whether a credential exists, without side effects.
    pub async fn lookup<T: Serialize + ?Sized>(&self, data: &T) -> Result<LookupResponse, ClientError> {
        self.post(&format!("{}/lookup", self.issuance_api), data).await
    }

    /// Fetch recent verification attempts, most recent first.
    pub async fn history(&self, limit: Option<u32>) -> Result<HistoryResponse, ClientError> {
        let mut req = self.http.get(format!("{}/history", self.verification_api));
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        Ok(req.send().await?.json().await?)
    }

    /// `true` when the service answers its health check with `healthy`.
    pub async fn health(&self, service: Service) -> bool {
        let base = match service {
            Service::Issuance => &self.issuance_api,
            Service::Verification => &self.verification_api,
        };
        let resp = match self.http.get(format!("{base}/health")).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("{} health check failed: {e}", service.name());
                return false;
            }
        };
        match resp.json::<HealthResponse>().await {
            Ok(h) => h.is_healthy(),
            Err(e) => {
                tracing::debug!("{} health check returned bad body: {e}", service.name());
                false
            }
        }
    }

    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<R, ClientError> {
        let resp = self.http.post(url).json(body).send().await?;
        tracing::debug!("POST {url} -> {}", resp.status());
        Ok(resp.json().await?)
    }
}

/// Normalize a service base URL into its `/api` prefix.
fn api_base(url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::InvalidUrl(url.to_string()));
    }
    if trimmed.ends_with("/api") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/api"))
    }
}
