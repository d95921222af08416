//! Verification-side view of the issuance service's state.
//!
//! Two strategies, picked at startup:
//!
//! - **Shared file**: open the issuance database file read-only, run one
//!   select, close it. No handle is kept between requests, so every lookup sees
//!   whatever the issuance service last committed. A missing file means
//!   nothing has been issued yet.
//! - **Remote**: ask the issuance service over HTTP (`POST /api/lookup`).
//!
//! Either way a lookup fault is logged and reported as "not issued": the
//! verification request still completes and is still recorded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use credo_sdk::LookupResponse;
use rusqlite::{Connection, OpenFlags};

use crate::error::StoreError;
use crate::identity::{CredentialData, CredentialId};
use crate::issuance::{self, IssuedCredential};

pub enum IssuanceLookup {
    SharedFile(SharedStoreFile),
    Remote(RemoteIssuance),
}

impl IssuanceLookup {
    pub fn shared_file(path: impl Into<PathBuf>) -> Self {
        IssuanceLookup::SharedFile(SharedStoreFile::new(path))
    }

    pub fn remote(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(IssuanceLookup::Remote(RemoteIssuance::new(base_url, timeout)?))
    }

    /// Human-readable description for startup logs.
    pub fn describe(&self) -> String {
        match self {
            IssuanceLookup::SharedFile(f) => format!("shared file {}", f.path().display()),
            IssuanceLookup::Remote(r) => format!("issuance API {}", r.url),
        }
    }

    /// Find the issuance record for `data`. Never fails; faults degrade to `None`.
    pub async fn find(&self, data: &CredentialData) -> Option<IssuedCredential> {
        match self {
            IssuanceLookup::SharedFile(file) => file.find(&data.id()),
            IssuanceLookup::Remote(remote) => remote.find(data).await,
        }
    }
}

/// The issuance service's database file, read as a throwaway snapshot.
pub struct SharedStoreFile {
    path: PathBuf,
}

impl SharedStoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn find(&self, id: &CredentialId) -> Option<IssuedCredential> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "issuance store file absent; nothing issued yet");
            return None;
        }
        match self.read_snapshot(id) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot read shared issuance store; treating credential as not issued"
                );
                None
            }
        }
    }

    /// Open read-only, select once, and drop the connection before returning.
    pub fn read_snapshot(&self, id: &CredentialId) -> Result<Option<IssuedCredential>, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let found = issuance::select_credential(&conn, id)?;
        drop(conn);
        Ok(found)
    }
}

/// HTTP client for the issuance service's internal lookup endpoint.
pub struct RemoteIssuance {
    http: reqwest::Client,
    url: String,
}

impl RemoteIssuance {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base = base_url.trim_end_matches('/');
        let base = base.strip_suffix("/api").unwrap_or(base);
        Ok(Self {
            http,
            url: format!("{base}/api/lookup"),
        })
    }

    pub async fn find(&self, data: &CredentialData) -> Option<IssuedCredential> {
        match self.fetch(data).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "issuance lookup failed; treating credential as not issued");
                None
            }
        }
    }

    async fn fetch(&self, data: &CredentialData) -> Result<Option<IssuedCredential>, reqwest::Error> {
        let resp = self.http.post(&self.url).json(data.fields()).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: LookupResponse = resp.error_for_status()?.json().await?;
        match (body.success, body.issued_by, body.issued_at) {
            (true, Some(issued_by), Some(issued_at)) => Ok(Some(IssuedCredential {
                id: body.id.map(CredentialId::from_stored).unwrap_or_else(|| data.id()),
                data: data.to_json(),
                issued_by,
                issued_at,
            })),
            _ => {
                tracing::warn!(url = %self.url, %status, "issuance lookup returned an incomplete body");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuance::IssuanceStore;
    use serde_json::json;

    fn credential() -> CredentialData {
        CredentialData::from_value(json!({
            "name": "John Doe",
            "email": "john@example.com",
            "course": "Kubernetes"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_file_means_not_issued() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = IssuanceLookup::shared_file(dir.path().join("absent.db"));
        assert!(lookup.find(&credential()).await.is_none());
        assert!(!dir.path().join("absent.db").exists(), "lookup must not create the file");
    }

    #[tokio::test]
    async fn finds_credential_written_by_issuance_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.db");
        let store = IssuanceStore::open(&path, "issuer-1").unwrap();
        let issued = store.issue(&credential()).unwrap();

        // Store still open: the snapshot reader sees committed rows.
        let lookup = IssuanceLookup::shared_file(&path);
        let found = lookup.find(&credential()).await.unwrap();
        assert_eq!(&found, issued.record());
    }

    #[tokio::test]
    async fn sees_rows_committed_after_previous_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.db");
        let store = IssuanceStore::open(&path, "issuer-1").unwrap();
        let lookup = IssuanceLookup::shared_file(&path);

        assert!(lookup.find(&credential()).await.is_none());
        store.issue(&credential()).unwrap();
        assert!(lookup.find(&credential()).await.is_some());
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_not_issued() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.db");
        std::fs::write(&path, b"this is not a sqlite database").unwrap();

        let file = SharedStoreFile::new(&path);
        assert!(file.read_snapshot(&credential().id()).is_err());
        assert!(IssuanceLookup::SharedFile(file).find(&credential()).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_issuance_api_degrades_to_not_issued() {
        let lookup = IssuanceLookup::remote("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(lookup.find(&credential()).await.is_none());
    }

    #[test]
    fn remote_url_accepts_base_or_api_prefix() {
        let a = RemoteIssuance::new("http://issuer:3001", Duration::from_secs(1)).unwrap();
        let b = RemoteIssuance::new("http://issuer:3001/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(a.url, "http://issuer:3001/api/lookup");
        assert_eq!(b.url, "http://issuer:3001/api/lookup");
    }
}
