//! Append-only SQLite log of verification attempts.
//!
//! Every call to `record_verification` adds a row, whatever the outcome.
//! Rows are never updated or deleted.

use std::path::Path;

use credo_sdk::{VerificationRecord, VerifyResponse};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::identity::CredentialData;

/// Default number of rows returned by `history`.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

pub const VALID_MESSAGE: &str = "Credential is valid";
pub const INVALID_MESSAGE: &str = "Credential not found or invalid";

/// Outcome of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    pub message: String,
    pub issued_by: Option<String>,
    pub issued_at: Option<String>,
    pub verified_by: String,
    pub verified_at: String,
}

impl From<VerificationResult> for VerifyResponse {
    fn from(r: VerificationResult) -> Self {
        VerifyResponse {
            success: r.valid,
            valid: r.valid,
            message: Some(r.message),
            issued_by: r.issued_by,
            issued_at: r.issued_at,
            verified_by: Some(r.verified_by),
            verified_at: Some(r.verified_at),
            error: None,
        }
    }
}

pub struct VerificationStore {
    db: Mutex<Connection>,
    worker: String,
}

impl VerificationStore {
    /// Open (or create) the log at `path`, creating its directory if needed.
    pub fn open<P: AsRef<Path>>(path: P, worker: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        crate::ensure_parent_dir(path)?;
        let conn = Connection::open(path)?;
        Self::init(conn, worker.into())
    }

    /// Open an in-memory log (for testing).
    pub fn open_memory(worker: impl Into<String>) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, worker.into())
    }

    fn init(conn: Connection, worker: String) -> Result<Self, StoreError> {
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.execute_batch(
            "
            PRAGMA synchronous=FULL;

            CREATE TABLE IF NOT EXISTS verifications (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                credential_data TEXT NOT NULL,
                verified_by     TEXT NOT NULL,
                verified_at     TEXT NOT NULL,
                is_valid        INTEGER NOT NULL,
                issued_by       TEXT,
                issued_at       TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_verifications_verified_at
                ON verifications(verified_at DESC);
            ",
        )?;
        Ok(Self {
            db: Mutex::new(conn),
            worker,
        })
    }

    /// Append a verification attempt and return what the client is told.
    ///
    /// `issued_by`/`issued_at` come from the matched issuance record and are
    /// stored as NULL when the credential was not found.
    pub fn record_verification(
        &self,
        data: &CredentialData,
        is_valid: bool,
        issued_by: Option<&str>,
        issued_at: Option<&str>,
    ) -> Result<VerificationResult, StoreError> {
        let verified_at = crate::now_timestamp();
        {
            let db = self.db.lock();
            db.execute(
                "INSERT INTO verifications (credential_data, verified_by, verified_at, is_valid, issued_by, issued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    data.to_json(),
                    self.worker,
                    verified_at,
                    is_valid as i32,
                    issued_by,
                    issued_at,
                ],
            )?;
        }

        Ok(VerificationResult {
            valid: is_valid,
            message: if is_valid { VALID_MESSAGE } else { INVALID_MESSAGE }.to_string(),
            issued_by: issued_by.map(str::to_string),
            issued_at: issued_at.map(str::to_string),
            verified_by: self.worker.clone(),
            verified_at,
        })
    }

    /// Most recent attempts first, at most `limit` rows.
    pub fn history(&self, limit: u32) -> Result<Vec<VerificationRecord>, StoreError> {
        let db = self.db.lock();
        let mut stmt = db.prepare(
            "SELECT id, credential_data, verified_by, verified_at, is_valid, issued_by, issued_at
             FROM verifications
             ORDER BY verified_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(VerificationRecord {
                id: row.get(0)?,
                credential_data: row.get(1)?,
                verified_by: row.get(2)?,
                verified_at: row.get(3)?,
                is_valid: row.get(4)?,
                issued_by: row.get(5)?,
                issued_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total number of logged attempts.
    pub fn count(&self) -> Result<u64, StoreError> {
        let db = self.db.lock();
        let n: i64 = db.query_row("SELECT COUNT(*) FROM verifications", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
