//! SQLite store of issued credentials.
//!
//! One row per credential identifier; rows are never updated or deleted.
//! The file is also opened read-only by the verification service, so it uses
//! a rollback journal (no `-wal`/`-shm` side files for readers to need) and
//! full synchronous commits: once `issue` returns, the row is on disk.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::identity::{CredentialData, CredentialId};

/// A persisted issuance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub id: CredentialId,
    /// Credential data as first submitted (compact JSON).
    pub data: String,
    pub issued_by: String,
    pub issued_at: String,
}

/// Result of an issuance attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A new record was written by this worker.
    Issued(IssuedCredential),
    /// A record already existed; nothing was written.
    AlreadyIssued(IssuedCredential),
}

impl IssueOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, IssueOutcome::Issued(_))
    }

    pub fn already_issued(&self) -> bool {
        matches!(self, IssueOutcome::AlreadyIssued(_))
    }

    pub fn record(&self) -> &IssuedCredential {
        match self {
            IssueOutcome::Issued(c) | IssueOutcome::AlreadyIssued(c) => c,
        }
    }

    /// Worker that issued the credential (the existing issuer on a duplicate).
    pub fn issued_by(&self) -> &str {
        &self.record().issued_by
    }

    pub fn message(&self) -> String {
        match self {
            IssueOutcome::Issued(c) => format!("credential issued by {}", c.issued_by),
            IssueOutcome::AlreadyIssued(_) => "Credential already issued".to_string(),
        }
    }
}

pub struct IssuanceStore {
    db: Mutex<Connection>,
    worker: String,
}

impl IssuanceStore {
    /// Open (or create) the store at `path`, creating its directory if needed.
    pub fn open<P: AsRef<Path>>(path: P, worker: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        crate::ensure_parent_dir(path)?;
        let conn = Connection::open(path)?;
        Self::init(conn, worker.into())
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory(worker: impl Into<String>) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, worker.into())
    }

    fn init(conn: Connection, worker: String) -> Result<Self, StoreError> {
        // journal_mode returns a row, so it goes through query_row rather than execute.
        conn.query_row("PRAGMA journal_mode=DELETE", [], |_| Ok(()))?;
        conn.execute_batch(
            "
            PRAGMA synchronous=FULL;

            CREATE TABLE IF NOT EXISTS credentials (
                id        TEXT PRIMARY KEY,
                data      TEXT NOT NULL,
                issued_by TEXT NOT NULL,
                issued_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            db: Mutex::new(conn),
            worker,
        })
    }

    /// Issue a credential unless one with the same identifier exists.
    ///
    /// The insert and the duplicate read-back happen under one lock with a
    /// primary-key-enforced insert, so concurrent identical requests produce
    /// exactly one row and every loser sees the winner's issuer.
    pub fn issue(&self, data: &CredentialData) -> Result<IssueOutcome, StoreError> {
        let id = data.id();
        let record = IssuedCredential {
            id: id.clone(),
            data: data.to_json(),
            issued_by: self.worker.clone(),
            issued_at: crate::now_timestamp(),
        };

        let db = self.db.lock();
        let inserted = db.execute(
            "INSERT INTO credentials (id, data, issued_by, issued_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO NOTHING",
            params![record.id.as_str(), record.data, record.issued_by, record.issued_at],
        )?;
        if inserted == 1 {
            return Ok(IssueOutcome::Issued(record));
        }

        let existing = db.query_row(SELECT_BY_ID, params![id.as_str()], credential_from_row)?;
        Ok(IssueOutcome::AlreadyIssued(existing))
    }

    /// Find the issuance record for this credential data, if any.
    pub fn lookup(&self, data: &CredentialData) -> Result<Option<IssuedCredential>, StoreError> {
        self.lookup_id(&data.id())
    }

    pub fn lookup_id(&self, id: &CredentialId) -> Result<Option<IssuedCredential>, StoreError> {
        let db = self.db.lock();
        Ok(select_credential(&db, id)?)
    }

    /// Number of issued credentials.
    pub fn count(&self) -> Result<u64, StoreError> {
        let db = self.db.lock();
        let n: i64 = db.query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

const SELECT_BY_ID: &str = "SELECT id, data, issued_by, issued_at FROM credentials WHERE id = ?1";

/// Select one credential row by identifier. Shared with the read-only
/// snapshot reader in `lookup`, which opens this same schema from another process.
pub(crate) fn select_credential(
    conn: &Connection,
    id: &CredentialId,
) -> rusqlite::Result<Option<IssuedCredential>> {
    conn.query_row(SELECT_BY_ID, params![id.as_str()], credential_from_row)
        .optional()
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<IssuedCredential> {
    Ok(IssuedCredential {
        id: CredentialId::from_stored(row.get(0)?),
        data: row.get(1)?,
        issued_by: row.get(2)?,
        issued_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn jane() -> CredentialData {
        CredentialData::from_value(json!({
            "name": "Jane Smith",
            "email": "jane@example.com",
            "course": "Docker"
        }))
        .unwrap()
    }

    #[test]
    fn issue_then_duplicate() {
        let store = IssuanceStore::open_memory("worker-a").unwrap();

        let first = store.issue(&jane()).unwrap();
        assert!(first.accepted());
        assert!(!first.already_issued());
        assert_eq!(first.issued_by(), "worker-a");
        assert_eq!(first.message(), "credential issued by worker-a");
        assert!(first.record().issued_at.ends_with('Z'));

        let second = store.issue(&jane()).unwrap();
        assert!(!second.accepted());
        assert!(second.already_issued());
        assert_eq!(second.issued_by(), "worker-a");
        assert_eq!(second.message(), "Credential already issued");
        assert_eq!(second.record().issued_at, first.record().issued_at);

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_reports_original_issuer_across_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuance.db");

        let a = IssuanceStore::open(&path, "worker-a").unwrap();
        a.issue(&jane()).unwrap();
        drop(a);

        let b = IssuanceStore::open(&path, "worker-b").unwrap();
        let outcome = b.issue(&jane()).unwrap();
        assert!(outcome.already_issued());
        assert_eq!(outcome.issued_by(), "worker-a");
        assert_eq!(b.count().unwrap(), 1);
    }

    #[test]
    fn reordered_fields_are_a_different_credential() {
        let store = IssuanceStore::open_memory("w").unwrap();
        store.issue(&jane()).unwrap();
        let reordered = CredentialData::from_value(json!({
            "course": "Docker",
            "email": "jane@example.com",
            "name": "Jane Smith"
        }))
        .unwrap();
        assert!(store.lookup(&reordered).unwrap().is_none());
        assert!(store.issue(&reordered).unwrap().accepted());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn lookup_is_read_only() {
        let store = IssuanceStore::open_memory("w").unwrap();
        assert!(store.lookup(&jane()).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);

        store.issue(&jane()).unwrap();
        let found = store.lookup(&jane()).unwrap().unwrap();
        assert_eq!(found.id, jane().id());
        assert_eq!(found.data, jane().to_json());
        assert_eq!(found.issued_by, "w");
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("issuance.db");
        let store = IssuanceStore::open(&path, "w").unwrap();
        store.issue(&jane()).unwrap();
        assert!(path.exists());
        // Rollback journal: no WAL side file left for foreign readers.
        assert!(!dir.path().join("nested/data/issuance.db-wal").exists());
    }

    #[test]
    fn concurrent_identical_issues_yield_one_row() {
        let store = Arc::new(IssuanceStore::open_memory("w").unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.issue(&jane()).unwrap().accepted())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|a| *a)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(store.count().unwrap(), 1);
    }
}
