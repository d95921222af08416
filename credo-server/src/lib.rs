//! Credential issuance and verification services.
//!
//! - `identity`: credential identifier shared by both services
//! - `issuance`: SQLite store of issued credentials (one row per identifier)
//! - `verification`: append-only SQLite log of verification attempts
//! - `lookup`: verification-side read of the issuance service's state
//! - `api`: axum routers for both services
//! - `config`: command-line / environment configuration
//! - `service`: startup wiring and listeners

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod issuance;
pub mod lookup;
pub mod service;
pub mod verification;
pub mod worker;

pub use error::{ApiError, StoreError};
pub use identity::{CredentialData, CredentialId};
pub use issuance::{IssuanceStore, IssueOutcome, IssuedCredential};
pub use lookup::IssuanceLookup;
pub use verification::{VerificationResult, VerificationStore};

/// Current UTC time as ISO-8601 with millisecond precision (`...T12:00:00.000Z`).
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Create the parent directory of a database path if it does not exist.
pub(crate) fn ensure_parent_dir(path: &std::path::Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Install the global tracing subscriber for the service binaries.
///
/// JSON logs when `CREDO_LOG_JSON=1`, human-readable otherwise. `RUST_LOG`
/// adds to the default `credo_server=info` directive.
pub fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let json_logs = std::env::var("CREDO_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env().add_directive("credo_server=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
