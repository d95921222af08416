//! Service configuration from command-line flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_ISSUANCE_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_VERIFICATION_ADDR: &str = "0.0.0.0:3002";
pub const DEFAULT_ISSUANCE_DB: &str = "./data/issuance.db";
pub const DEFAULT_VERIFICATION_DB: &str = "./data/verification.db";
/// Where the issuance database sits relative to the verification service's
/// working directory when both run from sibling directories on one host.
pub const DEFAULT_SHARED_DB: &str = "../issuance-service/data/issuance.db";

/// Issuance service configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "credo-issuance", version, about = "Credential issuance service")]
pub struct IssuanceConfig {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_ISSUANCE_ADDR)]
    pub listen_addr: String,

    /// Replace the port of --listen-addr.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// SQLite file holding issued credentials (directory is created if missing).
    #[arg(long, env = "ISSUANCE_DB_PATH", default_value = DEFAULT_ISSUANCE_DB)]
    pub db_path: PathBuf,

    /// Worker identity recorded on issued credentials. Defaults to the hostname.
    #[arg(long, env = "WORKER_ID")]
    pub worker_id: Option<String>,

    /// Allowed CORS origin (repeatable). Any origin is allowed when none is given.
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_ISSUANCE_ADDR.to_string(),
            port: None,
            db_path: PathBuf::from(DEFAULT_ISSUANCE_DB),
            worker_id: None,
            cors_origins: Vec::new(),
        }
    }
}

impl IssuanceConfig {
    pub fn bind_addr(&self) -> String {
        bind_addr(&self.listen_addr, self.port)
    }
}

/// Verification service configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "credo-verification", version, about = "Credential verification service")]
pub struct VerificationConfig {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_VERIFICATION_ADDR)]
    pub listen_addr: String,

    /// Replace the port of --listen-addr.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// SQLite file holding the verification log (directory is created if missing).
    #[arg(long, env = "VERIFICATION_DB_PATH", default_value = DEFAULT_VERIFICATION_DB)]
    pub db_path: PathBuf,

    /// Issuance database file to read for lookups (a shared volume in clustered
    /// deployments). Ignored when --issuance-url is set.
    #[arg(long, env = "SHARED_DB_PATH", default_value = DEFAULT_SHARED_DB)]
    pub shared_db_path: PathBuf,

    /// Look credentials up through the issuance service's HTTP API instead of
    /// reading its database file.
    #[arg(long, env = "ISSUANCE_URL")]
    pub issuance_url: Option<String>,

    /// Timeout for HTTP lookups, in seconds.
    #[arg(long, env = "LOOKUP_TIMEOUT_SECS", default_value_t = 5)]
    pub lookup_timeout_secs: u64,

    /// Worker identity recorded on verifications. Defaults to the hostname.
    #[arg(long, env = "WORKER_ID")]
    pub worker_id: Option<String>,

    /// Allowed CORS origin (repeatable). Any origin is allowed when none is given.
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_VERIFICATION_ADDR.to_string(),
            port: None,
            db_path: PathBuf::from(DEFAULT_VERIFICATION_DB),
            shared_db_path: PathBuf::from(DEFAULT_SHARED_DB),
            issuance_url: None,
            lookup_timeout_secs: 5,
            worker_id: None,
            cors_origins: Vec::new(),
        }
    }
}

impl VerificationConfig {
    pub fn bind_addr(&self) -> String {
        bind_addr(&self.listen_addr, self.port)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs.max(1))
    }
}

fn bind_addr(listen_addr: &str, port: Option<u16>) -> String {
    match (port, listen_addr.rsplit_once(':')) {
        (Some(port), Some((host, _))) => format!("{host}:{port}"),
        (Some(port), None) => format!("{listen_addr}:{port}"),
        (None, _) => listen_addr.to_string(),
    }
}
