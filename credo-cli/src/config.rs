//! Persistent configuration for the credo CLI.
//!
//! Config file lives at `~/.config/credo/cli.toml`:
//!
//! ```toml
//! issuance_url = "http://issuer.internal:3001"
//! verification_url = "http://verifier.internal:3002"
//! ```

use std::path::{Path, PathBuf};

use credo_sdk::client::{DEFAULT_ISSUANCE_URL, DEFAULT_VERIFICATION_URL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Issuance service base URL. Default: http://localhost:3001
    pub issuance_url: Option<String>,
    /// Verification service base URL. Default: http://localhost:3002
    pub verification_url: Option<String>,
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("credo")
        .join("cli.toml")
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Read `path`, falling back to defaults when it is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => return c,
                    Err(e) => eprintln!("Warning: bad config file {}: {e}", path.display()),
                },
                Err(e) => eprintln!("Warning: can't read {}: {e}", path.display()),
            }
        }
        Self::default()
    }

    /// Service URLs after applying command-line/environment overrides.
    pub fn resolve(&self, issuance: Option<String>, verification: Option<String>) -> (String, String) {
        let issuance = issuance
            .or_else(|| self.issuance_url.clone())
            .unwrap_or_else(|| DEFAULT_ISSUANCE_URL.to_string());
        let verification = verification
            .or_else(|| self.verification_url.clone())
            .unwrap_or_else(|| DEFAULT_VERIFICATION_URL.to_string());
        (issuance, verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("cli.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(
            config.resolve(None, None),
            (DEFAULT_ISSUANCE_URL.to_string(), DEFAULT_VERIFICATION_URL.to_string())
        );
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(
            &path,
            "issuance_url = \"http://issuer:3001\"\nverification_url = \"http://verifier:3002\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.issuance_url.as_deref(), Some("http://issuer:3001"));

        let (issuance, verification) = config.resolve(None, Some("http://other:9000".into()));
        assert_eq!(issuance, "http://issuer:3001");
        assert_eq!(verification, "http://other:9000");
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(&path, "issuance_url = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
