//! Credential identity: serialized form and SHA-256 identifier.
//!
//! Both services derive the lookup key with [`CredentialData::id`], so a
//! credential issued by one is found by the other. The identifier hashes the
//! compact JSON exactly as received: no key sorting, trimming or case folding.
//! The same fields sent in a different order are a different credential.

use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Non-empty JSON object describing a credential (in practice name, email,
/// course). Field order is preserved as received.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialData(Map<String, Value>);

/// Deterministic identifier of a credential: hex SHA-256 of its compact JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialId(String);

/// Why a request body cannot be used as credential data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCredential {
    #[error("body is not valid JSON")]
    Malformed,
    #[error("credential data must be a JSON object")]
    NotAnObject,
    #[error("credential data has no fields")]
    Empty,
}

impl CredentialData {
    pub fn from_value(value: Value) -> Result<Self, InvalidCredential> {
        match value {
            Value::Object(map) if map.is_empty() => Err(InvalidCredential::Empty),
            Value::Object(map) => Ok(Self(map)),
            _ => Err(InvalidCredential::NotAnObject),
        }
    }

    /// Parse a raw request body. An empty body is treated like `{}`.
    pub fn from_slice(body: &[u8]) -> Result<Self, InvalidCredential> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(InvalidCredential::Empty);
        }
        let value: Value = serde_json::from_slice(body).map_err(|_| InvalidCredential::Malformed)?;
        Self::from_value(value)
    }

    pub fn id(&self) -> CredentialId {
        CredentialId(sha256_hex(self.to_json().as_bytes()))
    }

    /// Compact JSON in received field order, as stored in the `data` columns.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl CredentialId {
    /// Wrap an identifier read back from storage.
    pub fn from_stored(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
