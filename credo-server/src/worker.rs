//! Worker identity used to attribute issued and verified records.

/// Fallback when the hostname cannot be read.
pub const UNKNOWN_WORKER: &str = "unknown-worker";

/// Resolve this process's worker identity: an explicit override wins,
/// otherwise the machine hostname.
pub fn resolve(override_id: Option<&str>) -> String {
    if let Some(id) = override_id.map(str::trim).filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    match whoami::fallible::hostname() {
        Ok(host) if !host.is_empty() => host,
        Ok(_) => UNKNOWN_WORKER.to_string(),
        Err(e) => {
            tracing::warn!("Cannot read hostname, using {UNKNOWN_WORKER}: {e}");
            UNKNOWN_WORKER.to_string()
        }
    }
}
