//! Human-readable summaries of service responses.

use credo_sdk::validate::FieldError;
use credo_sdk::{IssueResponse, VerificationRecord, VerifyResponse};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn issue_summary(resp: &IssueResponse) -> String {
    if let Some(error) = &resp.error {
        return format!("✗ {error}");
    }
    let mut out = String::new();
    let mark = if resp.success { '✓' } else { '✗' };
    out.push_str(&format!("{mark} {}", resp.message.as_deref().unwrap_or("")));
    if let Some(worker) = &resp.issued_by {
        out.push_str(&format!("\n  Issued by: {worker}"));
    }
    if let Some(ts) = &resp.timestamp {
        out.push_str(&format!("\n  Issued at: {ts}"));
    }
    out
}

pub fn verify_summary(resp: &VerifyResponse) -> String {
    if let Some(error) = &resp.error {
        return format!("✗ {error}");
    }
    let mark = if resp.valid { '✓' } else { '✗' };
    let mut out = format!("{mark} {}", resp.message.as_deref().unwrap_or(""));
    let lines = [
        ("Issued by", &resp.issued_by),
        ("Issued at", &resp.issued_at),
        ("Verified by", &resp.verified_by),
        ("Verified at", &resp.verified_at),
    ];
    for (label, value) in lines {
        if let Some(value) = value {
            out.push_str(&format!("\n  {label}: {value}"));
        }
    }
    out
}

pub fn validation_summary(errors: &[FieldError]) -> String {
    let mut out = String::from("✗ Invalid credential:");
    for e in errors {
        out.push_str(&format!("\n  {e}"));
    }
    out
}

/// Fixed-width table of verification attempts, in the order given.
pub fn history_table(records: &[VerificationRecord]) -> String {
    if records.is_empty() {
        return "No verifications yet".to_string();
    }
    let mut out = format!(
        "{:>5}  {:<24}  {:<7}  {:<16}  {:<16}  CREDENTIAL",
        "ID", "VERIFIED AT", "RESULT", "VERIFIED BY", "ISSUED BY"
    );
    for r in records {
        let result = if r.valid() { "valid" } else { "invalid" };
        out.push_str(&format!(
            "\n{:>5}  {:<24}  {:<7}  {:<16}  {:<16}  {}",
            r.id,
            r.verified_at,
            result,
            r.verified_by,
            r.issued_by.as_deref().unwrap_or("-"),
            r.credential_data
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use credo_sdk::validate::validate;
    use credo_sdk::Credential;

    fn record(id: i64, valid: bool) -> VerificationRecord {
        VerificationRecord {
            id,
            credential_data: r#"{"name":"Jane"}"#.to_string(),
            verified_by: "verifier-1".to_string(),
            verified_at: "2024-01-01T00:00:00.000Z".to_string(),
            is_valid: valid as i64,
            issued_by: valid.then(|| "issuer-1".to_string()),
            issued_at: None,
        }
    }

    #[test]
    fn conflict_summary_names_original_issuer() {
        let resp = IssueResponse {
            success: false,
            message: Some("Credential already issued".into()),
            issued_by: Some("issuer-1".into()),
            ..Default::default()
        };
        assert_eq!(issue_summary(&resp), "✗ Credential already issued\n  Issued by: issuer-1");
    }

    #[test]
    fn error_body_wins_over_message() {
        let resp = VerifyResponse {
            error: Some("Credential data is required".into()),
            ..Default::default()
        };
        assert_eq!(verify_summary(&resp), "✗ Credential data is required");
    }

    #[test]
    fn verify_summary_lists_present_fields_only() {
        let resp = VerifyResponse {
            success: false,
            valid: false,
            message: Some("Credential not found or invalid".into()),
            verified_by: Some("verifier-1".into()),
            ..Default::default()
        };
        assert_eq!(
            verify_summary(&resp),
            "✗ Credential not found or invalid\n  Verified by: verifier-1"
        );
    }

    #[test]
    fn history_table_has_row_per_record() {
        let table = history_table(&[record(2, true), record(1, false)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("VERIFIED AT"));
        assert!(lines[1].contains("valid") && lines[1].contains("issuer-1"));
        assert!(lines[2].contains("invalid"));
        assert_eq!(history_table(&[]), "No verifications yet");
    }

    #[test]
    fn validation_summary_lists_every_field() {
        let errors = validate(&Credential::new("J", "bad", "ab"));
        let summary = validation_summary(&errors);
        assert_eq!(summary.lines().count(), 4);
        assert!(summary.contains("name: "));
        assert!(summary.contains("email: "));
        assert!(summary.contains("course: "));
    }
}
