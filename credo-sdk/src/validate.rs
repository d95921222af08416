//! Field rules for student credentials.
//!
//! Clients run these before submitting; the services themselves only require a
//! non-empty object. Values are checked trimmed but submitted as entered.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Credential;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("static regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("static regex"));
static EMAIL_TLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(com|org|edu|net|gov|mil|info|biz|io|in|uk|us|ca|au|de|fr|jp|cn)$")
        .expect("static regex")
});

const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Course,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Course => "course",
        })
    }
}

/// A rule violation on one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Check every field, returning all violations (empty when valid).
pub fn validate(credential: &Credential) -> Vec<FieldError> {
    [
        validate_name(&credential.name),
        validate_email(&credential.email),
        validate_course(&credential.course),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}

pub fn validate_name(name: &str) -> Result<(), FieldError> {
    let name = name.trim();
    let len = name.chars().count();
    let msg = if name.is_empty() {
        "Student name is required"
    } else if len < 2 {
        "Name must be at least 2 characters"
    } else if len > 100 {
        "Name must not exceed 100 characters"
    } else if !NAME_RE.is_match(name) {
        "Name can only contain letters, spaces, hyphens, and apostrophes"
    } else {
        return Ok(());
    };
    Err(FieldError::new(Field::Name, msg))
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let email = email.trim();
    let msg = if email.is_empty() {
        "Email address is required"
    } else if !EMAIL_RE.is_match(email) {
        "Please enter a valid email address"
    } else if !EMAIL_TLD_RE.is_match(email) {
        "Email must end with a valid domain (e.g., .com, .org, .edu, .net)"
    } else if email.chars().count() > MAX_EMAIL_LEN {
        "Email address is too long"
    } else {
        return Ok(());
    };
    Err(FieldError::new(Field::Email, msg))
}

pub fn validate_course(course: &str) -> Result<(), FieldError> {
    let course = course.trim();
    let len = course.chars().count();
    let msg = if course.is_empty() {
        "Course name is required"
    } else if len < 3 {
        "Course name must be at least 3 characters"
    } else if len > 100 {
        "Course name must not exceed 100 characters"
    } else {
        return Ok(());
    };
    Err(FieldError::new(Field::Course, msg))
}
