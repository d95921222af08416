//! Client SDK for the credo credential services.
//!
//! - `types`: JSON bodies exchanged with the issuance and verification services
//! - `client`: async HTTP client for both services
//! - `validate`: field rules for student credentials, applied before submission

pub mod client;
pub mod types;
pub mod validate;

pub use client::{Client, ClientError, Service};
pub use types::{
    Credential, ErrorResponse, HealthResponse, HistoryResponse, IssueResponse, LookupResponse,
    VerificationRecord, VerifyResponse,
};
