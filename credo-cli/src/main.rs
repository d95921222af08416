//! credo: command-line client for the credential services.
//!
//!   credo issue --name N --email E --course C
//!   credo verify --name N --email E --course C
//!   credo history [--limit N]
//!   credo health
//!
//! Exits 0 when the credential was issued/verified (or both services are
//! healthy) and 1 otherwise.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use credo_sdk::{validate, Client, Credential, Service};

mod config;
mod output;

use config::Config;

#[derive(Parser)]
#[command(name = "credo", version, about = "Issue and verify student credentials")]
struct Cli {
    /// Issuance service base URL
    #[arg(long, env = "CREDO_ISSUANCE_URL", global = true)]
    issuance_url: Option<String>,

    /// Verification service base URL
    #[arg(long, env = "CREDO_VERIFICATION_URL", global = true)]
    verification_url: Option<String>,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a credential
    Issue(CredentialArgs),
    /// Check whether a credential was issued
    Verify(CredentialArgs),
    /// Show recent verification attempts
    History {
        /// Number of entries (service default 10)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Check that both services are up
    Health,
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    course: String,
}

impl CredentialArgs {
    /// Validated credential, or the rendered list of violations.
    fn into_credential(self) -> Result<Credential, String> {
        let credential = Credential::new(self.name, self.email, self.course);
        let errors = validate::validate(&credential);
        if errors.is_empty() {
            Ok(credential)
        } else {
            Err(output::validation_summary(&errors))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let (issuance_url, verification_url) =
        Config::load().resolve(cli.issuance_url.clone(), cli.verification_url.clone());
    tracing::debug!("issuance={issuance_url} verification={verification_url}");
    let client = Client::new(&issuance_url, &verification_url)?;

    let ok = run(cli.command, &client, cli.json).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Execute one command; `Ok(false)` means the service said no.
async fn run(command: Command, client: &Client, json: bool) -> Result<bool> {
    match command {
        Command::Issue(args) => {
            let credential = match args.into_credential() {
                Ok(c) => c,
                Err(summary) => {
                    eprintln!("{summary}");
                    return Ok(false);
                }
            };
            let resp = client.issue(&credential).await?;
            if json {
                output::print_json(&resp)?;
            } else {
                println!("{}", output::issue_summary(&resp));
            }
            Ok(resp.success)
        }
        Command::Verify(args) => {
            let credential = match args.into_credential() {
                Ok(c) => c,
                Err(summary) => {
                    eprintln!("{summary}");
                    return Ok(false);
                }
            };
            let resp = client.verify(&credential).await?;
            if json {
                output::print_json(&resp)?;
            } else {
                println!("{}", output::verify_summary(&resp));
            }
            Ok(resp.valid)
        }
        Command::History { limit } => {
            let resp = client.history(limit).await?;
            if json {
                output::print_json(&resp)?;
            } else if let Some(error) = &resp.error {
                eprintln!("✗ {error}");
            } else {
                println!("{}", output::history_table(&resp.history));
            }
            Ok(resp.success)
        }
        Command::Health => {
            let (issuance, verification) = tokio::join!(
                client.health(Service::Issuance),
                client.health(Service::Verification)
            );
            if json {
                output::print_json(&serde_json::json!({
                    "issuance": issuance,
                    "verification": verification,
                }))?;
            } else {
                for (service, up) in [(Service::Issuance, issuance), (Service::Verification, verification)] {
                    let status = if up { "✓ healthy" } else { "✗ unreachable" };
                    println!("{:<13} {status}", service.name());
                }
            }
            Ok(issuance && verification)
        }
    }
}
