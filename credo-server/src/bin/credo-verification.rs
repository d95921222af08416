use anyhow::Result;
use clap::Parser;
use credo_server::config::VerificationConfig;
use credo_server::service::VerificationService;

#[tokio::main]
async fn main() -> Result<()> {
    credo_server::init_tracing()?;
    let config = VerificationConfig::parse();
    tracing::info!("Starting verification service on {}", config.bind_addr());
    if config.issuance_url.is_none() && !config.shared_db_path.exists() {
        tracing::warn!(
            "Shared issuance database {} does not exist yet; every credential verifies as not found until it does",
            config.shared_db_path.display()
        );
    }
    VerificationService::new(config).run().await
}
