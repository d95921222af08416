use anyhow::Result;
use clap::Parser;
use credo_server::config::IssuanceConfig;
use credo_server::service::IssuanceService;

#[tokio::main]
async fn main() -> Result<()> {
    credo_server::init_tracing()?;
    let config = IssuanceConfig::parse();
    tracing::info!("Starting issuance service on {}", config.bind_addr());
    IssuanceService::new(config).run().await
}
