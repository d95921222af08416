//! Service startup: open stores, build routers, bind listeners.
//!
//! Stores are opened once here and handed to the routers as owned state;
//! an unopenable database aborts startup instead of failing the first request.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::issue::IssuanceState;
use crate::api::verify::VerificationState;
use crate::config::{IssuanceConfig, VerificationConfig};
use crate::issuance::IssuanceStore;
use crate::lookup::IssuanceLookup;
use crate::verification::VerificationStore;
use crate::{api, worker};

pub struct IssuanceService {
    config: IssuanceConfig,
}

impl IssuanceService {
    pub fn new(config: IssuanceConfig) -> Self {
        Self { config }
    }

    fn build_router(&self) -> Result<Router> {
        let worker = worker::resolve(self.config.worker_id.as_deref());
        let path = &self.config.db_path;
        tracing::info!("Opening issuance database: {}", path.display());
        let store = IssuanceStore::open(path, worker.clone())
            .with_context(|| format!("Failed to open issuance database {}", path.display()))?;
        tracing::info!("Worker {worker}: {} credentials on record", store.count()?);

        let state = Arc::new(IssuanceState { store });
        Ok(api::with_layers(api::issue::router(state), &self.config.cors_origins))
    }

    /// Run the service until the listener fails.
    pub async fn run(self) -> Result<()> {
        let router = self.build_router()?;
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("Issuance service listening on {addr}");
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the service in the background and return the bound address (for testing).
    pub async fn start(self) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let router = self.build_router()?;
        serve_background(&self.config.bind_addr(), router).await
    }
}

pub struct VerificationService {
    config: VerificationConfig,
}

impl VerificationService {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    fn build_lookup(&self) -> Result<IssuanceLookup> {
        match &self.config.issuance_url {
            Some(url) => IssuanceLookup::remote(url, self.config.lookup_timeout())
                .context("Failed to build issuance lookup client"),
            None => Ok(IssuanceLookup::shared_file(&self.config.shared_db_path)),
        }
    }

    fn build_router(&self) -> Result<Router> {
        let worker = worker::resolve(self.config.worker_id.as_deref());
        let path = &self.config.db_path;
        tracing::info!("Opening verification database: {}", path.display());
        let store = VerificationStore::open(path, worker.clone())
            .with_context(|| format!("Failed to open verification database {}", path.display()))?;

        let lookup = self.build_lookup()?;
        tracing::info!("Worker {worker}: credential lookups via {}", lookup.describe());

        let state = Arc::new(VerificationState { store, lookup });
        Ok(api::with_layers(api::verify::router(state), &self.config.cors_origins))
    }

    /// Run the service until the listener fails.
    pub async fn run(self) -> Result<()> {
        let router = self.build_router()?;
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("Verification service listening on {addr}");
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the service in the background and return the bound address (for testing).
    pub async fn start(self) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let router = self.build_router()?;
        serve_background(&self.config.bind_addr(), router).await
    }
}

async fn serve_background(addr: &str, router: Router) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("Listening on {local}");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await?;
        Ok(())
    });
    Ok((local, handle))
}
