//! # Bounty Governance Node Runtime
//!
//! Hosts the governance service behind its HTTP gateway.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the long-lived handles (store, bus, service)
//! - `seed/` - Program and submission fixtures for the content-management side
//! - `wiring/` - Background tasks fed by the governance event bus
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults → `BG_CONFIG` file → environment)
//! 2. Open the document store (`memory` or `file`)
//! 3. Apply fixtures if `seed.fixtures_path` is set
//! 4. Start the event logger
//! 5. Serve HTTP until Ctrl+C, then drain requests, stop tasks and close the
//!    store

pub mod container;
pub mod seed;
pub mod wiring;

use anyhow::{Context, Result};
use bg_api_gateway::ApiGatewayService;
use bg_governance::GovernanceApi;
use shared_types::{SystemTimeSource, TimeSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{NodeConfig, NodeContainer};
use crate::seed::{apply_fixtures, Fixtures};
use crate::wiring::spawn_event_logger;

/// The node runtime: container, background tasks and gateway.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    gateway: ApiGatewayService,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    event_logger: Option<JoinHandle<u64>>,
}

impl NodeRuntime {
    /// Open the store and build the service and gateway.
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating bounty governance node runtime");

        let gateway_config = config.gateway_config();
        let container =
            Arc::new(NodeContainer::build(config).context("Failed to open document store")?);
        let api: Arc<dyn GovernanceApi> = container.service.clone();
        let gateway = ApiGatewayService::new(gateway_config, api, container.service.metrics())
            .context("Invalid gateway configuration")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            gateway,
            shutdown_tx,
            shutdown_rx,
            event_logger: None,
        })
    }

    /// Seed fixtures and start background tasks.
    pub async fn start(&mut self) -> Result<()> {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Bounty Governance Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            backend = ?config.storage.backend,
            data_path = ?config.storage.data_path,
            http = %self.gateway.config().http_addr(),
            "Configuration loaded"
        );

        if let Some(path) = &config.seed.fixtures_path {
            let fixtures = Fixtures::from_file(path)
                .with_context(|| format!("Failed to load fixtures from {}", path.display()))?;
            apply_fixtures(
                &fixtures,
                self.container.store.as_ref(),
                self.container.service.as_ref(),
                config.governance.default_quorum,
                SystemTimeSource.now(),
            )
            .await
            .context("Failed to apply fixtures")?;
        }

        self.event_logger = Some(spawn_event_logger(
            self.container.event_bus.subscribe(),
            self.shutdown_rx.clone(),
        ));

        info!("Node runtime started");
        Ok(())
    }

    /// Serve HTTP until `signal` resolves.
    pub async fn serve<F>(&self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.gateway
            .start(signal)
            .await
            .context("HTTP gateway failed")
    }

    /// Stop background tasks and close the store.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to all tasks
    /// 2. Wait (bounded) for the event logger
    /// 3. Flush and close the document store
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        if let Some(handle) = self.event_logger.take() {
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(logged)) => info!(logged, "Event logger stopped"),
                Ok(Err(e)) => warn!(error = %e, "Event logger task failed"),
                Err(_) => warn!("Event logger did not stop in time"),
            }
        }

        self.container.close().await;
        info!("Shutdown complete");
    }

    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }

    pub fn gateway(&self) -> &ApiGatewayService {
        &self.gateway
    }
}
