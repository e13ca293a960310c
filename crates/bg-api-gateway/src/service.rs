//! API Gateway service: binds the listener and serves until shutdown.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::GatewayMetrics;
use crate::router::{build_router, AppState};
use axum::Router;
use bg_governance::{GovernanceApi, GovernanceMetrics};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// HTTP front end of the governance service.
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new gateway over a governance API.
    pub fn new(
        config: GatewayConfig,
        api: Arc<dyn GovernanceApi>,
        governance_metrics: Arc<GovernanceMetrics>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            state: AppState {
                api,
                governance_metrics,
                metrics: Arc::new(GatewayMetrics::new()),
            },
        })
    }

    /// Router with every route and layer, for serving or in-process tests.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))
    }

    /// Serve on `listener` until `shutdown` resolves; in-flight requests
    /// are drained before returning.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?local, "API Gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("API Gateway stopped");
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
