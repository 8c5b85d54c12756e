//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last, so a bad config never accepts a connection

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{load_config, Environment, GatewayConfig, GatewaySettings};
use crate::error::GatewayError;
use crate::http::{HttpServer, StaticAssetServer};
use crate::observability::{metrics, AccessLogger};

const ACCESS_LOG_DRAIN: Duration = Duration::from_secs(5);

/// A fully initialized gateway, listening but not yet serving.
pub struct Gateway {
    config: GatewayConfig,
    server: HttpServer,
    listener: TcpListener,
    access_log_writer: JoinHandle<()>,
}

impl Gateway {
    /// Validate configuration and bring up every subsystem, binding last.
    pub async fn start(env: &Environment, settings: GatewaySettings) -> Result<Self, GatewayError> {
        let config = load_config(env, settings)?;

        tracing::info!(
            port = config.port,
            static_root = ?config.settings.static_assets.root,
            access_log = ?config.settings.access_log.path,
            connect_timeout_secs = config.settings.timeouts.connect_secs,
            response_timeout_secs = config.settings.timeouts.response_secs,
            "Configuration loaded"
        );

        let assets = StaticAssetServer::new(&config.settings.static_assets).map_err(GatewayError::AssetRoot)?;
        tracing::info!(root = ?assets.root(), "Static assets ready");

        let log_path: PathBuf = config.settings.access_log.path.clone();
        let (access_log, access_log_writer) = AccessLogger::open(&log_path, config.settings.access_log.queue_capacity)
            .await
            .map_err(|source| GatewayError::AccessLog { path: log_path, source })?;

        if let Some(addr) = config.settings.observability.metrics_address {
            metrics::init_metrics(addr);
        }

        let server = HttpServer::new(&config, assets, access_log);

        let addr = config.bind_address();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;

        tracing::info!(address = ?listener.local_addr().ok(), "Listening for connections");

        Ok(Self {
            config,
            server,
            listener,
            access_log_writer,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires, then drain the access log.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), GatewayError> {
        let result = self.server.run(self.listener, shutdown).await;

        // The server owned the last AccessLogger clones; the writer drains and exits.
        match tokio::time::timeout(ACCESS_LOG_DRAIN, self.access_log_writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Access log writer ended abnormally"),
            Err(_) => tracing::warn!("Access log writer did not drain in time"),
        }

        result.map_err(GatewayError::Serve)
    }
}
