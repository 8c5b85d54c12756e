//! Top-level error taxonomy.
//!
//! Only startup and listener failures surface here. Per-request failures are
//! converted to responses at the dispatcher boundary (`ProxyError`).

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required configuration missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Static asset root unreadable.
    #[error("static assets unavailable: {0}")]
    AssetRoot(#[source] std::io::Error),

    /// Access log sink could not be opened.
    #[error("cannot open access log {path}: {source}")]
    AccessLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
