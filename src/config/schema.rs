//! Configuration schema definitions.
//!
//! `GatewaySettings` is the optional TOML tuning file; every field has a default.
//! `GatewayConfig` is the validated result combining those settings with the
//! required environment values (port and backend targets).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Tunables read from the optional TOML file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewaySettings {
    /// Listener settings (the port itself comes from `PORT`).
    pub listener: ListenerSettings,

    /// Upstream deadlines.
    pub timeouts: TimeoutConfig,

    /// Static asset bundle.
    pub static_assets: StaticAssetConfig,

    /// Access log sink.
    pub access_log: AccessLogConfig,

    /// Diagnostic logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Interface to bind.
    pub host: IpAddr,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

/// Timeouts applied to every upstream call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until upstream response headers arrive, in seconds.
    pub response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 30,
        }
    }
}

/// Static asset bundle location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticAssetConfig {
    /// Directory holding the built front-end.
    pub root: PathBuf,

    /// Document served for unmatched paths, relative to `root`.
    pub index: String,
}

impl Default for StaticAssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("webapp"),
            index: "index.html".to_string(),
        }
    }
}

impl StaticAssetConfig {
    /// Full path of the fallback document.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }
}

/// Access log sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// File the combined-format lines are appended to.
    pub path: PathBuf,

    /// Lines buffered for the writer; further lines are dropped with a warning.
    pub queue_capacity: usize,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("access.log"),
            queue_capacity: 8192,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus exporter bind address; no exporter when unset.
    pub metrics_address: Option<SocketAddr>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

/// The backend microservices the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendService {
    Photo,
    Authentication,
    Profile,
    Vote,
    Comment,
}

impl BackendService {
    /// All services in routing priority order.
    pub const ALL: [BackendService; 5] = [
        BackendService::Photo,
        BackendService::Authentication,
        BackendService::Profile,
        BackendService::Vote,
        BackendService::Comment,
    ];

    /// Environment variable holding this service's base URL.
    pub fn env_var(self) -> &'static str {
        match self {
            BackendService::Photo => "PHOTO_URL",
            BackendService::Authentication => "AUTHENTICATION_URL",
            BackendService::Profile => "PROFILE_URL",
            BackendService::Vote => "VOTE_URL",
            BackendService::Comment => "COMMENT_URL",
        }
    }

    /// Path prefix routed to this service.
    pub fn path_prefix(self) -> &'static str {
        match self {
            BackendService::Photo => "/image",
            BackendService::Authentication => "/token-auth",
            BackendService::Profile => "/users",
            BackendService::Vote => "/votes",
            BackendService::Comment => "/comments",
        }
    }

    /// Short name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendService::Photo => "photo",
            BackendService::Authentication => "authentication",
            BackendService::Profile => "profile",
            BackendService::Vote => "vote",
            BackendService::Comment => "comment",
        }
    }
}

impl std::fmt::Display for BackendService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated base URLs of every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTargets {
    pub photo: Url,
    pub authentication: Url,
    pub profile: Url,
    pub vote: Url,
    pub comment: Url,
}

impl BackendTargets {
    /// Base URL for a service.
    pub fn get(&self, service: BackendService) -> &Url {
        match service {
            BackendService::Photo => &self.photo,
            BackendService::Authentication => &self.authentication,
            BackendService::Profile => &self.profile,
            BackendService::Vote => &self.vote,
            BackendService::Comment => &self.comment,
        }
    }
}

/// Root configuration, immutable once loaded.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen port from `PORT`.
    pub port: u16,

    /// Backend base URLs.
    pub backends: BackendTargets,

    /// Everything tunable from the TOML file.
    pub settings: GatewaySettings,
}

impl GatewayConfig {
    /// Address the listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.settings.listener.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeouts.connect_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeouts.response_secs)
    }
}
