//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment + .env file (fills unset keys only)
//!     → env.rs (Environment snapshot)
//! optional gateway.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (every missing/invalid value reported)
//!     → GatewayConfig (validated, immutable)
//!     → passed explicitly to routing, proxy, static assets, access log
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Port and backend URLs are required, everything else has defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::Environment;
pub use loader::{load_config, load_environment, load_settings, ConfigError};
pub use schema::{BackendService, BackendTargets, GatewayConfig, GatewaySettings};
