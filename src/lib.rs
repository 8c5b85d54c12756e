//! Photo Gateway Library
//!
//! Path-prefix gateway in front of the photo, authentication, profile, vote
//! and comment services, serving the front-end bundle for everything else.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
