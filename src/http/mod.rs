//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, access log + trace layers)
//!     → [routing layer decides backend]
//!         match    → proxy dispatcher → backend response / response.rs failure
//!         no match → static_files.rs (file or index document)
//!     → Send to client, access log line committed
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::RequestId;
pub use server::{AppState, HttpServer};
pub use static_files::StaticAssetServer;
