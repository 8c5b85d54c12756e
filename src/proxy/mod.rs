//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! matched Route + inbound request
//!     → headers.rs (drop hop-by-hop, Host = backend authority)
//!     → dispatcher.rs (URI rewrite, single upstream call under deadlines)
//!     → upload.rs (signals end of the request body; arms the response deadline)
//!     → backend response streamed back, or ProxyError → 502/504
//! ```

pub mod dispatcher;
pub mod headers;
pub mod upload;

pub use dispatcher::{ProxyDispatcher, ProxyError};
