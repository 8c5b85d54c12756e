//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (connect deadline; response deadline armed once the upload ends)
//!     → On failure: synthesized 502/504, exactly one attempt
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No retries, no circuit breaking: one failed call affects one request only

pub mod timeouts;

pub use timeouts::{with_deadline_after, DeadlineExceeded, UpstreamTimeouts};
