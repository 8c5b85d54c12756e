//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → access_log.rs (one combined-format line, written after completion)
//!     → metrics.rs (counters, histograms)
//!     → logging.rs (structured diagnostic events on stderr)
//! ```
//!
//! # Design Decisions
//! - The access log is durable and serialized through a single writer
//! - Diagnostic logging is separate and never blocks request handling

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use access_log::{AccessLogger, AccessRecord, PendingRecord};
