//! Timeout enforcement.
//!
//! # Responsibilities
//! - Carry the connect and response deadlines for backend calls
//! - Wrap backend calls with a deadline that starts once the request is sent
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The response clock never runs while a client is still uploading
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::config::GatewayConfig;

/// Deadlines applied to every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// TCP connect deadline.
    pub connect: Duration,
    /// Deadline from the end of the upload until response headers arrive.
    pub response: Duration,
}

impl UpstreamTimeouts {
    pub fn new(connect: Duration, response: Duration) -> Self {
        Self { connect, response }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.connect_timeout(), config.response_timeout())
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(30))
    }
}

/// Returned when a deadline elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut`, failing if it is still pending `deadline` after `armed` resolves.
///
/// `fut` is dropped (cancelled) when the deadline elapses. Until `armed`
/// resolves no clock runs at all.
pub async fn with_deadline_after<A, F>(
    armed: A,
    deadline: Duration,
    fut: F,
) -> Result<F::Output, DeadlineExceeded>
where
    A: Future<Output = ()>,
    F: Future,
{
    let expiry = async {
        armed.await;
        tokio::time::sleep(deadline).await;
    };

    tokio::select! {
        biased;
        output = fut => Ok(output),
        () = expiry => Err(DeadlineExceeded(deadline)),
    }
}
