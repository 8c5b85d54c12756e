//! Request identification.
//!
//! # Responsibilities
//! - Tag each inbound request with a unique id for diagnostic correlation
//!
//! # Design Decisions
//! - The id lives in request extensions only; forwarded headers stay untouched

use uuid::Uuid;

/// Unique identifier of one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
