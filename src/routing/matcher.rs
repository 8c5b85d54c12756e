//! Route matching logic.
//!
//! # Responsibilities
//! - Match the raw request path against a literal prefix
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No normalization: `/image/../users` is matched as written
//! - Not segment-aware: `/imageFoo` matches prefix `/image`
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
