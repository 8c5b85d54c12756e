//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path (raw, un-normalized)
//!     → router.rs (ordered scan)
//!     → matcher.rs (literal starts-with)
//!     → Return: matched Route or NoMatch (static assets)
//!
//! Route Compilation (at startup):
//!     BackendTargets
//!     → fixed order: /image, /token-auth, /users, /votes, /comments
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order, not longest prefix)

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{Route, RouteTable};
