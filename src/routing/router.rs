//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the fixed, ordered route entries
//! - Look up the first entry whose prefix matches a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan in declaration order; first match wins
//! - Deliberately not longest-prefix: overlapping prefixes resolve by order
//! - Explicit NoMatch (`None`) hands the request to static assets

use url::Url;

use crate::config::{BackendService, BackendTargets};
use crate::routing::matcher::PathPrefixMatcher;

/// A compiled route entry.
#[derive(Debug, Clone)]
pub struct Route {
    /// Service the route forwards to.
    pub service: BackendService,
    /// Path matcher.
    pub matcher: PathPrefixMatcher,
    /// Backend base URL.
    pub target: Url,
}

impl Route {
    pub fn new(service: BackendService, prefix: impl Into<String>, target: Url) -> Self {
        Self {
            service,
            matcher: PathPrefixMatcher::new(prefix),
            target,
        }
    }
}

/// Immutable, ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the fixed table: photo, authentication, profile, vote, comment.
    ///
    /// `BackendTargets` only exists once every required URL validated, so a
    /// table can never be built with an unset target.
    pub fn build(targets: &BackendTargets) -> Self {
        let routes = BackendService::ALL
            .iter()
            .map(|&service| Route::new(service, service.path_prefix(), targets.get(service).clone()))
            .collect();
        Self::from_routes(routes)
    }

    /// Create a table from routes in declaration order.
    pub fn from_routes(routes: Vec<Route>) -> Self {
        for route in &routes {
            tracing::debug!(
                service = %route.service,
                prefix = route.matcher.prefix(),
                target = %route.target,
                "Route registered"
            );
        }
        Self { routes }
    }

    /// Find the first route whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
