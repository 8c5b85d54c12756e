//! Static front-end bundle with single-page-app fallback.
//!
//! # Responsibilities
//! - Serve files below the asset root (directories get `index.html`)
//! - Serve the index document for any path without a file, with status 200
//! - Report a missing index document as 404
//!
//! # Design Decisions
//! - Only reached after route matching returned no route
//! - `ServeDir` refuses paths that escape the root

use std::io;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::schema::StaticAssetConfig;

/// Serves the pre-built asset bundle.
#[derive(Debug, Clone)]
pub struct StaticAssetServer {
    root: PathBuf,
    service: ServeDir<ServeFile>,
}

impl StaticAssetServer {
    /// Create the server, failing if the root is not a readable directory.
    pub fn new(config: &StaticAssetConfig) -> io::Result<Self> {
        check_root(&config.root)?;

        let index = config.index_path();
        if !index.is_file() {
            tracing::warn!(index = ?index, "Index document missing; unmatched paths will return 404");
        }

        let service = ServeDir::new(&config.root)
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(index));

        Ok(Self {
            root: config.root.clone(),
            service,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `request` from the bundle.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        let response = match self.service.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        response.map(Body::new)
    }
}

fn check_root(root: &Path) -> io::Result<()> {
    std::fs::read_dir(root).map(|_| ()).map_err(|e| {
        io::Error::new(e.kind(), format!("static asset root {}: {e}", root.display()))
    })
}
