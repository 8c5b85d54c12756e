//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum application with a single catch-all handler
//! - Wire up middleware (access log, tracing)
//! - Dispatch each request: route match → proxy, otherwise → static assets
//! - Convert per-request failures into responses; nothing here can stop the listener

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::http::request::RequestId;
use crate::http::static_files::StaticAssetServer;
use crate::observability::access_log::{record_access, AccessLogger};
use crate::observability::metrics;
use crate::proxy::ProxyDispatcher;
use crate::resilience::UpstreamTimeouts;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub dispatcher: ProxyDispatcher,
    pub assets: StaticAssetServer,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble the gateway from validated configuration.
    pub fn new(config: &GatewayConfig, assets: StaticAssetServer, access_log: AccessLogger) -> Self {
        let state = AppState {
            routes: Arc::new(RouteTable::build(&config.backends)),
            dispatcher: ProxyDispatcher::new(UpstreamTimeouts::from_config(config)),
            assets,
        };
        Self::from_state(state, access_log)
    }

    /// Assemble the gateway from already-built components.
    pub fn from_state(state: AppState, access_log: AccessLogger) -> Self {
        let router = Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(access_log, record_access))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// The assembled application, for driving without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Matches the path against the route table, then proxies or serves static assets.
async fn gateway_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = RequestId::new(Uuid::new_v4());
    request.extensions_mut().insert(request_id);

    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let Some(route) = state.routes.match_path(&path) else {
        tracing::debug!(request_id = %request_id, method = %method, path = %path, "Serving static asset");
        let response = state.assets.serve(request).await;
        metrics::record_request(metrics::STATIC_ROUTE, response.status().as_u16(), start_time);
        return response;
    };

    let service = route.service.as_str();
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = service,
        target = %route.target,
        "Proxying request"
    );

    match state.dispatcher.forward(request, &route.target).await {
        Ok(response) => {
            metrics::record_request(service, response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = service,
                kind = e.kind(),
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_failure(service, e.kind());
            metrics::record_request(service, e.status().as_u16(), start_time);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BackendService, StaticAssetConfig};
    use crate::routing::Route;
    use axum::http::StatusCode;
    use tokio::io::AsyncReadExt;
    use tower::ServiceExt;
    use url::Url;

    async fn refused_target() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn matched_paths_proxy_and_the_rest_serve_assets() {
        let root = std::env::temp_dir().join(format!("gateway-server-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.html"), "<html>spa</html>").unwrap();
        let assets = StaticAssetServer::new(&StaticAssetConfig {
            root: root.clone(),
            index: "index.html".into(),
        })
        .unwrap();

        let (sink, mut reader) = tokio::io::duplex(1 << 16);
        let (access_log, writer) = AccessLogger::spawn(sink, 64);

        let state = AppState {
            routes: Arc::new(RouteTable::from_routes(vec![Route::new(
                BackendService::Vote,
                "/votes",
                refused_target().await,
            )])),
            dispatcher: ProxyDispatcher::new(UpstreamTimeouts::default()),
            assets,
        };
        let router = HttpServer::from_state(state, access_log).into_router();

        let request = axum::http::Request::builder().uri("/votes/3").body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        axum::body::to_bytes(response.into_body(), 1024).await.unwrap();

        let request = axum::http::Request::builder().uri("/gallery/7").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"<html>spa</html>");

        writer.await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- - - ["), "{}", lines[0]);
        assert!(lines[0].contains("\"GET /votes/3 HTTP/1.1\" 502 "), "{}", lines[0]);
        assert!(lines[1].contains("\"GET /gallery/7 HTTP/1.1\" 200 16 "), "{}", lines[1]);

        std::fs::remove_dir_all(root).unwrap();
    }
}
