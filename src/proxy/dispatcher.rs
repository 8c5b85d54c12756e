//! Request forwarding to backend services.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the backend base URL (path kept whole)
//! - Stream the request body upstream without buffering (multipart uploads)
//! - Stream the backend response back unmodified apart from hop-by-hop headers
//! - Turn connect failures and deadlines into `ProxyError`
//!
//! # Design Decisions
//! - Exactly one attempt per request; no retries
//! - Upstream requests are always HTTP/1.1
//! - The response deadline starts once the request body is fully sent and
//!   ends when response headers arrive; slow uploads and long downloads are not cut

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode, Uri, Version};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::http::response::gateway_failure;
use crate::proxy::headers::{host_header_for, strip_hop_by_hop};
use crate::proxy::upload::UploadBody;
use crate::resilience::{with_deadline_after, UpstreamTimeouts};

/// Per-request forwarding failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, reset, DNS failure, or a broken response.
    #[error("upstream {target} unreachable: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// Connect or response deadline exceeded.
    #[error("upstream {target} timed out after {elapsed:?}")]
    Timeout { target: String, elapsed: Duration },

    /// The rewritten URI could not be built.
    #[error("invalid upstream uri {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

impl ProxyError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Unreachable { .. } => "unreachable",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::InvalidUri { .. } => "invalid_uri",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Unreachable { .. } | ProxyError::InvalidUri { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            ProxyError::Timeout { .. } => "Upstream service timed out",
            _ => "Upstream service unavailable",
        };
        gateway_failure(self.status(), message)
    }
}

/// Forwards matched requests to their backend.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Client<HttpConnector, Body>,
    timeouts: UpstreamTimeouts,
}

impl ProxyDispatcher {
    pub fn new(timeouts: UpstreamTimeouts) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { client, timeouts }
    }

    /// Forward `request` to `target` and return the backend's response.
    ///
    /// Dropping the returned future (client went away) drops the upstream
    /// request and its connection.
    pub async fn forward(&self, request: Request<Body>, target: &Url) -> Result<Response<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream_uri(target, &parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        match host_header_for(target) {
            Some(host) => {
                parts.headers.insert(header::HOST, host);
            }
            None => {
                parts.headers.remove(header::HOST);
            }
        }

        let (body, uploaded) = UploadBody::wrap(body);
        let upstream = Request::from_parts(parts, Body::new(body));

        let call = self.client.request(upstream);
        let outcome = with_deadline_after(uploaded.wait(), self.timeouts.response, call).await;
        let response: Response<Incoming> = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(if is_timeout(&source) {
                    ProxyError::Timeout {
                        target: target.to_string(),
                        elapsed: self.timeouts.connect,
                    }
                } else {
                    ProxyError::Unreachable {
                        target: target.to_string(),
                        source,
                    }
                });
            }
            Err(exceeded) => {
                return Err(ProxyError::Timeout {
                    target: target.to_string(),
                    elapsed: exceeded.0,
                });
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Backend scheme + authority + base path, followed by the original path and query.
pub fn upstream_uri(target: &Url, original: &Uri) -> Result<Uri, ProxyError> {
    let base_path = target.path().trim_end_matches('/');
    let path_and_query = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let authority = match target.port() {
        Some(port) => format!("{}:{}", target.host_str().unwrap_or_default(), port),
        None => target.host_str().unwrap_or_default().to_string(),
    };

    let uri = format!("{}://{}{}{}", target.scheme(), authority, base_path, path_and_query);
    uri.parse().map_err(|source| ProxyError::InvalidUri { uri, source })
}

/// True when a connect attempt failed on the connector's deadline.
fn is_timeout(err: &hyper_util::client::legacy::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
