//! Access log in Apache "combined" format.
//!
//! # Responsibilities
//! - Capture client address, time, request line, referrer and user agent on arrival
//! - Count response body bytes as they are sent
//! - Append exactly one line per request once the response completes or is aborted
//!
//! # Design Decisions
//! - A single writer task owns the sink; handlers only send lines over a bounded channel
//! - Write failures and queue overflow go to the diagnostic log, never to the client
//! - A request dropped before its response exists is logged with status 499
//!
//! ```text
//! 203.0.113.9 - - [18/Oct/2026:09:12:44 +0000] "GET /users/7 HTTP/1.1" 200 512 "-" "curl/8.5.0"
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, Version};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Status logged for requests whose client went away before a response existed.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Handle used by request handlers to submit records.
#[derive(Debug, Clone)]
pub struct AccessLogger {
    tx: mpsc::Sender<String>,
}

impl AccessLogger {
    /// Open `path` for appending (creating it if needed) and start the writer.
    pub async fn open(path: &Path, queue_capacity: usize) -> std::io::Result<(Self, JoinHandle<()>)> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        tracing::info!(path = ?path, queue_capacity, "Access log opened");
        Ok(Self::spawn(file, queue_capacity))
    }

    /// Start a writer task that owns `sink`, buffering at most `queue_capacity` lines.
    ///
    /// The task ends once every `AccessLogger` clone has been dropped and the
    /// queue is drained.
    pub fn spawn<W>(sink: W, queue_capacity: usize) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(write_lines(sink, rx));
        (Self { tx }, handle)
    }

    /// Queue a completed record. Never waits on the sink.
    pub fn commit(&self, record: &AccessRecord) {
        match self.tx.try_send(record.to_line()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(line)) => {
                tracing::warn!(record = %line.trim_end(), "Access log queue full; record dropped");
            }
            Err(mpsc::error::TrySendError::Closed(line)) => {
                tracing::warn!(record = %line.trim_end(), "Access log writer stopped; record dropped");
            }
        }
    }
}

async fn write_lines<W>(mut sink: W, mut rx: mpsc::Receiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let result = async {
            sink.write_all(line.as_bytes()).await?;
            sink.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, record = %line.trim_end(), "Access log write failed");
        }
    }
    let _ = sink.shutdown().await;
}

/// One request's access log fields.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub client: Option<SocketAddr>,
    pub received_at: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub version: Version,
    pub status: u16,
    pub bytes: u64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessRecord {
    /// Capture request-side fields. Status stays `CLIENT_CLOSED_REQUEST` until a
    /// response exists; size is counted as the body is sent.
    pub fn from_request(request: &Request) -> Self {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            client,
            received_at: Utc::now(),
            method: request.method().to_string(),
            uri: request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string()),
            version: request.version(),
            status: CLIENT_CLOSED_REQUEST,
            bytes: 0,
            referrer: header_text(request.headers(), header::REFERER),
            user_agent: header_text(request.headers(), header::USER_AGENT),
        }
    }

    /// Render the combined-format line, newline included.
    pub fn to_line(&self) -> String {
        let client = self
            .client
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());
        let bytes = match self.bytes {
            0 => "-".to_string(),
            n => n.to_string(),
        };

        format!(
            "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"\n",
            client,
            self.received_at.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            escape(&self.uri),
            version_text(self.version),
            self.status,
            bytes,
            escape(self.referrer.as_deref().unwrap_or("-")),
            escape(self.user_agent.as_deref().unwrap_or("-")),
        )
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn version_text(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Keeps one record on one line: quotes, backslashes and control bytes are escaped.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// A record not yet written. Commits exactly once: explicitly, or when dropped.
pub struct PendingRecord {
    record: Option<AccessRecord>,
    logger: AccessLogger,
}

impl PendingRecord {
    pub fn new(record: AccessRecord, logger: AccessLogger) -> Self {
        Self {
            record: Some(record),
            logger,
        }
    }

    fn record_mut(&mut self) -> Option<&mut AccessRecord> {
        self.record.as_mut()
    }

    fn commit(&mut self) {
        if let Some(record) = self.record.take() {
            self.logger.commit(&record);
        }
    }
}

impl Drop for PendingRecord {
    fn drop(&mut self) {
        self.commit();
    }
}

/// Response body wrapper that commits the record when the body ends or is dropped.
pub struct LoggedBody {
    inner: Body,
    pending: PendingRecord,
}

impl LoggedBody {
    pub fn new(inner: Body, pending: PendingRecord) -> Self {
        Self { inner, pending }
    }
}

impl HttpBody for LoggedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    let len = data.len() as u64;
                    if let Some(record) = self.pending.record_mut() {
                        record.bytes += len;
                    }
                }
            }
            Poll::Ready(None) => self.pending.commit(),
            Poll::Ready(Some(Err(_))) | Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Middleware recording every request, proxied or static.
///
/// If this future is dropped inside `next.run` (client disconnected while the
/// backend was still working), the pending record commits as 499.
pub async fn record_access(State(logger): State<AccessLogger>, request: Request, next: Next) -> Response {
    let mut pending = PendingRecord::new(AccessRecord::from_request(&request), logger);
    let response = next.run(request).await;

    if let Some(record) = pending.record_mut() {
        record.status = response.status().as_u16();
    }
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(LoggedBody::new(body, pending)))
}
