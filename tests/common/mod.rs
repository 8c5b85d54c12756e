//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use photo_gateway::config::{Environment, GatewaySettings};
use photo_gateway::{Gateway, GatewayError, Shutdown};

pub const INDEX_HTML: &str = "<!doctype html><html><body>photo app</body></html>";

/// What a mock backend saw.
struct Seen {
    method: String,
    target: String,
    host: String,
    header_names: Vec<String>,
    body_len: usize,
}

async fn read_request(socket: &mut TcpStream) -> Option<Seen> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut host = String::new();
    let mut header_names = Vec::new();
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            header_names.push(name.clone());
            match name.as_str() {
                "host" => host = value.trim().to_string(),
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let mut body_len = buf.len() - head_end;
    while body_len < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body_len += n;
    }

    Some(Seen {
        method,
        target,
        host,
        header_names,
        body_len,
    })
}

/// Start a backend that answers `<name> <METHOD> <target> host=<host> body=<len>`,
/// listing the request header names it received in `X-Seen-Headers`.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let Some(seen) = read_request(&mut socket).await else {
                            return;
                        };
                        let body = format!(
                            "{} {} {} host={} body={}",
                            name, seen.method, seen.target, seen.host, seen.body_len
                        );
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Backend: {}\r\nX-Seen-Headers: {}\r\nKeep-Alive: timeout=5\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            name,
                            seen.header_names.join(","),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that accepts connections and never answers.
pub async fn start_stalled_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A listener whose accept queue is full, so new connects hang until they time out.
#[cfg(target_os = "linux")]
pub struct UnresponsiveListener {
    pub addr: SocketAddr,
    _listener: TcpListener,
    _queued: Vec<TcpStream>,
}

#[cfg(target_os = "linux")]
pub async fn start_unresponsive_listener() -> UnresponsiveListener {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    // Fill the accept queue; the first connect that stalls proves it is full.
    let mut queued = Vec::new();
    for _ in 0..64 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => queued.push(stream),
            _ => break,
        }
    }

    UnresponsiveListener {
        addr,
        _listener: listener,
        _queued: queued,
    }
}

/// Send a raw HTTP/1.1 request, writing the body in `chunks` spaced `gap` apart,
/// and return the whole response text.
pub async fn send_slowly(addr: SocketAddr, head: &str, chunks: &[&[u8]], gap: Duration) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    for chunk in chunks {
        tokio::time::sleep(gap).await;
        stream.write_all(chunk).await.unwrap();
    }

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response))
        .await
        .expect("response not finished")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// An address with nothing listening on it.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A port that was free a moment ago.
pub async fn free_port() -> u16 {
    refused_addr().await.port()
}

/// Backend addresses, in env-var order.
pub struct Backends {
    pub photo: SocketAddr,
    pub authentication: SocketAddr,
    pub profile: SocketAddr,
    pub vote: SocketAddr,
    pub comment: SocketAddr,
}

impl Backends {
    /// One echo backend per service.
    pub async fn echo() -> Self {
        Self {
            photo: start_echo_backend("photo").await,
            authentication: start_echo_backend("authentication").await,
            profile: start_echo_backend("profile").await,
            vote: start_echo_backend("vote").await,
            comment: start_echo_backend("comment").await,
        }
    }

    pub fn environment(&self, port: u16) -> Vec<(String, String)> {
        vec![
            ("PORT".into(), port.to_string()),
            ("PHOTO_URL".into(), format!("http://{}", self.photo)),
            ("AUTHENTICATION_URL".into(), format!("http://{}", self.authentication)),
            ("PROFILE_URL".into(), format!("http://{}", self.profile)),
            ("VOTE_URL".into(), format!("http://{}", self.vote)),
            ("COMMENT_URL".into(), format!("http://{}", self.comment)),
        ]
    }
}

/// Scratch directory holding the asset bundle and access log.
pub struct Workspace {
    pub dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("photo-gateway-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("webapp/css")).unwrap();
        std::fs::write(dir.join("webapp/index.html"), INDEX_HTML).unwrap();
        std::fs::write(dir.join("webapp/css/app.css"), "body { margin: 0 }").unwrap();
        Self { dir }
    }

    pub fn settings(&self, response_secs: u64) -> GatewaySettings {
        let mut settings = GatewaySettings::default();
        settings.listener.host = "127.0.0.1".parse().unwrap();
        settings.static_assets.root = self.dir.join("webapp");
        settings.access_log.path = self.access_log_path();
        settings.timeouts.connect_secs = 2;
        settings.timeouts.response_secs = response_secs;
        settings
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.dir.join("access.log")
    }

    pub fn access_log_lines(&self) -> Vec<String> {
        // A line still being appended has no newline yet and is skipped.
        std::fs::read_to_string(self.access_log_path())
            .unwrap_or_default()
            .split_inclusive('\n')
            .filter(|line| line.ends_with('\n'))
            .map(|line| line.trim_end().to_string())
            .collect()
    }

    /// Poll the access log until it holds `count` lines or the deadline passes.
    pub async fn wait_for_log_lines(&self, count: usize) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let lines = self.access_log_lines();
            if lines.len() >= count || tokio::time::Instant::now() >= deadline {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// A gateway running on a local port.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway with the given environment pairs.
pub async fn start_gateway_with(
    env: Vec<(String, String)>,
    settings: GatewaySettings,
) -> Result<RunningGateway, GatewayError> {
    let gateway = Gateway::start(&Environment::from_pairs(env), settings).await?;
    let addr = gateway.local_addr().unwrap();
    assert_eq!(gateway.config().port, addr.port());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = gateway.run(server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    Ok(RunningGateway {
        addr,
        shutdown,
        client,
    })
}

/// Start a gateway in front of `backends`.
pub async fn start_gateway(backends: &Backends, workspace: &Workspace, response_secs: u64) -> RunningGateway {
    let port = free_port().await;
    start_gateway_with(backends.environment(port), workspace.settings(response_secs))
        .await
        .expect("gateway failed to start")
}
