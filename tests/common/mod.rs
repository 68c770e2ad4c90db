//! Shared utilities for the integration and load tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ollama_farm::config::{FailoverPolicy, HostConfig};
use ollama_farm::farm::HostRegistry;
use ollama_farm::{FarmConfig, FarmServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read one request off the socket and return its body.
pub async fn read_body(socket: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return data,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return data[end + 4..end + 4 + length].to_vec();
            }
        }
    }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// A loopback port nothing listens on.
pub async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Mock Ollama host: `f(request_body)` decides status and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> u16
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve_programmable(listener, f)
}

fn serve_programmable<F, Fut>(listener: TcpListener, f: F) -> u16
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let port = listener.local_addr().unwrap().port();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let body = read_body(&mut socket).await;
                // Health probes connect and close without a request.
                if body.is_empty() {
                    return;
                }
                let (status, reply) = f(body).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line(status),
                    reply.len(),
                    reply
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    port
}

/// Mock Ollama host returning `body` with a `200`.
pub async fn start_mock_backend(body: &'static str) -> u16 {
    start_programmable_backend(move |_| async move { (200, body.to_string()) }).await
}

/// Mock Ollama host on a fixed port, for hosts that come back.
pub async fn start_mock_backend_on(port: u16, body: &'static str) {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    serve_programmable(listener, move |_| async move { (200, body.to_string()) });
}

/// Mock Ollama host that answers after `delay`.
pub async fn start_slow_backend(delay: Duration) -> u16 {
    start_programmable_backend(move |_| async move {
        tokio::time::sleep(delay).await;
        (200, r#"{"response":"late"}"#.to_string())
    })
    .await
}

/// Mock Ollama host streaming NDJSON `lines`, pausing `gap` between them.
pub async fn start_streaming_backend(lines: Vec<&'static str>, gap: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let lines = lines.clone();
            tokio::spawn(async move {
                read_body(&mut socket).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for line in lines {
                    tokio::time::sleep(gap).await;
                    if socket.write_all(format!("{}\n", line).as_bytes()).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    port
}

/// Tracks how many requests a mock host is serving at once.
#[derive(Debug, Default)]
pub struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
    served: AtomicUsize,
}

impl Occupancy {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

/// Mock Ollama host that records its own concurrency.
pub async fn start_counting_backend(work: Duration) -> (u16, Arc<Occupancy>) {
    let occupancy = Arc::new(Occupancy::default());
    let tracked = occupancy.clone();

    let port = start_programmable_backend(move |_| {
        let tracked = tracked.clone();
        async move {
            let now = tracked.current.fetch_add(1, Ordering::SeqCst) + 1;
            tracked.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(work).await;
            tracked.current.fetch_sub(1, Ordering::SeqCst);
            tracked.served.fetch_add(1, Ordering::SeqCst);
            (200, r#"{"response":"ok","done":true}"#.to_string())
        }
    })
    .await;

    (port, occupancy)
}

/// Farm config pointing at loopback hosts with short timeouts.
pub fn farm_config(ports: &[u16]) -> FarmConfig {
    let mut config = FarmConfig::default();
    config.hosts = ports
        .iter()
        .map(|p| {
            let mut host = HostConfig::new("127.0.0.1", *p);
            host.connect_timeout_secs = 1;
            host.request_timeout_secs = 5;
            host
        })
        .collect();
    config.failover.policy = FailoverPolicy::Reject;
    config
}

/// A running farm on an ephemeral port.
pub struct Farm {
    pub addr: SocketAddr,
    pub registry: Arc<HostRegistry>,
    pub shutdown: Shutdown,
}

impl Farm {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn generate_url(&self) -> String {
        self.url("/api/generate/")
    }
}

impl Drop for Farm {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a farm, running the startup probe first like the binary does.
pub async fn start_farm(config: FarmConfig) -> Farm {
    let server = FarmServer::new(config);
    let registry = server.registry().clone();
    ollama_farm::lifecycle::startup::probe_all(&registry, server.probe()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Farm {
        addr,
        registry,
        shutdown,
    }
}

/// Host id string as the farm reports it.
pub fn host_id(port: u16) -> String {
    format!("127.0.0.1:{}", port)
}
