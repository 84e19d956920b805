//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use telemetry_demo::config::ServerConfig;
use telemetry_demo::health::ProcessClock;
use telemetry_demo::http::DemoServer;
use telemetry_demo::lifecycle::Shutdown;
use telemetry_demo::observability::{Emitter, MemorySink};

/// Emitter that keeps records in memory.
pub fn memory_emitter() -> (Emitter, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (Emitter::new("test-service", sink.clone()), sink)
}

/// Server config with short simulated delays so tests stay fast.
pub fn fast_server_config() -> ServerConfig {
    ServerConfig {
        bind_host: "127.0.0.1".to_string(),
        port: 0,
        server_name: "test-server".to_string(),
        data_max_ms: 5,
        slow_min_ms: 20,
        slow_max_ms: 40,
        ..Default::default()
    }
}

/// A demo server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub sink: Arc<MemorySink>,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a demo server on `127.0.0.1:0`.
pub async fn spawn_server(config: ServerConfig, grace: Duration) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (emitter, sink) = memory_emitter();
    let shutdown = Shutdown::new();
    let server = DemoServer::new(config, grace, emitter, ProcessClock::start());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        sink,
        handle,
    }
}

/// One request seen by a recording backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a mock backend that records every request and answers with `body`.
pub async fn start_recording_backend(body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }

                        if let Some(request) = parse_request(&buf) {
                            log.lock().unwrap().push(request);
                        }

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
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

    (addr, seen)
}

fn parse_request(raw: &[u8]) -> Option<SeenRequest> {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| {
            let (k, v) = line.split_once(':')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect();
    Some(SeenRequest { path, headers })
}

/// Start a backend that reads requests but never answers. Returns the address
/// and a counter of accepted connections.
pub async fn start_silent_backend() -> (SocketAddr, Arc<Mutex<usize>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(Mutex::new(0usize));
    let count = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            *count.lock().unwrap() += 1;
            tokio::spawn(async move {
                let mut chunk = [0u8; 1024];
                let _ = socket.read(&mut chunk).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    (addr, accepted)
}

/// An address nothing is listening on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
