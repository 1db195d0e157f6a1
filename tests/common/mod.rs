//! Shared utilities for integration testing.
#![allow(dead_code)]

use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use dbwire::{Connection, ConnectionConfig, Protocol};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Reply sent by a mock backend.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::to_vec(body).unwrap(),
        }
    }

    pub fn cbor(status: u16, body: &Value) -> Self {
        let mut buf = Vec::new();
        ciborium::into_writer(body, &mut buf).unwrap();
        Self {
            status,
            content_type: "application/cbor",
            body: buf,
        }
    }

    /// Echo the request body back with the request's content type.
    pub fn echo(req: &CapturedRequest) -> Self {
        let content_type = match req.header("content-type") {
            Some("application/cbor") => "application/cbor",
            _ => "application/json",
        };
        Self {
            status: 200,
            content_type,
            body: req.body.clone(),
        }
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    /// Endpoint address for a connection config.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

/// Start a mock backend that returns a fixed JSON response.
pub async fn start_mock_backend(status: u16, body: Value) -> MockBackend {
    let reply = MockReply::json(status, &body);
    start_programmable_backend(move |_| reply.clone()).await
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(&CapturedRequest) -> MockReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let sink = Arc::clone(&captured);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = Arc::clone(&f);
                    let sink = Arc::clone(&sink);
                    tokio::spawn(async move {
                        let _ = read_request(socket, move |req| {
                            let reply = f(&req);
                            sink.lock().unwrap().push(req);
                            reply
                        })
                        .await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, captured }
}

/// Read one HTTP/1.1 request, answer it, and close the connection.
async fn read_request<F>(socket: TcpStream, respond: F) -> Option<()>
where
    F: FnOnce(CapturedRequest) -> MockReply,
{
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let (key, value) = line.split_once(':')?;
        headers.push((key.trim().to_string(), value.trim().to_string()));
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.ok()?;

    let reply = respond(CapturedRequest {
        method,
        target,
        headers,
        body,
    });

    let mut socket = reader.into_inner();
    let head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nX-Mock: true\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    socket.write_all(head.as_bytes()).await.ok()?;
    socket.write_all(&reply.body).await.ok()?;
    let _ = socket.shutdown().await;
    Some(())
}

/// Address of a port nothing listens on.
pub async fn unreachable_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Connection over the real HTTP transport.
pub fn connect(endpoints: Vec<String>, protocol: Protocol) -> Connection {
    let mut config = ConnectionConfig {
        endpoints,
        protocol,
        ..ConnectionConfig::default()
    };
    config.timeouts.connect_ms = 1_000;
    config.timeouts.request_ms = 5_000;
    Connection::from_config(config).unwrap()
}
