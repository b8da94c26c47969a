//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use user_frontend::config::AppConfig;
use user_frontend::http::FrontendServer;
use user_frontend::lifecycle::{DrainOutcome, Lifecycle};
use user_frontend::upstream::{ApiClient, ApiError};

/// One request as seen by the mock API.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        409 => "409 Conflict",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
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

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    Some(MockRequest { method, path, body })
}

/// Start a programmable mock user API on an ephemeral port.
///
/// `f` maps each request to a status code and JSON body.
pub async fn start_programmable_api<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
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

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// In-process user API with scripted behaviour.
#[derive(Default)]
pub struct StubApi {
    pub users: Mutex<Vec<Value>>,
    pub unreachable: bool,
    pub create_error: Option<String>,
    pub created: Mutex<Vec<Value>>,
}

impl StubApi {
    pub fn with_users(users: Vec<Value>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ApiClient for StubApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        if self.unreachable {
            return Err(ApiError::Transport("connection refused".into()));
        }
        match path {
            "/users" => Ok(Value::Array(self.users.lock().unwrap().clone())),
            "/health" => Ok(json!({ "status": "healthy" })),
            _ => Err(ApiError::Status {
                status: 404,
                message: None,
            }),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        if self.unreachable {
            return Err(ApiError::Transport("connection refused".into()));
        }
        if let Some(message) = &self.create_error {
            return Err(ApiError::Status {
                status: 409,
                message: Some(message.clone()),
            });
        }
        assert_eq!(path, "/users");
        self.created.lock().unwrap().push(body.clone());
        self.users.lock().unwrap().push(body.clone());
        Ok(body.clone())
    }
}

/// Configuration suitable for in-process tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        ..AppConfig::default()
    }
}

/// Send one request through a fresh frontend router.
pub async fn send(server: &FrontendServer, request: Request<Body>) -> Response {
    server.router().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub fn post_form(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A frontend listening on an ephemeral port, with its lifecycle.
pub struct RunningFrontend {
    pub addr: SocketAddr,
    pub lifecycle: Arc<Lifecycle>,
    pub handle: tokio::task::JoinHandle<std::io::Result<DrainOutcome>>,
}

pub async fn spawn_frontend(config: AppConfig, api: Arc<dyn ApiClient>) -> RunningFrontend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let lifecycle = Arc::new(Lifecycle::new(config.shutdown_timeout));

    let server = FrontendServer::new(config, api);
    let serving = lifecycle.clone();
    let handle = tokio::spawn(async move { server.run(listener, &serving).await });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningFrontend {
        addr,
        lifecycle,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
