//! Shared utilities for integration tests: a programmable coma push server.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::SinkExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

pub type ServerStream = WebSocketStream<TcpStream>;

/// What the server saw during one successful handshake.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub path: String,
    pub query: Option<String>,
    pub origin: Option<String>,
}

/// Handle to a running mock server.
pub struct PushServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicU32>,
    handshakes: Arc<Mutex<Vec<Handshake>>>,
}

impl PushServer {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// TCP connections accepted so far, refused ones included.
    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn handshakes(&self) -> Vec<Handshake> {
        self.handshakes.lock().unwrap().clone()
    }
}

/// Start a push server on an ephemeral port.
///
/// `admit(n)` decides whether the n-th TCP connection (0-based) gets a handshake;
/// refused connections are dropped before the upgrade. Each admitted connection is
/// handed to `session` with its 0-based session index.
pub async fn start_push_server<A, F, Fut>(admit: A, session: F) -> PushServer
where
    A: Fn(u32) -> bool + Send + Sync + 'static,
    F: Fn(u32, ServerStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicU32::new(0));
    let handshakes = Arc::new(Mutex::new(Vec::new()));

    let server_accepted = Arc::clone(&accepted);
    let server_handshakes = Arc::clone(&handshakes);
    tokio::spawn(async move {
        let mut sessions = 0;
        while let Ok((socket, _)) = listener.accept().await {
            let attempt = server_accepted.fetch_add(1, Ordering::SeqCst);
            if !admit(attempt) {
                drop(socket);
                continue;
            }

            let recorded = Arc::clone(&server_handshakes);
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                recorded.lock().unwrap().push(Handshake {
                    path: req.uri().path().to_string(),
                    query: req.uri().query().map(str::to_string),
                    origin: req
                        .headers()
                        .get("origin")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                });
                Ok(resp)
            };

            if let Ok(ws) = accept_hdr_async(socket, callback).await {
                tokio::spawn(session(sessions, ws));
                sessions += 1;
            }
        }
    });

    PushServer {
        addr,
        accepted,
        handshakes,
    }
}

/// Push one document wrapped in the `data` envelope.
pub async fn push(ws: &mut ServerStream, document: Value) {
    let frame = serde_json::json!({ "data": document }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Keep a session open until the client closes it. Returns true if a close frame arrived.
pub async fn hold_open(ws: &mut ServerStream) -> bool {
    use futures_util::StreamExt;
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Close(_)) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    false
}

/// Poll `cond` until it holds or `limit` elapses.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// A port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
