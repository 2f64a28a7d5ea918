//! Local axum servers standing in for a Mattermost instance.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Json, Router};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Bind an ephemeral port and serve `router` on it.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

/// Poll `cond` until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

pub fn user_json(id: &str, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
        "roles": "system_user",
        "create_at": 1_700_000_000_000i64,
        "update_at": 1_700_000_000_000i64,
        "delete_at": 0
    })
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub peer: SocketAddr,
}

impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

type Reply = Arc<dyn Fn(&Seen) -> Response + Send + Sync>;

#[derive(Clone)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
    reply: Reply,
}

impl Recorder {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

/// Serve every path with `reply`, recording what arrives.
pub async fn mock_http(
    reply: impl Fn(&Seen) -> Response + Send + Sync + 'static,
) -> (String, Recorder) {
    let recorder = Recorder {
        seen: Arc::new(Mutex::new(Vec::new())),
        reply: Arc::new(reply),
    };
    let router = Router::new()
        .fallback(record)
        .with_state(recorder.clone());
    let addr = serve(router).await;
    (base_url(addr), recorder)
}

async fn record(
    State(recorder): State<Recorder>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
) -> Response {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let seen = Seen {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
        peer,
    };
    let response = (recorder.reply)(&seen);
    recorder.seen.lock().unwrap().push(seen);
    response
}

pub fn json_reply(status: u16, body: Value) -> Response {
    (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
}

pub fn text_reply(status: u16, body: &'static str) -> Response {
    (StatusCode::from_u16(status).unwrap(), body).into_response()
}

pub fn login_reply(token: &'static str, user: Value) -> Response {
    (StatusCode::OK, [("Token", token)], Json(user)).into_response()
}

// ─── WebSocket ───────────────────────────────────────────────────────────────

/// One accepted event-stream connection, numbered from 0.
pub struct Conn {
    pub socket: WebSocket,
    pub index: usize,
    pub inbox: Arc<Mutex<Vec<Value>>>,
}

impl Conn {
    pub async fn recv_json(&mut self) -> Option<Value> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return serde_json::from_str(text.as_str()).ok(),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    pub async fn send_json(&mut self, value: Value) {
        let _ = self
            .socket
            .send(Message::Text(value.to_string().into()))
            .await;
    }

    /// Read the challenge, check it, and answer with `status`.
    pub async fn answer_challenge(&mut self, token: &str, status: &str) {
        let challenge = self.recv_json().await.unwrap();
        assert_eq!(challenge["seq"], 1);
        assert_eq!(challenge["action"], "authentication_challenge");
        assert_eq!(challenge["data"]["token"], token);
        self.send_json(json!({"status": status, "seq_reply": 1})).await;
    }

    /// Record every frame until the client goes away.
    pub async fn drain(mut self) {
        while let Some(frame) = self.recv_json().await {
            self.inbox.lock().unwrap().push(frame);
        }
    }
}

type Script = Arc<dyn Fn(Conn) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
struct WsState {
    script: Script,
    connections: Arc<AtomicUsize>,
    logins: Arc<AtomicUsize>,
    inbox: Arc<Mutex<Vec<Value>>>,
}

/// A server with the event stream and a login endpoint.
pub struct WsServer {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
    pub logins: Arc<AtomicUsize>,
    pub inbox: Arc<Mutex<Vec<Value>>>,
}

impl WsServer {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn inbox(&self) -> Vec<Value> {
        self.inbox.lock().unwrap().clone()
    }
}

pub async fn mock_ws(
    script: impl Fn(Conn) -> BoxFuture<'static, ()> + Send + Sync + 'static,
) -> WsServer {
    let state = WsState {
        script: Arc::new(script),
        connections: Arc::new(AtomicUsize::new(0)),
        logins: Arc::new(AtomicUsize::new(0)),
        inbox: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/api/v4/websocket", any(upgrade))
        .route("/api/v4/users/login", post(login))
        .with_state(state.clone());
    let addr = serve(router).await;
    WsServer {
        base_url: base_url(addr),
        connections: state.connections,
        logins: state.logins,
        inbox: state.inbox,
    }
}

async fn upgrade(State(state): State<WsState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let index = state.connections.fetch_add(1, Ordering::SeqCst);
        let conn = Conn {
            socket,
            index,
            inbox: state.inbox.clone(),
        };
        (state.script)(conn).await;
    })
}

async fn login(State(state): State<WsState>) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    login_reply("ABC", user_json("u1", "bot"))
}
