//! Native WebSocket consumer: `tokio-tungstenite`.
//!
//! One supervisor loop drives the connection through its states:
//!
//! ```text
//! CONNECTING ──▶ AUTHENTICATING ──▶ RUNNING
//!     ▲                │               │
//!     └──── BACKOFF ◀──┴───────────────┘        (CLOSED on caller cancel)
//! ```
//!
//! - Connecting authenticates lazily and opens `<ws_url>/api/v4/websocket`.
//! - Authenticating sends the challenge (seq 1) and waits for its reply,
//!   logging the hello frame and discarding anything else.
//! - Running reads with a short timeout so finished handler tasks are
//!   harvested even when the server is quiet.
//! - Backoff waits `ws_reconnect_wait`, optionally logs in again, and retries.
//!
//! A disconnect request is honoured in every state.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::client::Client;
use crate::error::WsError;
use crate::network::websocket_endpoint;
use crate::ws::dispatch::Dispatcher;
use crate::ws::{
    ActionFrame, ConnectionState, Handler, ServerMessage, AUTH_CHALLENGE_SEQ, EVENT_HELLO,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send {
        action: String,
        data: serde_json::Value,
    },
    Disconnect,
}

// ─── Why RUNNING ended ───────────────────────────────────────────────────────

enum Disconnect {
    UserRequested,
    Lost(WsError),
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    client: Client,
    endpoint: String,
    relogin: bool,
    cmd_rx: mpsc::Receiver<Command>,
    state: Arc<AtomicU8>,
    dispatcher: Dispatcher,
}

impl TaskState {
    fn enter(&self, state: ConnectionState) {
        tracing::debug!("WebSocket state: {}", state);
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

// ─── Public consumer ─────────────────────────────────────────────────────────

/// Long-lived consumer of the server's event stream.
///
/// Build it with [`Client::websocket`], then either [`spawn`](Self::spawn) it
/// onto the runtime or await [`run`](Self::run) directly. Connection errors
/// never surface to the caller: they are logged and followed by a reconnect.
pub struct WebSocketConsumer {
    client: Client,
    handler: Handler,
    relogin: bool,
}

impl WebSocketConsumer {
    pub fn new(client: Client, handler: Handler) -> Self {
        let relogin = client.options().ws_relogin();
        Self {
            client,
            handler,
            relogin,
        }
    }

    /// Re-run authentication before every reconnect.
    pub fn relogin(mut self, relogin: bool) -> Self {
        self.relogin = relogin;
        self
    }

    /// Run the consumer on a background task.
    pub fn spawn(self) -> WsHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting as u8));
        let task = self.into_task(cmd_rx, Arc::clone(&state));
        WsHandle {
            cmd_tx,
            state,
            task: Some(tokio::spawn(run_task(task))),
        }
    }

    /// Run the consumer until this future is dropped.
    pub async fn run(self) {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting as u8));
        let task = self.into_task(cmd_rx, state);
        run_task(task).await;
        // Keeps the command channel open for the whole run.
        drop(cmd_tx);
    }

    fn into_task(self, cmd_rx: mpsc::Receiver<Command>, state: Arc<AtomicU8>) -> TaskState {
        let options = self.client.options();
        let endpoint = websocket_endpoint(options.ws_url());
        let dispatcher = Dispatcher::new(
            self.handler,
            options.ws_concurrent(),
            options.ws_max_in_flight(),
        );
        TaskState {
            client: self.client,
            endpoint,
            relogin: self.relogin,
            cmd_rx,
            state,
            dispatcher,
        }
    }
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Control handle for a spawned consumer. Dropping it stops the consumer.
pub struct WsHandle {
    cmd_tx: mpsc::Sender<Command>,
    state: Arc<AtomicU8>,
    task: Option<JoinHandle<()>>,
}

impl WsHandle {
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == ConnectionState::Running
    }

    /// Send an action; the sequence number is assigned on the wire.
    ///
    /// Returns `WsError::NotConnected` unless the consumer is RUNNING.
    pub fn send_action(&self, action: &str, data: serde_json::Value) -> Result<(), WsError> {
        if !self.is_running() {
            return Err(WsError::NotConnected);
        }
        self.cmd_tx
            .try_send(Command::Send {
                action: action.to_string(),
                data,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            })
    }

    /// Tell the channel that the user is typing (optionally in a thread).
    pub fn user_typing(&self, channel_id: &str, parent_id: Option<&str>) -> Result<(), WsError> {
        self.send_action(
            "user_typing",
            serde_json::json!({
                "channel_id": channel_id,
                "parent_id": parent_id.unwrap_or_default(),
            }),
        )
    }

    /// Ask for the statuses of all users; the answer arrives as a reply frame.
    pub fn get_statuses(&self) -> Result<(), WsError> {
        self.send_action("get_statuses", serde_json::json!({}))
    }

    /// Close gracefully and wait (briefly) for the consumer to stop.
    pub async fn close(&mut self) {
        let _ = self.cmd_tx.send(Command::Disconnect).await;
        if let Some(handle) = self.task.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(CLOSE_TIMEOUT, handle).await.is_err() {
                abort.abort();
            }
        }
        self.state
            .store(ConnectionState::Closed as u8, Ordering::SeqCst);
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

// ─── Supervisor ──────────────────────────────────────────────────────────────

async fn run_task(mut task: TaskState) {
    let mut phase = ConnectionState::Connecting;
    let mut conn: Option<(WsSink, WsSource)> = None;

    loop {
        task.enter(phase);
        phase = match phase {
            ConnectionState::Connecting => {
                match or_cancel(&mut task.cmd_rx, connect(&task.client, &task.endpoint)).await {
                    None => ConnectionState::Closed,
                    Some(Ok(parts)) => {
                        conn = Some(parts);
                        ConnectionState::Authenticating
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket connection failed: {}", e);
                        ConnectionState::Backoff
                    }
                }
            }

            ConnectionState::Authenticating => {
                let outcome = match conn.as_mut() {
                    Some((sink, source)) => {
                        or_cancel(&mut task.cmd_rx, handshake(&task.client, sink, source)).await
                    }
                    None => Some(Err(WsError::NotConnected)),
                };
                match outcome {
                    None => ConnectionState::Closed,
                    Some(Ok(())) => {
                        tracing::info!("WebSocket authenticated");
                        ConnectionState::Running
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket handshake failed: {}", e);
                        conn = None;
                        ConnectionState::Backoff
                    }
                }
            }

            ConnectionState::Running => {
                let reason = match conn.as_mut() {
                    Some((sink, source)) => run_connected(&mut task, sink, source).await,
                    None => Disconnect::Lost(WsError::NotConnected),
                };
                match reason {
                    Disconnect::UserRequested => ConnectionState::Closed,
                    Disconnect::Lost(e) => {
                        tracing::warn!("WebSocket connection lost: {}", e);
                        conn = None;
                        ConnectionState::Backoff
                    }
                }
            }

            ConnectionState::Backoff => {
                conn = None;
                let pause = backoff(task.client.clone(), task.relogin);
                match or_cancel(&mut task.cmd_rx, pause).await {
                    None => ConnectionState::Closed,
                    Some(()) => ConnectionState::Connecting,
                }
            }

            ConnectionState::Closed => break,
        };
    }

    if let Some((mut sink, _)) = conn.take() {
        let _ = sink.close().await;
    }
    task.dispatcher.abandon();
    tracing::info!("WebSocket consumer closed");
}

/// Drive `fut` while watching for a disconnect request.
///
/// Returns `None` if the caller asked to disconnect first. Actions sent
/// outside RUNNING are dropped.
async fn or_cancel<F: Future>(cmd_rx: &mut mpsc::Receiver<Command>, fut: F) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send { action, .. }) => {
                    tracing::warn!("Dropping '{}' action: not connected", action);
                }
                Some(Command::Disconnect) | None => return None,
            },
        }
    }
}

// ─── States ──────────────────────────────────────────────────────────────────

async fn connect(client: &Client, endpoint: &str) -> Result<(WsSink, WsSource), WsError> {
    client.ensure_authenticated().await?;

    tracing::debug!("Connecting to {}", endpoint);
    let (ws_stream, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(endpoint))
        .await
        .map_err(|_| WsError::ConnectionFailed("Connection timeout".into()))??;

    Ok(ws_stream.split())
}

async fn handshake(
    client: &Client,
    sink: &mut WsSink,
    source: &mut WsSource,
) -> Result<(), WsError> {
    let token = client.token.get().await.ok_or_else(|| {
        WsError::AuthenticationRejected("no active token to present".into())
    })?;
    send_frame(sink, &ActionFrame::authentication_challenge(&token)).await?;

    tokio::time::timeout(HANDSHAKE_TIMEOUT, await_challenge_reply(sink, source))
        .await
        .map_err(|_| WsError::HandshakeTimeout)?
}

async fn await_challenge_reply(sink: &mut WsSink, source: &mut WsSource) -> Result<(), WsError> {
    loop {
        let text = match source.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Ping(data))) => {
                sink.send(Message::Pong(data)).await?;
                continue;
            }
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = extract_close(frame.as_ref());
                return Err(WsError::Closed {
                    code: Some(code),
                    reason,
                });
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(WsError::Closed {
                    code: None,
                    reason: "Stream ended".into(),
                })
            }
        };

        let text_str: &str = text.as_ref();
        match ServerMessage::parse(text_str) {
            Ok(ServerMessage::Reply(reply)) if reply.seq_reply == AUTH_CHALLENGE_SEQ => {
                return if reply.is_ok() {
                    Ok(())
                } else {
                    Err(WsError::AuthenticationRejected(reply.error_message()))
                };
            }
            Ok(ServerMessage::Event(event)) if event.is(EVENT_HELLO) => {
                tracing::info!(
                    "Connected to server version {}",
                    event.server_version().unwrap_or("unknown")
                );
            }
            Ok(_) => tracing::debug!("Discarding stray frame before handshake: {}", text_str),
            Err(e) => tracing::warn!("WS deserialization error: {} (raw: {})", e, text_str),
        }
    }
}

/// The connected loop; runs until the socket breaks or the caller disconnects.
async fn run_connected(
    task: &mut TaskState,
    sink: &mut WsSink,
    source: &mut WsSource,
) -> Disconnect {
    let read_timeout = task.client.options().ws_read_timeout();
    let mut next_seq = AUTH_CHALLENGE_SEQ + 1;

    loop {
        task.dispatcher.harvest();

        tokio::select! {
            // ── a) Incoming frame (or read timeout) ──────────────────────
            read = tokio::time::timeout(read_timeout, source.next()) => {
                match read {
                    Err(_) => {}
                    Ok(Some(Ok(Message::Text(text)))) => {
                        let text_str: &str = text.as_ref();
                        match ServerMessage::parse(text_str) {
                            Ok(msg) => task.dispatcher.dispatch(msg).await,
                            Err(e) => {
                                tracing::warn!(
                                    "WS deserialization error: {} (raw: {})",
                                    e,
                                    text_str
                                );
                            }
                        }
                    }
                    Ok(Some(Ok(Message::Ping(data)))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            return Disconnect::Lost(e.into());
                        }
                    }
                    Ok(Some(Ok(Message::Close(frame)))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        return Disconnect::Lost(WsError::Closed { code: Some(code), reason });
                    }
                    Ok(Some(Ok(_))) => {} // Binary, Pong, Frame: ignore
                    Ok(Some(Err(e))) => return Disconnect::Lost(e.into()),
                    Ok(None) => {
                        return Disconnect::Lost(WsError::Closed {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                    }
                }
            }

            // ── b) Command from the handle ───────────────────────────────
            cmd = task.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send { action, data }) => {
                        let frame = ActionFrame { seq: next_seq, action, data };
                        next_seq += 1;
                        if let Err(e) = send_frame(sink, &frame).await {
                            tracing::warn!("Send failed: {}", e);
                        }
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        return Disconnect::UserRequested;
                    }
                }
            }
        }
    }
}

async fn backoff(client: Client, relogin: bool) {
    let wait = client.options().ws_reconnect_wait();
    tracing::info!("Reconnecting in {} seconds", wait.as_secs_f64());
    tokio::time::sleep(wait).await;

    if relogin {
        if let Err(e) = client.auth().relogin().await {
            tracing::warn!("Re-login before reconnect failed: {}", e);
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Serialize and send an action frame.
async fn send_frame(sink: &mut WsSink, frame: &ActionFrame) -> Result<(), WsError> {
    let json = serde_json::to_string(frame)?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| WsError::SendFailed(e.to_string()))
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
