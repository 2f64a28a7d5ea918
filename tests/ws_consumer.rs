//! WebSocket consumer against a local mock server.
//!
//! The server side of each test is a script run once per accepted
//! connection; `Conn::index` tells the script which attempt it is serving.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde_json::json;

use common::{mock_ws, wait_until, Conn, WsServer};
use mattermost_sdk::prelude::*;

const LIMIT: Duration = Duration::from_secs(5);

fn options(server: &WsServer) -> ClientOptionsBuilder {
    ClientOptions::builder(&server.base_url)
        .token("ABC")
        .ws_reconnect_wait(Duration::from_millis(100))
        .ws_read_timeout(Duration::from_millis(50))
}

/// Handler that keeps every frame it sees.
fn collecting() -> (Handler, Arc<Mutex<Vec<ServerMessage>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = Handler::from_async(move |msg| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(msg);
            HandlerResult::Ok(())
        }
    });
    (handler, seen)
}

fn posted(id: &str) -> serde_json::Value {
    json!({
        "event": "posted",
        "data": {"post": json!({"id": id, "channel_id": "c1", "message": "hi"}).to_string()},
        "broadcast": {"channel_id": "c1"},
        "seq": 1
    })
}

#[tokio::test]
async fn test_handshake_skips_stray_frames() {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            let challenge = conn.recv_json().await.unwrap();
            assert_eq!(challenge["data"]["token"], "ABC");
            conn.send_json(json!({
                "event": "hello",
                "data": {"server_version": "9.11.0"},
                "seq": 0
            }))
            .await;
            conn.send_json(json!({"event": "typing", "data": {}})).await;
            conn.send_json(json!({"status": "OK", "seq_reply": 7})).await;
            conn.send_json(json!({"status": "OK", "seq_reply": 1})).await;
            conn.send_json(posted("p1")).await;
            conn.drain().await;
        }
        .boxed()
    })
    .await;
    let (handler, seen) = collecting();
    let client = Client::new(options(&server).build().unwrap());
    let mut handle = client.websocket(handler).spawn();

    assert!(wait_until(LIMIT, || seen.lock().unwrap().len() == 1).await);
    assert_eq!(handle.state(), ConnectionState::Running);

    let first = seen.lock().unwrap()[0].clone();
    let post = first.event().unwrap().post().unwrap().unwrap();
    assert_eq!(post.id, "p1");

    handle.close().await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_rejected_challenge_reconnects() {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            let status = if conn.index == 0 { "FAIL" } else { "OK" };
            conn.answer_challenge("ABC", status).await;
            conn.drain().await;
        }
        .boxed()
    })
    .await;
    let (handler, _seen) = collecting();
    let client = Client::new(options(&server).build().unwrap());
    let mut handle = client.websocket(handler).spawn();

    assert!(wait_until(LIMIT, || handle.is_running()).await);
    assert_eq!(server.connections(), 2);
    handle.close().await;
}

#[tokio::test]
async fn test_reconnect_with_relogin() {
    let marks: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let script_marks = marks.clone();
    let server = mock_ws(move |mut conn: Conn| {
        let marks = script_marks.clone();
        async move {
            if conn.index > 0 {
                marks.lock().unwrap().push(Instant::now());
            }
            conn.answer_challenge("ABC", "OK").await;
            if conn.index == 0 {
                // Drop the first connection right after the handshake.
                marks.lock().unwrap().push(Instant::now());
                return;
            }
            conn.drain().await;
        }
        .boxed()
    })
    .await;
    let (handler, _seen) = collecting();
    let client = Client::new(
        ClientOptions::builder(&server.base_url)
            .login("bot", "pw")
            .ws_reconnect_wait(Duration::from_millis(100))
            .ws_read_timeout(Duration::from_millis(50))
            .build()
            .unwrap(),
    );
    let mut handle = client.websocket(handler).relogin(true).spawn();

    assert!(wait_until(LIMIT, || server.connections() == 2).await);
    assert!(wait_until(LIMIT, || handle.is_running()).await);
    // Lazy login for the first connection, relogin before the second.
    assert_eq!(server.logins(), 2);

    assert!(wait_until(LIMIT, || marks.lock().unwrap().len() == 2).await);
    let gap = {
        let marks = marks.lock().unwrap();
        marks[1] - marks[0]
    };
    assert!(gap >= Duration::from_millis(100), "reconnected after {gap:?}");

    // One drop, one reconnect: no further attempts while connected.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.connections(), 2);
    assert_eq!(server.logins(), 2);
    assert!(handle.is_running());
    handle.close().await;
}

#[tokio::test]
async fn test_reconnect_without_relogin_keeps_token() {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            conn.answer_challenge("ABC", "OK").await;
            if conn.index > 0 {
                conn.drain().await;
            }
        }
        .boxed()
    })
    .await;
    let (handler, _seen) = collecting();
    let client = Client::new(
        ClientOptions::builder(&server.base_url)
            .login("bot", "pw")
            .ws_reconnect_wait(Duration::from_millis(100))
            .build()
            .unwrap(),
    );
    let mut handle = client.websocket(handler).spawn();

    assert!(wait_until(LIMIT, || server.connections() == 2).await);
    assert!(wait_until(LIMIT, || handle.is_running()).await);
    assert_eq!(server.logins(), 1);
    handle.close().await;
}

#[tokio::test]
async fn test_actions_are_numbered_from_two() {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            conn.answer_challenge("ABC", "OK").await;
            conn.drain().await;
        }
        .boxed()
    })
    .await;
    let (handler, _seen) = collecting();
    let client = Client::new(options(&server).build().unwrap());
    let mut handle = client.websocket(handler).spawn();

    assert!(wait_until(LIMIT, || handle.is_running()).await);
    handle.user_typing("c1", None).unwrap();
    handle.get_statuses().unwrap();

    assert!(wait_until(LIMIT, || server.inbox().len() == 2).await);
    let inbox = server.inbox();
    assert_eq!(inbox[0]["seq"], 2);
    assert_eq!(inbox[0]["action"], "user_typing");
    assert_eq!(inbox[0]["data"]["channel_id"], "c1");
    assert_eq!(inbox[1]["seq"], 3);
    assert_eq!(inbox[1]["action"], "get_statuses");

    handle.close().await;
    assert!(matches!(
        handle.user_typing("c1", None),
        Err(WsError::NotConnected)
    ));
}

/// Time for five 200 ms handlers to finish.
async fn five_slow_handlers(concurrent: bool) -> Duration {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            conn.answer_challenge("ABC", "OK").await;
            for i in 0..5 {
                conn.send_json(posted(&format!("p{}", i))).await;
            }
            conn.drain().await;
        }
        .boxed()
    })
    .await;

    let done = Arc::new(Mutex::new(0usize));
    let counter = done.clone();
    let handler = Handler::from_async(move |_msg| {
        let counter = counter.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            *counter.lock().unwrap() += 1;
            HandlerResult::Ok(())
        }
    });
    let client = Client::new(options(&server).ws_concurrent(concurrent).build().unwrap());

    let mut handle = client.websocket(handler).spawn();
    assert!(wait_until(LIMIT, || handle.is_running()).await);
    let started = Instant::now();
    assert!(wait_until(LIMIT, || *done.lock().unwrap() == 5).await);
    let elapsed = started.elapsed();
    handle.close().await;
    elapsed
}

#[tokio::test]
async fn test_concurrent_dispatch_overlaps_handlers() {
    let elapsed = five_slow_handlers(true).await;
    assert!(elapsed < Duration::from_millis(800), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_sequential_dispatch_runs_one_at_a_time() {
    let elapsed = five_slow_handlers(false).await;
    assert!(elapsed >= Duration::from_millis(750), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_failing_handler_keeps_consumer_running() {
    let server = mock_ws(|mut conn: Conn| {
        async move {
            conn.answer_challenge("ABC", "OK").await;
            conn.send_json(posted("p1")).await;
            conn.send_json(posted("p2")).await;
            conn.drain().await;
        }
        .boxed()
    })
    .await;
    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let handler = Handler::from_blocking(move |_msg| {
        *counter.lock().unwrap() += 1;
        Err("handler failed".into())
    });
    let client = Client::new(options(&server).build().unwrap());
    let mut handle = client.websocket(handler).spawn();

    assert!(wait_until(LIMIT, || *calls.lock().unwrap() == 2).await);
    assert!(handle.is_running());
    assert_eq!(server.connections(), 1);
    handle.close().await;
}
