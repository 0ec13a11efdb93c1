#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::StreamExt;
use tokio::time;
use tokio_tungstenite::tungstenite;

use comments_api::config::Config;
use comments_api::db::store::MemoryCommentStore;
use comments_api::AppState;

pub type ViewerSocket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Defaults used by every test; individual tests tweak fields as needed.
pub fn test_config() -> Config {
    Config {
        port: 0,
        journal_path: None,
        viewer_buffer: 256,
        max_comment_len: 4000,
        heartbeat_interval_ms: 41250,
    }
}

/// Build an in-memory AppState.
pub fn test_state_with(config: Config) -> AppState {
    let store = Arc::new(MemoryCommentStore::new(config.max_comment_len));
    AppState::with_store(config, store)
}

pub fn test_state() -> AppState {
    test_state_with(test_config())
}

/// Build the full application router wired to a fresh in-memory state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = comments_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing. Runs in the background.
pub async fn start_server(config: Config) -> (SocketAddr, AppState) {
    let state = test_state_with(config);
    let app = comments_api::routes::router().with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Connect to the gateway and read READY. Returns the socket and viewer id.
pub async fn connect_viewer(addr: SocketAddr) -> (ViewerSocket, String) {
    let url = format!("ws://{addr}/gateway");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");

    let ready = next_json(&mut ws).await;
    assert_eq!(ready["op"], 0, "READY should be op=0 (DISPATCH)");
    assert_eq!(ready["t"], "READY");
    let viewer_id = ready["d"]["viewer_id"]
        .as_str()
        .expect("viewer_id present")
        .to_string();

    (ws, viewer_id)
}

/// Read the next text frame as JSON, failing the test after 5 seconds.
pub async fn next_json(ws: &mut ViewerSocket) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for gateway message")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("parse gateway message");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Read the next `newComment` dispatch and return its payload.
pub async fn next_comment(ws: &mut ViewerSocket) -> serde_json::Value {
    let msg = next_json(ws).await;
    assert_eq!(msg["op"], 0);
    assert_eq!(msg["t"], "newComment");
    msg["d"].clone()
}

/// Wait until the hub holds exactly `expected` live channels.
pub async fn wait_for_live_channels(state: &AppState, expected: usize) {
    time::timeout(Duration::from_secs(5), async {
        while state.hub.live_channels() != expected {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} live channels, hub has {}",
            state.hub.live_channels()
        )
    });
}

/// A journal path in the system temp dir, unique per call.
pub fn temp_journal() -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}.jsonl",
        comments_common::id::prefixed_ulid("journal")
    ))
}
