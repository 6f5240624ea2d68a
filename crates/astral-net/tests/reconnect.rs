//! Loopback lifecycle tests: the session must survive transport drops and
//! heartbeat silence without a manual reconnect, and tear down cleanly.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use astral_net::{SessionConfig, SessionError, SessionEvent, SessionManager, SessionState};
use astral_shared::{NoIdentity, StaticIdentity, UserId};

const WAIT: Duration = Duration::from_secs(5);

fn test_config(port: u16) -> SessionConfig {
    SessionConfig {
        endpoint: format!("ws://127.0.0.1:{port}"),
        heartbeat_interval: Duration::from_millis(50),
        heartbeat_timeout: Duration::from_millis(250),
        reconnect_base_delay: Duration::from_millis(50),
        reconnect_max_delay: Duration::from_millis(200),
        extra_topics: Vec::new(),
    }
}

async fn next_event(events: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

async fn expect_connected(events: &mut mpsc::Receiver<SessionEvent>) {
    loop {
        match next_event(events).await {
            SessionEvent::Connected => return,
            SessionEvent::Frame(_) => continue,
            other => panic!("expected Connected, got {other:?}"),
        }
    }
}

async fn expect_reconnecting(events: &mut mpsc::Receiver<SessionEvent>) {
    loop {
        match next_event(events).await {
            SessionEvent::Reconnecting { .. } => return,
            SessionEvent::Frame(_) => continue,
            other => panic!("expected Reconnecting, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_connect_without_identity_fails_fast() {
    let (manager, _events) = SessionManager::new(test_config(1), Arc::new(NoIdentity));
    match manager.connect() {
        Err(SessionError::AuthRequired) => {}
        other => panic!("expected AuthRequired, got {other:?}"),
    }
    assert_eq!(manager.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_reconnects_after_transport_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        // First connection: deliver one frame, then drop the socket.
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        ws.send(Message::Text(
            r#"{"type":"notification","data":{"notificationId":1,"type":7,"title":"hello","isRead":0}}"#
                .to_string(),
        ))
        .await
        .unwrap();
        drop(ws);

        // Second connection: stay up, echoing reads so pings are answered.
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let identity = Arc::new(StaticIdentity::new(UserId(7), "token-7"));
    let (manager, mut events) = SessionManager::new(test_config(port), identity);
    manager.connect().unwrap();

    expect_connected(&mut events).await;

    // The pushed frame arrives before the drop; already-delivered state
    // must not be lost across the reconnect.
    let frame = loop {
        match next_event(&mut events).await {
            SessionEvent::Frame(text) => break text,
            SessionEvent::Reconnecting { .. } => panic!("dropped before frame delivery"),
            other => panic!("expected Frame, got {other:?}"),
        }
    };
    assert!(frame.contains("notification"));

    // Transport drop: Connected -> Reconnecting -> Connected, no manual call.
    expect_reconnecting(&mut events).await;
    expect_connected(&mut events).await;
    assert_eq!(manager.state(), SessionState::Connected);

    manager.disconnect();
    assert_eq!(manager.state(), SessionState::Disconnected);
    loop {
        match next_event(&mut events).await {
            SessionEvent::Disconnected => break,
            SessionEvent::Frame(_) => continue,
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    server.abort();
}

#[tokio::test]
async fn test_heartbeat_silence_triggers_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        // Complete the handshake, then go silent: never read, never write.
        let (socket, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        // Hold the socket open without servicing it.
        std::mem::forget(ws);

        // The session must decide the transport is dead and come back.
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let identity = Arc::new(StaticIdentity::new(UserId(8), "token-8"));
    let (manager, mut events) = SessionManager::new(test_config(port), identity);
    manager.connect().unwrap();

    expect_connected(&mut events).await;
    expect_reconnecting(&mut events).await;
    expect_connected(&mut events).await;

    manager.disconnect();
    server.abort();
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let identity = Arc::new(StaticIdentity::new(UserId(9), "token-9"));
    let (manager, _events) = SessionManager::new(test_config(1), identity);

    manager.disconnect();
    manager.disconnect();
    assert_eq!(manager.state(), SessionState::Disconnected);
}
