//! End-to-end scenarios over a real bound TCP listener and real WebSocket
//! clients, covering the seven scenarios in spec.md §8 that are meaningful
//! without artificially stalling a socket (backpressure scenarios 5/6 are
//! exercised deterministically at the unit level in
//! `kernel::subscriber`/`kernel::registry` against a mock transport
//! instead, since reproducing real TCP backpressure reliably in a test is
//! inherently flaky).

use std::sync::Arc;
use std::time::Duration;

use fanout_server::core::config::{BackpressurePolicy, KernelConfig};
use fanout_server::core::Shutdown;
use fanout_server::api;
use fanout_server::kernel::Registry;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

struct TestServer {
    addr: std::net::SocketAddr,
    registry: Arc<Registry>,
}

async fn spawn_server(kernel: KernelConfig) -> TestServer {
    let registry = Arc::new(Registry::new(kernel));
    let shutdown = Shutdown::new(registry.clone());
    let state = api::AppState {
        registry: registry.clone(),
        shutdown,
        dev: false,
    };
    let router = api::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer { addr, registry }
}

async fn connect(addr: std::net::SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/ws");
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

async fn send(ws: &mut WsStream, value: Value) {
    ws.send(WsMessage::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Read frames until one matches `predicate`, skipping any others (e.g. the
/// `connected` info frame sent right after upgrade).
async fn recv_matching(ws: &mut WsStream, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        if let WsMessage::Text(text) = msg {
            let value: Value = serde_json::from_str(&text).unwrap();
            if predicate(&value) {
                return value;
            }
        }
    }
}

fn default_kernel() -> KernelConfig {
    KernelConfig {
        max_queue_size: 100,
        ring_buffer_size: 100,
        backpressure_policy: BackpressurePolicy::DropOldest,
    }
}

#[tokio::test]
async fn scenario_basic_fan_out() {
    let server = spawn_server(default_kernel()).await;
    server.registry.create_topic("orders").unwrap();

    let mut a = connect(server.addr).await;
    let mut b = connect(server.addr).await;

    send(&mut a, json!({"type": "subscribe", "topic": "orders", "client_id": "a"})).await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;
    send(&mut b, json!({"type": "subscribe", "topic": "orders", "client_id": "b"})).await;
    recv_matching(&mut b, |v| v["type"] == "ack").await;

    send(
        &mut a,
        json!({
            "type": "publish",
            "topic": "orders",
            "message": {"id": "550e8400-e29b-41d4-a716-446655440000", "payload": {"o": 1}},
        }),
    )
    .await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;

    let event_a = recv_matching(&mut a, |v| v["type"] == "event").await;
    let event_b = recv_matching(&mut b, |v| v["type"] == "event").await;
    assert_eq!(event_a["message"]["id"], "550e8400-e29b-41d4-a716-446655440000");
    assert_eq!(event_b["message"]["id"], "550e8400-e29b-41d4-a716-446655440000");
}

#[tokio::test]
async fn scenario_replay_on_join() {
    let server = spawn_server(default_kernel()).await;
    server.registry.create_topic("orders").unwrap();

    let mut publisher = connect(server.addr).await;
    for payload in ["U1", "U2", "U3"] {
        send(
            &mut publisher,
            json!({
                "type": "publish",
                "topic": "orders",
                "message": {"id": uuid_for(payload), "payload": payload},
            }),
        )
        .await;
        recv_matching(&mut publisher, |v| v["type"] == "ack").await;
    }

    let mut c = connect(server.addr).await;
    send(
        &mut c,
        json!({"type": "subscribe", "topic": "orders", "client_id": "c", "last_n": 2}),
    )
    .await;
    recv_matching(&mut c, |v| v["type"] == "ack").await;

    let first = recv_matching(&mut c, |v| v["type"] == "event").await;
    let second = recv_matching(&mut c, |v| v["type"] == "event").await;
    assert_eq!(first["message"]["payload"], "U2");
    assert_eq!(second["message"]["payload"], "U3");
}

#[tokio::test]
async fn scenario_unsubscribe_cutoff() {
    let server = spawn_server(default_kernel()).await;
    server.registry.create_topic("orders").unwrap();

    let mut a = connect(server.addr).await;
    send(&mut a, json!({"type": "subscribe", "topic": "orders", "client_id": "a"})).await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;

    send(&mut a, json!({"type": "unsubscribe", "topic": "orders", "client_id": "a"})).await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;

    send(
        &mut a,
        json!({
            "type": "publish",
            "topic": "orders",
            "message": {"id": "550e8400-e29b-41d4-a716-446655440001", "payload": {}},
        }),
    )
    .await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;

    // No event frame should ever arrive; a ping/pong round-trip proves the
    // connection stayed open without delivering one.
    send(&mut a, json!({"type": "ping", "request_id": "p1"})).await;
    let pong = recv_matching(&mut a, |v| v["type"] == "pong" || v["type"] == "event").await;
    assert_eq!(pong["type"], "pong");
}

#[tokio::test]
async fn scenario_topic_deletion_notification() {
    let server = spawn_server(default_kernel()).await;
    server.registry.create_topic("orders").unwrap();

    let mut a = connect(server.addr).await;
    send(&mut a, json!({"type": "subscribe", "topic": "orders", "client_id": "a"})).await;
    recv_matching(&mut a, |v| v["type"] == "ack").await;

    server.registry.delete_topic("orders").unwrap();
    let info = recv_matching(&mut a, |v| v["type"] == "info").await;
    assert_eq!(info["msg"], "topic_deleted");

    send(
        &mut a,
        json!({
            "type": "publish",
            "topic": "orders",
            "message": {"id": "550e8400-e29b-41d4-a716-446655440002", "payload": {}},
        }),
    )
    .await;
    let err = recv_matching(&mut a, |v| v["type"] == "error").await;
    assert_eq!(err["error"]["code"], "TOPIC_NOT_FOUND");
}

#[tokio::test]
async fn scenario_invalid_uuid_leaves_state_unchanged() {
    let server = spawn_server(default_kernel()).await;
    server.registry.create_topic("orders").unwrap();

    let mut a = connect(server.addr).await;
    send(
        &mut a,
        json!({
            "type": "publish",
            "topic": "orders",
            "message": {"id": "not-a-uuid", "payload": {}},
        }),
    )
    .await;

    let err = recv_matching(&mut a, |v| v["type"] == "error").await;
    assert_eq!(err["error"]["code"], "BAD_REQUEST");
    assert!(err["error"]["message"].as_str().unwrap().contains("UUID"));

    let stats = server.registry.get_stats();
    assert_eq!(stats.get("orders").unwrap().messages, 0);
}

fn uuid_for(seed: &str) -> String {
    match seed {
        "U1" => "550e8400-e29b-41d4-a716-446655440010".to_string(),
        "U2" => "550e8400-e29b-41d4-a716-446655440011".to_string(),
        _ => "550e8400-e29b-41d4-a716-446655440012".to_string(),
    }
}
