//! Session Controller: one per connected client (spec.md §4.4).
//!
//! Owns the WebSocket transport, runs the inbound frame loop, and drives
//! the `CONNECTING -> OPEN -> CLOSING -> CLOSED` state machine. The actual
//! socket write lives in a small writer task fed by a channel bounded to
//! `max_queue_size`, so `WsTransport::send` (used from inside the
//! registry's critical section) never blocks on the network — and so a
//! slow consumer fills the channel and reports back to
//! `SubscriberRecord::enqueue`, which is what actually engages the
//! `DROP_OLDEST`/`DISCONNECT` backpressure policy (spec.md §4.2).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::kernel::{ErrorCode, Registry, RegistryError, ServerFrame, Transport, TransportError};

enum WsOutbound {
    Frame(ServerFrame),
    Ping,
    Close(u16, String),
}

/// `Transport` impl bridging the registry's non-blocking `send` contract to
/// a real WebSocket, via a channel drained by a dedicated writer task.
///
/// The channel is bounded to the configured `max_queue_size` and `send`
/// uses `try_send`: once the writer can't keep up and the channel fills,
/// `send` starts returning `Err`, `SubscriberRecord::drain` stops draining
/// its own `VecDeque`, and the next `enqueue` call sees a full queue and
/// applies the backpressure policy. A channel that never filled would make
/// that policy unreachable.
pub struct WsTransport {
    open: AtomicBool,
    tx: mpsc::Sender<WsOutbound>,
}

impl WsTransport {
    fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<WsOutbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Arc::new(Self {
                open: AtomicBool::new(true),
                tx,
            }),
            rx,
        )
    }
}

impl Transport for WsTransport {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, frame: ServerFrame) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError);
        }
        self.tx
            .try_send(WsOutbound::Frame(frame))
            .map_err(|_| TransportError)
    }

    fn close(&self, code: u16, reason: &str) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.tx.try_send(WsOutbound::Close(code, reason.to_string()));
        }
    }

    fn ping(&self) {
        let _ = self.tx.try_send(WsOutbound::Ping);
    }
}

async fn run_writer(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut rx: mpsc::Receiver<WsOutbound>,
) {
    while let Some(out) = rx.recv().await {
        let result = match out {
            WsOutbound::Frame(frame) => match serde_json::to_string(&frame) {
                Ok(text) => sink.send(WsMessage::Text(text.into())).await,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to serialize outbound frame");
                    continue;
                }
            },
            WsOutbound::Ping => sink.send(WsMessage::Ping(Vec::new().into())).await,
            WsOutbound::Close(code, reason) => {
                let _ = sink
                    .send(WsMessage::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })))
                    .await;
                break;
            }
        };
        if result.is_err() {
            break;
        }
    }
}

/// Drives one client's frame loop for the lifetime of its WebSocket.
pub struct SessionController {
    session_id: String,
    registry: Arc<Registry>,
    transport: Arc<WsTransport>,
    client_ids: SyncMutex<HashSet<String>>,
}

impl SessionController {
    fn new(registry: Arc<Registry>) -> (Arc<Self>, mpsc::Receiver<WsOutbound>) {
        let capacity = registry.max_queue_size();
        let (transport, rx) = WsTransport::new(capacity);
        let controller = Arc::new(Self {
            session_id: Uuid::new_v4().to_string(),
            registry,
            transport,
            client_ids: SyncMutex::new(HashSet::new()),
        });
        (controller, rx)
    }

    /// Run the session's frame loop until the socket closes or shutdown is
    /// signaled, then detach every client_id this session registered
    /// exactly once on the way to CLOSED (spec.md §4.4).
    async fn run(self: Arc<Self>, mut ws_rx: SplitStream<WebSocket>, mut shutdown: watch::Receiver<bool>) {
        let _ = self.transport.send(ServerFrame::connected(&self.session_id));

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => self.handle_text(text.as_str()).await,
                        Some(Ok(WsMessage::Pong(_))) => self.handle_pong(),
                        Some(Ok(WsMessage::Close(_))) => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::debug!(error = %err, session_id = %self.session_id, "Transport read error");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        self.teardown();
    }

    fn teardown(&self) {
        let ids: Vec<String> = self.client_ids.lock().drain().collect();
        for client_id in ids {
            self.registry.remove_subscriber(&client_id);
        }
        self.transport.close(1000, "session closed");
    }

    fn handle_pong(&self) {
        for client_id in self.client_ids.lock().iter() {
            self.registry.mark_alive(client_id);
        }
    }

    async fn handle_text(&self, text: &str) {
        match super::frame::parse(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => self.send_error(err.request_id, ErrorCode::BadRequest, err.message),
        }
    }

    fn handle_frame(&self, frame: super::frame::ClientFrame) {
        use super::frame::ClientFrame;
        match frame {
            ClientFrame::Subscribe {
                request_id,
                topic,
                client_id,
                last_n,
            } => {
                let result = self
                    .registry
                    .subscribe(&client_id, self.transport.clone(), &topic, last_n);
                match result {
                    Ok(r) => {
                        self.client_ids.lock().insert(r.client_id);
                        self.send_ack(request_id, r.topic);
                    }
                    Err(err) => self.send_registry_error(request_id, err),
                }
            }
            ClientFrame::Unsubscribe {
                request_id,
                topic,
                client_id,
            } => match self.registry.unsubscribe(&client_id, &topic) {
                Ok(r) => {
                    tracing::trace!(client_id = %r.client_id, topic = %r.topic, "unsubscribed");
                    self.send_ack(request_id, r.topic);
                }
                Err(err) => self.send_registry_error(request_id, err),
            },
            ClientFrame::Publish {
                request_id,
                topic,
                message,
            } => match self.registry.publish(&topic, message) {
                Ok(r) => {
                    tracing::trace!(
                        topic = %topic,
                        reached = r.subscribers_reached,
                        failed = r.failed.len(),
                        "published"
                    );
                    self.send_ack(request_id, topic);
                }
                Err(err) => self.send_registry_error(request_id, err),
            },
            ClientFrame::Ping { request_id } => {
                let _ = self.transport.send(ServerFrame::pong(request_id));
            }
        }
    }

    fn send_ack(&self, request_id: Option<String>, topic: String) {
        let _ = self.transport.send(ServerFrame::ack(request_id, topic));
    }

    fn send_registry_error(&self, request_id: Option<String>, err: RegistryError) {
        let code = err.wire_code();
        self.send_error(request_id, code, err.to_string());
    }

    fn send_error(&self, request_id: Option<String>, code: ErrorCode, message: impl Into<String>) {
        let _ = self.transport.send(ServerFrame::error(request_id, code, message));
    }
}

/// Split the socket, spawn the writer task, and run the session's frame
/// loop to completion. Called by the `/ws` upgrade handler.
pub async fn run(registry: Arc<Registry>, socket: WebSocket, shutdown: watch::Receiver<bool>) {
    let (ws_tx, ws_rx) = socket.split();
    let (controller, writer_rx) = SessionController::new(registry);
    let writer = tokio::spawn(run_writer(ws_tx, writer_rx));
    controller.run(ws_rx, shutdown).await;
    let _ = writer.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_fails_once_the_bounded_channel_is_full() {
        let (transport, _rx) = WsTransport::new(2);
        assert!(transport.send(ServerFrame::pong(None)).is_ok());
        assert!(transport.send(ServerFrame::pong(None)).is_ok());
        // Nothing is draining the receiver, so a third frame overflows it —
        // this is what lets a slow consumer's backpressure policy engage.
        assert!(transport.send(ServerFrame::pong(None)).is_err());
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let (transport, _rx) = WsTransport::new(0);
        assert!(transport.send(ServerFrame::pong(None)).is_ok());
        assert!(transport.send(ServerFrame::pong(None)).is_err());
    }

    #[test]
    fn close_flips_open_and_stops_further_sends() {
        let (transport, _rx) = WsTransport::new(4);
        assert!(transport.is_open());
        transport.close(1000, "bye");
        assert!(!transport.is_open());
        assert!(transport.send(ServerFrame::pong(None)).is_err());
    }
}
