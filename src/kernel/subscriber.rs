//! Subscriber Record and outbound queue (spec.md §3, §4.2).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::frame::{ErrorCode, ServerFrame};
use super::transport::Transport;
use crate::core::config::BackpressurePolicy;
use crate::core::constants::{CLOSE_CODE_SLOW_CONSUMER, REASON_SLOW_CONSUMER};

/// Outcome of enqueueing a frame onto a subscriber's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Delivered (queued and/or drained), subscriber remains connected.
    Delivered,
    /// The subscriber was just disconnected: transport closed already, or
    /// queue full under the closed transport, or just-evicted queue full
    /// under `DISCONNECT` policy. Caller must invoke `remove_subscriber`.
    Disconnected,
}

/// The per-client mailbox and lifecycle object (spec.md §3 Subscriber,
/// §2 "Subscriber Record").
pub struct SubscriberRecord {
    pub client_id: String,
    pub transport: Arc<dyn Transport>,
    pub topics: HashSet<String>,
    outbound: VecDeque<ServerFrame>,
    /// Flipped false by heartbeat, set true on an observed pong.
    pub liveness: bool,
}

impl SubscriberRecord {
    pub fn new(client_id: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            client_id,
            transport,
            topics: HashSet::new(),
            outbound: VecDeque::new(),
            liveness: true,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.outbound.len()
    }

    /// Enqueue a frame per the backpressure policy in spec.md §4.2, then
    /// attempt to drain in FIFO order, stopping at the first transport
    /// error so the unsent suffix survives for a future attempt.
    pub fn enqueue(
        &mut self,
        frame: ServerFrame,
        max_queue_size: usize,
        policy: BackpressurePolicy,
    ) -> EnqueueOutcome {
        if !self.transport.is_open() {
            return EnqueueOutcome::Disconnected;
        }

        if self.outbound.len() >= max_queue_size {
            match policy {
                BackpressurePolicy::DropOldest => {
                    self.outbound.pop_front();
                }
                BackpressurePolicy::Disconnect => {
                    let _ = self.transport.send(ServerFrame::error(
                        None,
                        ErrorCode::SlowConsumer,
                        "slow consumer: outbound queue full",
                    ));
                    self.transport
                        .close(CLOSE_CODE_SLOW_CONSUMER, REASON_SLOW_CONSUMER);
                    return EnqueueOutcome::Disconnected;
                }
            }
        }

        self.outbound.push_back(frame);
        self.drain();
        EnqueueOutcome::Delivered
    }

    /// Drain queued frames to the transport, FIFO, stopping at the first
    /// failure. Non-blocking: see `Transport::send`.
    pub fn drain(&mut self) {
        while let Some(frame) = self.outbound.front() {
            if self.transport.send(frame.clone()).is_err() {
                break;
            }
            self.outbound.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        open: Mutex<bool>,
        sent: Mutex<Vec<ServerFrame>>,
        closed: Mutex<Option<(u16, String)>>,
        fail_next: Mutex<bool>,
    }

    impl RecordingTransport {
        fn open() -> Arc<Self> {
            Arc::new(Self {
                open: Mutex::new(true),
                ..Default::default()
            })
        }
    }

    impl Transport for RecordingTransport {
        fn is_open(&self) -> bool {
            *self.open.lock()
        }

        fn send(&self, frame: ServerFrame) -> Result<(), super::super::transport::TransportError> {
            if *self.fail_next.lock() {
                return Err(super::super::transport::TransportError);
            }
            self.sent.lock().push(frame);
            Ok(())
        }

        fn close(&self, code: u16, reason: &str) {
            *self.open.lock() = false;
            *self.closed.lock() = Some((code, reason.to_string()));
        }
    }

    fn info_frame() -> ServerFrame {
        ServerFrame::topic_deleted("orders")
    }

    #[test]
    fn drop_oldest_keeps_subscriber_connected() {
        let transport = RecordingTransport::open();
        *transport.fail_next.lock() = true;
        let mut sub = SubscriberRecord::new("a".into(), transport.clone());

        for _ in 0..4 {
            let outcome = sub.enqueue(info_frame(), 2, BackpressurePolicy::DropOldest);
            assert_eq!(outcome, EnqueueOutcome::Delivered);
        }
        assert_eq!(sub.queue_len(), 2);

        *transport.fail_next.lock() = false;
        sub.drain();
        assert_eq!(sub.queue_len(), 0);
        assert_eq!(transport.sent.lock().len(), 2);
    }

    #[test]
    fn disconnect_policy_closes_transport_on_overflow() {
        let transport = RecordingTransport::open();
        *transport.fail_next.lock() = true;
        let mut sub = SubscriberRecord::new("a".into(), transport.clone());

        assert_eq!(
            sub.enqueue(info_frame(), 1, BackpressurePolicy::Disconnect),
            EnqueueOutcome::Delivered
        );
        let outcome = sub.enqueue(info_frame(), 1, BackpressurePolicy::Disconnect);
        assert_eq!(outcome, EnqueueOutcome::Disconnected);
        assert!(!transport.is_open());
        assert_eq!(transport.closed.lock().as_ref().unwrap().0, 1008);
    }

    #[test]
    fn enqueue_on_closed_transport_reports_disconnected() {
        let transport = RecordingTransport::open();
        transport.close(1001, "bye");
        let mut sub = SubscriberRecord::new("a".into(), transport);
        assert_eq!(
            sub.enqueue(info_frame(), 10, BackpressurePolicy::DropOldest),
            EnqueueOutcome::Disconnected
        );
    }
}
