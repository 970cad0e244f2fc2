//! Registry: single source of truth for topics, subscribers, and their
//! cross-references (spec.md §4.1). All state-changing operations run under
//! a single coarse lock so invariants I1–I5 hold atomically for any
//! concurrent reader (spec.md §5, §9 Design Notes).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::event::{Event, Message};
use super::error::RegistryError;
use super::frame::ServerFrame;
use super::subscriber::{EnqueueOutcome, SubscriberRecord};
use super::topic::TopicRecord;
use super::transport::Transport;
use crate::core::config::KernelConfig;

pub struct CreateTopicResult {
    pub name: String,
}

pub struct DeleteTopicResult {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub name: String,
    pub subscriber_count: usize,
}

pub struct SubscribeResult {
    pub topic: String,
    pub client_id: String,
}

pub struct UnsubscribeResult {
    pub topic: String,
    pub client_id: String,
}

#[derive(Debug, Default)]
pub struct PublishResult {
    pub subscribers_reached: usize,
    /// client_ids that failed to receive this publish (transport closed,
    /// or disconnected under backpressure).
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthSnapshot {
    pub uptime_sec: u64,
    pub topics: usize,
    pub subscribers: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopicStats {
    pub messages: u64,
    pub subscribers: usize,
}

struct RegistryState {
    topics: HashMap<String, TopicRecord>,
    subscribers: HashMap<String, SubscriberRecord>,
}

pub struct Registry {
    config: KernelConfig,
    start: Instant,
    state: Mutex<RegistryState>,
}

impl Registry {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            start: Instant::now(),
            state: Mutex::new(RegistryState {
                topics: HashMap::new(),
                subscribers: HashMap::new(),
            }),
        }
    }

    pub fn ring_buffer_size(&self) -> usize {
        self.config.ring_buffer_size
    }

    pub fn max_queue_size(&self) -> usize {
        self.config.max_queue_size
    }

    // ------------------------------------------------------------------
    // Administrative operations
    // ------------------------------------------------------------------

    pub fn create_topic(&self, name: &str) -> Result<CreateTopicResult, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidTopicName);
        }
        let mut state = self.state.lock();
        if state.topics.contains_key(name) {
            return Err(RegistryError::TopicAlreadyExists(name.to_string()));
        }
        state
            .topics
            .insert(name.to_string(), TopicRecord::new(name, self.config.ring_buffer_size));
        tracing::debug!(topic = name, "Topic created");
        Ok(CreateTopicResult {
            name: name.to_string(),
        })
    }

    /// Detach every subscriber from the topic (notifying each with a
    /// best-effort `topic_deleted` info frame, subject to the same
    /// backpressure policy as any other event), then discard the topic.
    pub fn delete_topic(&self, name: &str) -> Result<DeleteTopicResult, RegistryError> {
        let mut state = self.state.lock();
        let topic = state
            .topics
            .remove(name)
            .ok_or_else(|| RegistryError::TopicNotFound(name.to_string()))?;

        let mut to_remove = Vec::new();
        for client_id in &topic.subscribers {
            if let Some(sub) = state.subscribers.get_mut(client_id) {
                sub.topics.remove(name);
                let outcome = sub.enqueue(
                    ServerFrame::topic_deleted(name),
                    self.config.max_queue_size,
                    self.config.backpressure_policy,
                );
                if outcome == EnqueueOutcome::Disconnected {
                    to_remove.push(client_id.clone());
                }
            }
        }
        for client_id in to_remove {
            Self::remove_subscriber_locked(&mut state, &client_id);
        }

        tracing::debug!(topic = name, "Topic deleted");
        Ok(DeleteTopicResult {
            name: name.to_string(),
        })
    }

    pub fn list_topics(&self) -> Vec<TopicSummary> {
        let state = self.state.lock();
        let mut topics: Vec<TopicSummary> = state
            .topics
            .values()
            .map(|t| TopicSummary {
                name: t.name.clone(),
                subscriber_count: t.subscribers.len(),
            })
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }

    pub fn get_health(&self) -> HealthSnapshot {
        let state = self.state.lock();
        HealthSnapshot {
            uptime_sec: self.start.elapsed().as_secs(),
            topics: state.topics.len(),
            subscribers: state.subscribers.len(),
        }
    }

    pub fn get_stats(&self) -> HashMap<String, TopicStats> {
        let state = self.state.lock();
        state
            .topics
            .iter()
            .map(|(name, topic)| {
                (
                    name.clone(),
                    TopicStats {
                        messages: topic.message_count,
                        subscribers: topic.subscribers.len(),
                    },
                )
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Session-facing data-plane operations
    // ------------------------------------------------------------------

    /// Idempotent: subscribing an already-joined `(client_id, topic)` pair
    /// is a membership no-op but still replays and acknowledges
    /// (spec.md §9 Open Question, adopted as specified).
    pub fn subscribe(
        &self,
        client_id: &str,
        transport: Arc<dyn Transport>,
        topic: &str,
        last_n: usize,
    ) -> Result<SubscribeResult, RegistryError> {
        let mut state = self.state.lock();
        if !state.topics.contains_key(topic) {
            return Err(RegistryError::TopicNotFound(topic.to_string()));
        }

        let sub = state
            .subscribers
            .entry(client_id.to_string())
            .or_insert_with(|| SubscriberRecord::new(client_id.to_string(), transport));
        sub.topics.insert(topic.to_string());

        let replay = state.topics.get(topic).expect("checked above").replay(last_n);

        // Re-borrow mutably: membership insert must happen regardless of
        // idempotence (I1), replay must reflect the topic's current history.
        state
            .topics
            .get_mut(topic)
            .expect("checked above")
            .subscribers
            .insert(client_id.to_string());

        if last_n > 0 {
            let sub = state
                .subscribers
                .get_mut(client_id)
                .expect("just inserted");
            for event in replay {
                sub.enqueue(
                    ServerFrame::event(event),
                    self.config.max_queue_size,
                    self.config.backpressure_policy,
                );
            }
        }

        tracing::debug!(client_id, topic, last_n, "Subscribed");
        Ok(SubscribeResult {
            topic: topic.to_string(),
            client_id: client_id.to_string(),
        })
    }

    pub fn unsubscribe(
        &self,
        client_id: &str,
        topic: &str,
    ) -> Result<UnsubscribeResult, RegistryError> {
        let mut state = self.state.lock();

        let joined = state
            .subscribers
            .get(client_id)
            .map(|s| s.topics.contains(topic))
            .unwrap_or(false);
        if !joined {
            return Err(RegistryError::SubscriptionNotFound {
                client_id: client_id.to_string(),
                topic: topic.to_string(),
            });
        }

        if let Some(sub) = state.subscribers.get_mut(client_id) {
            sub.topics.remove(topic);
        }
        if let Some(t) = state.topics.get_mut(topic) {
            t.subscribers.remove(client_id);
        }

        tracing::debug!(client_id, topic, "Unsubscribed");
        Ok(UnsubscribeResult {
            topic: topic.to_string(),
            client_id: client_id.to_string(),
        })
    }

    /// Append to history and fan out to every joined subscriber. A failure
    /// on one subscriber never prevents delivery to the others; failures
    /// are accumulated and reported, never raised (spec.md §4.1).
    pub fn publish(&self, topic: &str, message: Message) -> Result<PublishResult, RegistryError> {
        let mut state = self.state.lock();
        if !state.topics.contains_key(topic) {
            return Err(RegistryError::TopicNotFound(topic.to_string()));
        }

        let event = Event::new(topic, message);
        state
            .topics
            .get_mut(topic)
            .expect("checked above")
            .push_event(event.clone());

        let subscriber_ids: Vec<String> = state
            .topics
            .get(topic)
            .expect("checked above")
            .subscribers
            .iter()
            .cloned()
            .collect();

        let mut result = PublishResult::default();
        let mut to_remove = Vec::new();
        for client_id in subscriber_ids {
            let Some(sub) = state.subscribers.get_mut(&client_id) else {
                result.failed.push(client_id);
                continue;
            };
            let outcome = sub.enqueue(
                ServerFrame::event(event.clone()),
                self.config.max_queue_size,
                self.config.backpressure_policy,
            );
            match outcome {
                EnqueueOutcome::Delivered => result.subscribers_reached += 1,
                EnqueueOutcome::Disconnected => {
                    result.failed.push(client_id.clone());
                    to_remove.push(client_id);
                }
            }
        }
        for client_id in to_remove {
            Self::remove_subscriber_locked(&mut state, &client_id);
        }

        tracing::trace!(
            topic,
            reached = result.subscribers_reached,
            failed = result.failed.len(),
            "Published"
        );
        Ok(result)
    }

    /// Internal cleanup invoked on transport close, heartbeat death, or a
    /// DISCONNECT backpressure event (spec.md §4.1).
    pub fn remove_subscriber(&self, client_id: &str) {
        let mut state = self.state.lock();
        Self::remove_subscriber_locked(&mut state, client_id);
    }

    fn remove_subscriber_locked(state: &mut RegistryState, client_id: &str) {
        if let Some(sub) = state.subscribers.remove(client_id) {
            for topic in &sub.topics {
                if let Some(t) = state.topics.get_mut(topic) {
                    t.subscribers.remove(client_id);
                }
            }
            tracing::debug!(client_id, "Subscriber removed");
        }
    }

    pub fn mark_alive(&self, client_id: &str) {
        let mut state = self.state.lock();
        if let Some(sub) = state.subscribers.get_mut(client_id) {
            sub.liveness = true;
        }
    }

    /// One heartbeat tick (spec.md §4.4): any subscriber still unresponsive
    /// since the previous tick is forcibly closed and removed; every
    /// remaining subscriber is re-armed unresponsive and returned for a
    /// fresh ping round.
    pub fn heartbeat_tick(&self) -> Vec<Arc<dyn Transport>> {
        let mut state = self.state.lock();

        let dead: Vec<String> = state
            .subscribers
            .values()
            .filter(|s| !s.liveness)
            .map(|s| s.client_id.clone())
            .collect();
        for client_id in &dead {
            if let Some(sub) = state.subscribers.get(client_id) {
                sub.transport.close(
                    crate::core::constants::CLOSE_CODE_HEARTBEAT_TIMEOUT,
                    crate::core::constants::REASON_HEARTBEAT_TIMEOUT,
                );
            }
            Self::remove_subscriber_locked(&mut state, client_id);
        }

        state
            .subscribers
            .values_mut()
            .map(|s| {
                s.liveness = false;
                s.transport.clone()
            })
            .collect()
    }

    /// Graceful-shutdown drain: flush every subscriber's queue best-effort
    /// and close its transport with the server-shutdown close code.
    pub async fn close_all_sessions(&self) {
        let client_ids: Vec<String> = {
            let state = self.state.lock();
            state.subscribers.keys().cloned().collect()
        };

        for client_id in client_ids {
            {
                let mut state = self.state.lock();
                if let Some(sub) = state.subscribers.get_mut(&client_id) {
                    sub.drain();
                    sub.transport.close(
                        crate::core::constants::CLOSE_CODE_SERVER_SHUTDOWN,
                        crate::core::constants::REASON_SERVER_SHUTDOWN,
                    );
                }
            }
            tokio::task::yield_now().await;
        }
    }
}
