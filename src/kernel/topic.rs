//! Topic Record: subscription set and bounded replay ring (spec.md §3, §4.3).

use std::collections::{HashSet, VecDeque};

use super::event::Event;

pub struct TopicRecord {
    pub name: String,
    pub subscribers: HashSet<String>,
    history: VecDeque<Event>,
    ring_capacity: usize,
    pub message_count: u64,
}

impl TopicRecord {
    pub fn new(name: impl Into<String>, ring_capacity: usize) -> Self {
        Self {
            name: name.into(),
            subscribers: HashSet::new(),
            history: VecDeque::new(),
            ring_capacity,
            message_count: 0,
        }
    }

    /// Append an event, evicting the oldest entry on overflow (I3). A
    /// capacity of 0 disables replay entirely.
    pub fn push_event(&mut self, event: Event) {
        self.message_count += 1;
        if self.ring_capacity == 0 {
            return;
        }
        if self.history.len() >= self.ring_capacity {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// The most recent `min(last_n, |history|)` events, in publish order.
    pub fn replay(&self, last_n: usize) -> Vec<Event> {
        let n = last_n.min(self.history.len());
        self.history.iter().rev().take(n).rev().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::event::Message;
    use serde_json::json;
    use uuid::Uuid;

    fn evt(payload: &str) -> Event {
        Event::new(
            "orders",
            Message {
                id: Uuid::new_v4(),
                payload: json!(payload),
            },
        )
    }

    #[test]
    fn ring_buffer_evicts_oldest_on_overflow() {
        let mut topic = TopicRecord::new("orders", 2);
        topic.push_event(evt("a"));
        topic.push_event(evt("b"));
        topic.push_event(evt("c"));

        assert_eq!(topic.history_len(), 2);
        let replayed = topic.replay(10);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].message.payload, json!("b"));
        assert_eq!(replayed[1].message.payload, json!("c"));
    }

    #[test]
    fn replay_returns_suffix_in_publish_order() {
        let mut topic = TopicRecord::new("orders", 100);
        for p in ["U1", "U2", "U3"] {
            topic.push_event(evt(p));
        }
        let replayed = topic.replay(2);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].message.payload, json!("U2"));
        assert_eq!(replayed[1].message.payload, json!("U3"));
    }

    #[test]
    fn zero_capacity_disables_replay() {
        let mut topic = TopicRecord::new("orders", 0);
        topic.push_event(evt("a"));
        assert_eq!(topic.history_len(), 0);
        assert_eq!(topic.message_count, 1);
        assert!(topic.replay(10).is_empty());
    }
}
