//! The broker kernel: transport-agnostic topic/subscriber registry.

pub mod error;
pub mod event;
pub mod frame;
pub mod registry;
pub mod subscriber;
pub mod topic;
pub mod transport;

pub use error::RegistryError;
pub use event::{Event, Message};
pub use frame::{ErrorCode, ServerFrame};
pub use registry::{
    CreateTopicResult, DeleteTopicResult, HealthSnapshot, PublishResult, Registry,
    SubscribeResult, TopicStats, TopicSummary, UnsubscribeResult,
};
pub use subscriber::{EnqueueOutcome, SubscriberRecord};
pub use topic::TopicRecord;
pub use transport::{Transport, TransportError};
