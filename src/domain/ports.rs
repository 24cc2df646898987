use super::household::CorrelationKey;
use super::slot::{ResultSlot, Transition};
use super::supplement::SupplementResult;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Maps correlation keys to their result slots.
///
/// The only shared mutable state in the system. Submission creates slots,
/// the dispatcher finalizes them, pollers only read.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Inserts a `Pending` slot if the key has none. Returns `false` if the
    /// key was already present, leaving its slot untouched.
    async fn put_pending(&self, key: &CorrelationKey) -> Result<bool>;
    async fn complete(&self, key: &CorrelationKey, result: SupplementResult) -> Result<Transition>;
    async fn fail(&self, key: &CorrelationKey, reason: String) -> Result<Transition>;
    /// Unknown keys read as `Pending`.
    async fn get(&self, key: &str) -> Result<ResultSlot>;
    async fn len(&self) -> Result<usize>;
}

/// A payload delivered on (or published to) a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub type Subscription = mpsc::Receiver<Message>;

/// Publish/subscribe fabric carrying requests to the dispatcher and results
/// back out. Delivery guarantees are whatever the implementation provides.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers to every matching subscriber, waiting for buffer space.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
    /// Delivers without waiting: a subscriber whose buffer is full misses
    /// the message, as a broker drops QoS 0 traffic for a slow client.
    async fn broadcast(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
    /// Subscribes to every topic matching an MQTT-style filter (`+`, `#`).
    async fn subscribe(&self, filter: &str) -> Result<Subscription>;
}

pub type CorrelationStoreRef = Arc<dyn CorrelationStore>;
pub type TransportRef = Arc<dyn Transport>;
