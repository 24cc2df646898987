use crate::domain::ports::{Message, Subscription, Transport};
use crate::error::{Result, SupplementError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};

/// Default per-subscriber buffer.
pub const DEFAULT_CAPACITY: usize = 1024;

struct Subscriber {
    filter: String,
    sender: mpsc::Sender<Message>,
}

/// An in-process publish/subscribe bus with MQTT-style topic filters.
///
/// Each subscriber gets its own bounded channel. `publish` waits for room, so
/// a slow subscriber applies backpressure; `broadcast` never waits and drops
/// the message for a subscriber that is full. Messages published to topics
/// nobody listens on are dropped, as a broker would.
#[derive(Clone)]
pub struct InProcessBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    capacity: usize,
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InProcessBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            capacity: capacity.max(1),
        }
    }

    async fn prune_closed(&self) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|subscriber| !subscriber.sender.is_closed());
    }

    /// Senders of every subscriber whose filter matches `topic`, cloned so
    /// no lock is held while delivering.
    async fn targets(&self, topic: &str) -> Result<Vec<mpsc::Sender<Message>>> {
        if topic.is_empty() || topic.contains(['+', '#']) {
            return Err(SupplementError::Transport(format!(
                "cannot publish to topic `{topic}`"
            )));
        }
        let subscribers = self.subscribers.read().await;
        Ok(subscribers
            .iter()
            .filter(|subscriber| topic_matches(&subscriber.filter, topic))
            .map(|subscriber| subscriber.sender.clone())
            .collect())
    }

    async fn finish_delivery(&self, topic: &str, closed: bool) {
        if closed {
            tracing::debug!(topic, "dropping closed subscribers");
            self.prune_closed().await;
        }
    }
}

#[async_trait]
impl Transport for InProcessBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let mut closed = false;
        for sender in self.targets(topic).await? {
            let message = Message {
                topic: topic.to_string(),
                payload: payload.clone(),
            };
            if sender.send(message).await.is_err() {
                closed = true;
            }
        }
        self.finish_delivery(topic, closed).await;
        Ok(())
    }

    async fn broadcast(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let mut closed = false;
        for sender in self.targets(topic).await? {
            let message = Message {
                topic: topic.to_string(),
                payload: payload.clone(),
            };
            match sender.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(topic, "subscriber buffer full, message dropped");
                }
                Err(TrySendError::Closed(_)) => closed = true,
            }
        }
        self.finish_delivery(topic, closed).await;
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> Result<Subscription> {
        if !is_valid_filter(filter) {
            return Err(SupplementError::Transport(format!(
                "invalid topic filter `{filter}`"
            )));
        }
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.subscribers.write().await.push(Subscriber {
            filter: filter.to_string(),
            sender,
        });
        tracing::debug!(filter, "subscribed");
        Ok(receiver)
    }
}

fn is_valid_filter(filter: &str) -> bool {
    if filter.is_empty() {
        return false;
    }
    let levels: Vec<&str> = filter.split('/').collect();
    levels.iter().enumerate().all(|(i, level)| match *level {
        "#" => i == levels.len() - 1,
        "+" => true,
        other => !other.contains(['+', '#']),
    })
}

/// MQTT topic matching: `+` matches exactly one level, a trailing `#` matches
/// the parent level and everything below it.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
