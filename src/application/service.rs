use crate::config::Topics;
use crate::domain::household::CorrelationKey;
use crate::domain::ports::{CorrelationStoreRef, TransportRef};
use crate::domain::slot::ResultSlot;
use crate::domain::validation::validate;
use crate::error::{Result, SupplementError};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// Returned once a submission has been accepted for computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub id: CorrelationKey,
}

/// Caller-facing half of the pipeline: accepts submissions and answers polls.
///
/// Submission returns as soon as the request is queued; the result shows up
/// in the store once the dispatcher has processed it.
#[derive(Clone)]
pub struct SupplementService {
    store: CorrelationStoreRef,
    transport: TransportRef,
    topics: Topics,
}

impl SupplementService {
    pub fn new(store: CorrelationStoreRef, transport: TransportRef, topics: Topics) -> Self {
        Self {
            store,
            transport,
            topics,
        }
    }

    /// Validates `raw`, records a pending slot and queues the request.
    ///
    /// The slot is written before the request is published so the dispatcher
    /// can never finish a key that is later reset to pending.
    pub async fn submit(&self, raw: &Value) -> Result<Acknowledgement> {
        let request = validate(raw)?;
        let key = request.correlation_key.clone();

        if !self.store.put_pending(&key).await? {
            tracing::warn!(key = %key, "rejecting duplicate submission");
            return Err(SupplementError::DuplicateKey(key));
        }

        let payload = serde_json::to_vec(&request)?;
        if let Err(err) = self.transport.publish(&self.topics.input(&key), payload).await {
            tracing::error!(key = %key, %err, "failed to queue request");
            self.store.fail(&key, format!("request was not queued: {err}")).await?;
            return Err(err);
        }

        tracing::info!(key = %key, "request accepted");
        Ok(Acknowledgement { id: key })
    }

    /// Current slot for `key`. Never blocks on computation.
    pub async fn poll(&self, key: &str) -> Result<ResultSlot> {
        self.store.get(key).await
    }

    /// Polls until the slot is terminal or `timeout` elapses, returning the
    /// last slot seen.
    pub async fn wait_for(&self, key: &str, interval: Duration, timeout: Duration) -> Result<ResultSlot> {
        let deadline = Instant::now() + timeout;
        loop {
            let slot = self.poll(key).await?;
            if slot.is_terminal() || Instant::now() >= deadline {
                return Ok(slot);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
