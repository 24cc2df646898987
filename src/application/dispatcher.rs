use crate::config::Topics;
use crate::domain::household::CorrelationKey;
use crate::domain::ports::{CorrelationStoreRef, Message, Subscription, TransportRef};
use crate::domain::rules::RateSchedule;
use crate::domain::slot::{ResultSlot, Transition};
use crate::domain::supplement::SupplementResult;
use crate::domain::validation::validate;
use crate::error::{Result, SupplementError};
use serde_json::Value;
use tokio::sync::oneshot;

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Computed, recorded as complete and published.
    Published,
    /// Could not be computed; recorded as failed and published.
    Failed,
    /// The key already had a terminal slot (redelivery). The recorded slot
    /// is published again, since an earlier publish may have failed.
    Duplicate,
    /// No usable correlation key; nothing recorded.
    Dropped,
}

/// Consumes requests from the input topics, runs the engine, records the
/// outcome and publishes it on the matching output topic.
///
/// Messages are handled one at a time in delivery order. Failures never
/// escape: they are logged and, when the key is known, recorded as `Failed`.
pub struct Dispatcher {
    store: CorrelationStoreRef,
    transport: TransportRef,
    topics: Topics,
    schedule: RateSchedule,
}

impl Dispatcher {
    pub fn new(
        store: CorrelationStoreRef,
        transport: TransportRef,
        topics: Topics,
        schedule: RateSchedule,
    ) -> Self {
        Self {
            store,
            transport,
            topics,
            schedule,
        }
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        self.transport.subscribe(&self.topics.input_filter()).await
    }

    /// Processes `inbound` until it closes or `shutdown` fires.
    pub async fn run(self, mut inbound: Subscription, mut shutdown: oneshot::Receiver<()>) {
        tracing::info!(filter = %self.topics.input_filter(), "dispatcher started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("dispatcher shutting down");
                    break;
                }
                message = inbound.recv() => match message {
                    Some(message) => {
                        let topic = message.topic.clone();
                        if let Err(err) = self.handle(message).await {
                            tracing::error!(topic = %topic, %err, "error processing message");
                        }
                    }
                    None => {
                        tracing::info!("inbound channel closed");
                        break;
                    }
                },
            }
        }
    }

    /// Handles one message. Errors are store or transport failures only.
    pub async fn handle(&self, message: Message) -> Result<Disposition> {
        let key = match self.topics.key_from_input(&message.topic).map(CorrelationKey::parse) {
            Some(Ok(key)) => key,
            _ => {
                tracing::warn!(topic = %message.topic, "ignoring message without a usable correlation key");
                return Ok(Disposition::Dropped);
            }
        };
        tracing::debug!(key = %key, "request received");

        match self.compute(&key, &message.payload) {
            Ok(result) => self.complete(&key, result).await,
            Err(err) => self.fail(&key, err.to_string()).await,
        }
    }

    fn compute(&self, key: &CorrelationKey, payload: &[u8]) -> Result<SupplementResult> {
        let raw: Value = serde_json::from_slice(payload)?;
        let request = validate(&raw)?;
        if request.correlation_key != *key {
            return Err(SupplementError::Computation(format!(
                "payload id `{}` does not match topic key `{key}`",
                request.correlation_key
            )));
        }
        tracing::debug!(key = %key, "request validated");
        Ok(self.schedule.compute(&request))
    }

    async fn complete(&self, key: &CorrelationKey, result: SupplementResult) -> Result<Disposition> {
        if self.store.complete(key, result.clone()).await? == Transition::AlreadyTerminal {
            return self.republish(key).await;
        }

        tracing::info!(
            key = %key,
            eligible = result.is_eligible,
            amount = %result.supplement_amount,
            "supplement computed"
        );
        self.publish(key, &ResultSlot::Complete(result)).await?;
        Ok(Disposition::Published)
    }

    async fn fail(&self, key: &CorrelationKey, reason: String) -> Result<Disposition> {
        tracing::warn!(key = %key, %reason, "computation failed");
        if self.store.fail(key, reason.clone()).await? == Transition::AlreadyTerminal {
            return self.republish(key).await;
        }

        self.publish(key, &ResultSlot::Failed { reason }).await?;
        Ok(Disposition::Failed)
    }

    /// Redelivery of a finished key: the recorded slot wins over whatever the
    /// new message would have produced.
    async fn republish(&self, key: &CorrelationKey) -> Result<Disposition> {
        tracing::debug!(key = %key, "result already recorded, republishing");
        let recorded = self.store.get(key.as_str()).await?;
        self.publish(key, &recorded).await?;
        Ok(Disposition::Duplicate)
    }

    /// Observers of the output topics never hold up the dispatcher: a full
    /// subscriber misses the message instead.
    async fn publish(&self, key: &CorrelationKey, slot: &ResultSlot) -> Result<()> {
        let payload = serde_json::to_vec(slot)?;
        self.transport.broadcast(&self.topics.output(key), payload).await?;
        tracing::debug!(key = %key, status = slot.status(), "result published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CorrelationStore, Transport};
    use crate::domain::rules::BasePolicy;
    use crate::domain::supplement::Amount;
    use crate::infrastructure::bus::InProcessBus;
    use crate::infrastructure::in_memory::InMemoryCorrelationStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Harness {
        dispatcher: Dispatcher,
        store: Arc<InMemoryCorrelationStore>,
        outputs: Subscription,
        topics: Topics,
    }

    async fn harness(schedule: RateSchedule) -> Harness {
        let store = Arc::new(InMemoryCorrelationStore::new());
        let bus = InProcessBus::new();
        let topics = Topics::default();
        let outputs = bus.subscribe(&topics.output_filter()).await.unwrap();
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(bus), topics.clone(), schedule);
        Harness {
            dispatcher,
            store,
            outputs,
            topics,
        }
    }

    fn request_message(topics: &Topics, id: &str, payload: Value) -> Message {
        Message {
            topic: topics.input(&CorrelationKey::parse(id).unwrap()),
            payload: serde_json::to_vec(&payload).unwrap(),
        }
    }

    fn household(id: &str, composition: &str, children: i64, in_pay: bool) -> Value {
        json!({
            "id": id,
            "familyComposition": composition,
            "numberOfChildren": children,
            "familyUnitInPayForDecember": in_pay
        })
    }

    #[tokio::test]
    async fn test_valid_request_is_completed_and_published() {
        let mut h = harness(RateSchedule::default()).await;
        let message = request_message(&h.topics, "t2", household("t2", "couple", 3, true));

        let disposition = h.dispatcher.handle(message).await.unwrap();
        assert_eq!(disposition, Disposition::Published);

        let expected = SupplementResult::eligible(
            CorrelationKey::parse("t2").unwrap(),
            Amount::whole(120),
            Amount::whole(60),
        );
        assert_eq!(
            h.store.get("t2").await.unwrap(),
            ResultSlot::Complete(expected.clone())
        );

        let published = h.outputs.recv().await.unwrap();
        assert_eq!(published.topic, "BRE/calculateWinterSupplementOutput/t2");
        let body: SupplementResult = serde_json::from_slice(&published.payload).unwrap();
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_ineligible_household() {
        let h = harness(RateSchedule::default()).await;
        let message = request_message(&h.topics, "t3", household("t3", "single", 1, false));

        h.dispatcher.handle(message).await.unwrap();
        let ResultSlot::Complete(result) = h.store.get("t3").await.unwrap() else {
            panic!("expected a complete slot");
        };
        assert!(!result.is_eligible);
        assert_eq!(result.supplement_amount, Amount::ZERO);
    }

    #[tokio::test]
    async fn test_schedule_policy_is_applied() {
        let h = harness(RateSchedule::with_policy(BasePolicy::CompositionOnly)).await;
        let message = request_message(&h.topics, "test9", household("test9", "single", 1, true));

        h.dispatcher.handle(message).await.unwrap();
        let ResultSlot::Complete(result) = h.store.get("test9").await.unwrap() else {
            panic!("expected a complete slot");
        };
        assert_eq!(result.base_amount, Amount::whole(60));
        assert_eq!(result.supplement_amount, Amount::whole(80));
    }

    #[tokio::test]
    async fn test_malformed_payload_marks_slot_failed() {
        let mut h = harness(RateSchedule::default()).await;
        let key = CorrelationKey::parse("broken").unwrap();
        h.store.put_pending(&key).await.unwrap();

        let message = Message {
            topic: h.topics.input(&key),
            payload: b"{not json".to_vec(),
        };
        let disposition = h.dispatcher.handle(message).await.unwrap();
        assert_eq!(disposition, Disposition::Failed);
        assert!(matches!(
            h.store.get("broken").await.unwrap(),
            ResultSlot::Failed { .. }
        ));

        let published = h.outputs.recv().await.unwrap();
        let body: Value = serde_json::from_slice(&published.payload).unwrap();
        assert_eq!(body["status"], "failed");
    }

    #[tokio::test]
    async fn test_invalid_payload_reports_validation_reason() {
        let h = harness(RateSchedule::default()).await;
        let message = request_message(&h.topics, "t5", household("t5", "single", -3, true));

        assert_eq!(h.dispatcher.handle(message).await.unwrap(), Disposition::Failed);
        assert_eq!(
            h.store.get("t5").await.unwrap(),
            ResultSlot::Failed {
                reason: "Invalid numberOfChildren".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_key_mismatch_is_a_failure() {
        let h = harness(RateSchedule::default()).await;
        let message = request_message(&h.topics, "topic-key", household("other", "single", 0, true));

        assert_eq!(h.dispatcher.handle(message).await.unwrap(), Disposition::Failed);
        assert!(h.store.get("topic-key").await.unwrap().is_terminal());
        assert_eq!(h.store.get("other").await.unwrap(), ResultSlot::Pending);
    }

    #[tokio::test]
    async fn test_redelivery_republishes_recorded_result() {
        let mut h = harness(RateSchedule::default()).await;
        let first = h
            .dispatcher
            .handle(request_message(&h.topics, "t1", household("t1", "single", 0, true)))
            .await
            .unwrap();
        // A redelivered message must not change the recorded outcome.
        let second = h
            .dispatcher
            .handle(request_message(&h.topics, "t1", household("t1", "couple", 2, true)))
            .await
            .unwrap();
        assert_eq!(first, Disposition::Published);
        assert_eq!(second, Disposition::Duplicate);

        let original = h.outputs.recv().await.unwrap();
        let repeated = h.outputs.recv().await.unwrap();
        assert_eq!(original, repeated);
        let body: SupplementResult = serde_json::from_slice(&repeated.payload).unwrap();
        assert_eq!(body.supplement_amount, Amount::whole(60));
    }

    /// Drops the first broadcast, then behaves like the wrapped bus.
    struct LossyOnce {
        bus: InProcessBus,
        failed: AtomicBool,
    }

    #[async_trait]
    impl Transport for LossyOnce {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
            self.bus.publish(topic, payload).await
        }

        async fn broadcast(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(SupplementError::Transport("connection reset".to_string()));
            }
            self.bus.broadcast(topic, payload).await
        }

        async fn subscribe(&self, filter: &str) -> Result<Subscription> {
            self.bus.subscribe(filter).await
        }
    }

    #[tokio::test]
    async fn test_result_lost_on_publish_is_sent_on_redelivery() {
        let store = Arc::new(InMemoryCorrelationStore::new());
        let bus = InProcessBus::new();
        let topics = Topics::default();
        let mut outputs = bus.subscribe(&topics.output_filter()).await.unwrap();
        let transport = Arc::new(LossyOnce {
            bus,
            failed: AtomicBool::new(false),
        });
        let dispatcher = Dispatcher::new(store.clone(), transport, topics.clone(), RateSchedule::default());
        let message = request_message(&topics, "t4", household("t4", "couple", 3, true));

        assert!(matches!(
            dispatcher.handle(message.clone()).await,
            Err(SupplementError::Transport(_))
        ));
        assert!(store.get("t4").await.unwrap().is_terminal());
        assert!(outputs.try_recv().is_err());

        assert_eq!(dispatcher.handle(message).await.unwrap(), Disposition::Duplicate);
        let published = outputs.recv().await.unwrap();
        assert_eq!(published.topic, "BRE/calculateWinterSupplementOutput/t4");
        let body: SupplementResult = serde_json::from_slice(&published.payload).unwrap();
        assert_eq!(body.supplement_amount, Amount::whole(180));
    }

    #[tokio::test]
    async fn test_foreign_topic_is_dropped() {
        let h = harness(RateSchedule::default()).await;
        let message = Message {
            topic: "somewhere/else/t1".to_string(),
            payload: Vec::new(),
        };

        assert_eq!(h.dispatcher.handle(message).await.unwrap(), Disposition::Dropped);
        assert_eq!(h.store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness(RateSchedule::default()).await;
        let inbound = h.dispatcher.subscribe().await.unwrap();
        let (stop, stopped) = oneshot::channel();

        let task = tokio::spawn(h.dispatcher.run(inbound, stopped));
        stop.send(()).unwrap();
        task.await.unwrap();
    }
}
