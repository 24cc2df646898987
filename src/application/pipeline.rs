use super::dispatcher::Dispatcher;
use super::service::SupplementService;
use crate::config::Config;
use crate::domain::ports::{CorrelationStoreRef, TransportRef};
use crate::error::{Result, SupplementError};
use crate::infrastructure::bus::InProcessBus;
use crate::infrastructure::in_memory::InMemoryCorrelationStore;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Owns one running request → compute → publish pipeline.
///
/// The dispatcher is subscribed before the service is handed out, so no
/// submission can be published before someone is listening for it.
pub struct Pipeline {
    service: SupplementService,
    transport: TransportRef,
    shutdown: oneshot::Sender<()>,
    dispatcher: JoinHandle<()>,
}

impl Pipeline {
    /// Starts a pipeline over an in-memory store and an in-process bus.
    pub async fn start(config: &Config) -> Result<Self> {
        let store: CorrelationStoreRef = Arc::new(InMemoryCorrelationStore::new());
        let transport: TransportRef = Arc::new(InProcessBus::with_capacity(config.channel_capacity));
        Self::with_parts(store, transport, config).await
    }

    pub async fn with_parts(
        store: CorrelationStoreRef,
        transport: TransportRef,
        config: &Config,
    ) -> Result<Self> {
        let dispatcher = Dispatcher::new(
            store.clone(),
            transport.clone(),
            config.topics.clone(),
            config.schedule,
        );
        let inbound = dispatcher.subscribe().await?;
        let (shutdown, stopped) = oneshot::channel();
        let dispatcher = tokio::spawn(dispatcher.run(inbound, stopped));

        let service = SupplementService::new(store, transport.clone(), config.topics.clone());
        Ok(Self {
            service,
            transport,
            shutdown,
            dispatcher,
        })
    }

    pub fn service(&self) -> &SupplementService {
        &self.service
    }

    pub fn transport(&self) -> &TransportRef {
        &self.transport
    }

    /// Stops the dispatcher and waits for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        // The dispatcher may already have exited if its channel closed.
        let _ = self.shutdown.send(());
        self.dispatcher
            .await
            .map_err(|e| SupplementError::Computation(format!("dispatcher task failed: {e}")))
    }
}
