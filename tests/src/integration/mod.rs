//! Cross-crate integration scenarios.

pub mod concurrency;
pub mod resilience;

use courier_bus::{InMemoryQueueBus, QueueSubscriber};
use courier_client::{PendingRequestStore, ResponseListener, RpcClient};
use courier_dispatch::{Dispatcher, OperationTable};
use courier_types::ServiceConfig;
use std::sync::Arc;

/// One fully wired service: bus, dispatcher, listener, client.
///
/// This is what a real deployment assembles once per logical service;
/// tests build it with whatever operation table the scenario needs.
pub struct ServiceHarness {
    pub bus: Arc<InMemoryQueueBus>,
    pub client: RpcClient,
    pub registry: Arc<PendingRequestStore>,
}

impl ServiceHarness {
    pub fn start(table: OperationTable, config: ServiceConfig) -> Self {
        config.validate().expect("valid config");

        let bus = Arc::new(InMemoryQueueBus::with_capacity(config.queue_capacity));
        let registry = Arc::new(PendingRequestStore::new());

        let dispatcher = Dispatcher::from_config(
            Arc::new(table),
            bus.clone(),
            bus.subscribe(&config.request_queue),
            &config,
        );
        tokio::spawn(dispatcher.run());

        let listener = ResponseListener::attach(
            registry.clone(),
            bus.as_ref(),
            &config.response_queue,
        );
        tokio::spawn(listener.run());

        let client = RpcClient::from_config(registry.clone(), bus.clone(), &config);

        Self {
            bus,
            client,
            registry,
        }
    }

    pub fn start_default(table: OperationTable) -> Self {
        Self::start(table, ServiceConfig::default())
    }
}
