//! Response listener: drains the response queue and completes waiters.

use crate::pending::PendingRequestStore;
use courier_bus::{QueueSubscriber, QueueSubscription};
use courier_types::decode_response;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Background task that completes pending requests from the response
/// queue.
///
/// One listener serves every in-flight call of its registry: it never
/// waits on a specific correlation id, only on queue receive. Undecodable
/// messages are logged and dropped; responses for unknown ids are
/// discarded by the registry (the caller may have timed out already).
pub struct ResponseListener {
    /// Registry shared with the RPC client.
    pending: Arc<PendingRequestStore>,
    /// Consumer of the response queue.
    subscription: Box<dyn QueueSubscription>,
}

impl ResponseListener {
    /// Create a listener over an already-attached subscription.
    pub fn new(pending: Arc<PendingRequestStore>, subscription: Box<dyn QueueSubscription>) -> Self {
        Self {
            pending,
            subscription,
        }
    }

    /// Attach a consumer to `response_queue` on the given transport.
    pub fn attach(
        pending: Arc<PendingRequestStore>,
        subscriber: &dyn QueueSubscriber,
        response_queue: &str,
    ) -> Self {
        Self::new(pending, subscriber.subscribe(response_queue))
    }

    /// Run the listener loop. Should be spawned as a background task;
    /// returns when the queue closes.
    pub async fn run(mut self) {
        info!("Response listener started");

        loop {
            let Some(bytes) = self.subscription.recv().await else {
                warn!("Response queue closed, stopping listener");
                break;
            };

            let response = match decode_response(&bytes) {
                Ok(response) => response,
                Err(e) => {
                    // No correlation id is recoverable from garbage, so
                    // there is no waiter to fail; drop the message.
                    error!(error = %e, "Dropping undecodable response");
                    continue;
                }
            };

            self.pending.complete(response.correlation_id, response);
        }
    }
}
