//! Dispatcher consumer loop.

use crate::handler::OperationTable;
use courier_bus::{QueueSender, QueueSubscription};
use courier_types::{decode_request, encode_response, RequestEnvelope, ResponseEnvelope, ServiceConfig};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Consumes request envelopes and guarantees each decodable one is
/// answered exactly once.
///
/// Handlers run on a bounded worker pool; a slow or failing handler for
/// one request never starves other pending requests of an answer, and a
/// panicking handler is converted into a failure response instead of
/// killing the consumer loop.
pub struct Dispatcher {
    /// Operation routing table.
    table: Arc<OperationTable>,
    /// Outbound transport for responses.
    sender: Arc<dyn QueueSender>,
    /// Consumer of the request queue.
    subscription: Box<dyn QueueSubscription>,
    /// Queue responses are sent to.
    response_queue: String,
    /// Bounds concurrently executing handlers.
    limiter: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a dispatcher over an already-attached request subscription.
    pub fn new(
        table: Arc<OperationTable>,
        sender: Arc<dyn QueueSender>,
        subscription: Box<dyn QueueSubscription>,
        response_queue: impl Into<String>,
        max_concurrent_handlers: usize,
    ) -> Self {
        Self {
            table,
            sender,
            subscription,
            response_queue: response_queue.into(),
            limiter: Arc::new(Semaphore::new(max_concurrent_handlers)),
        }
    }

    /// Create a dispatcher from a service configuration.
    pub fn from_config(
        table: Arc<OperationTable>,
        sender: Arc<dyn QueueSender>,
        subscription: Box<dyn QueueSubscription>,
        config: &ServiceConfig,
    ) -> Self {
        Self::new(
            table,
            sender,
            subscription,
            config.response_queue.clone(),
            config.max_concurrent_handlers,
        )
    }

    /// Run the consumer loop. Should be spawned as a background task;
    /// returns when the request queue closes.
    pub async fn run(mut self) {
        info!(
            response_queue = %self.response_queue,
            operations = self.table.len(),
            "Dispatcher started"
        );

        loop {
            let Some(bytes) = self.subscription.recv().await else {
                warn!("Request queue closed, stopping dispatcher");
                break;
            };

            // Received -> Decoded. A malformed request is the one case
            // with no correlation id to answer to: log and drop.
            let envelope = match decode_request(&bytes) {
                Ok(envelope) => envelope,
                Err(e) => {
                    error!(error = %e, "Dropping undecodable request");
                    continue;
                }
            };

            let Ok(permit) = self.limiter.clone().acquire_owned().await else {
                // Semaphore closed; nothing can run handlers anymore.
                break;
            };

            let table = self.table.clone();
            let sender = self.sender.clone();
            let response_queue = self.response_queue.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let response = process(&table, envelope).await;
                reply(sender.as_ref(), &response_queue, response).await;
            });
        }
    }
}

/// Decoded -> Dispatched -> Handled. Never fails: every outcome becomes a
/// response envelope carrying the request's correlation id verbatim.
async fn process(table: &OperationTable, envelope: RequestEnvelope) -> ResponseEnvelope {
    let correlation_id = envelope.correlation_id;

    let Some(handler) = table.get(&envelope.operation) else {
        debug!(
            correlation_id = %correlation_id,
            operation = %envelope.operation,
            "No handler registered"
        );
        return ResponseEnvelope::failure(
            correlation_id,
            format!("Unknown operation: {}", envelope.operation),
        );
    };

    debug!(
        correlation_id = %correlation_id,
        operation = %envelope.operation,
        "Dispatching request"
    );

    // The handler runs in its own task so a panic surfaces as a JoinError
    // here instead of unwinding through the worker.
    let payload = envelope.payload;
    let outcome = tokio::spawn(async move { handler.handle(payload).await }).await;

    match outcome {
        Ok(Ok(data)) => ResponseEnvelope::success(correlation_id, data),
        Ok(Err(e)) => ResponseEnvelope::failure(correlation_id, e.to_string()),
        Err(join_error) => {
            let reason = if join_error.is_panic() {
                match join_error.into_panic().downcast::<String>() {
                    Ok(msg) => format!("handler panicked: {msg}"),
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(msg) => format!("handler panicked: {msg}"),
                        Err(_) => "handler panicked".to_string(),
                    },
                }
            } else {
                "handler was cancelled".to_string()
            };
            error!(correlation_id = %correlation_id, reason = %reason, "Handler did not complete");
            ResponseEnvelope::failure(correlation_id, reason)
        }
    }
}

/// Handled -> Replied. Sending failure is logged, not retried; the
/// caller-side timeout is the backstop.
async fn reply(sender: &dyn QueueSender, response_queue: &str, response: ResponseEnvelope) {
    let correlation_id = response.correlation_id;

    let bytes = match encode_response(&response) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                error = %e,
                "Failed to encode response"
            );
            return;
        }
    };

    if let Err(e) = sender.send(response_queue, bytes).await {
        warn!(
            correlation_id = %correlation_id,
            queue = response_queue,
            error = %e,
            "Failed to send response"
        );
    } else {
        debug!(correlation_id = %correlation_id, "Replied");
    }
}
