//! RPC client: the single entry point callers use.

use crate::pending::{PendingRequestStore, RegistryError};
use courier_bus::{QueueSender, TransportError};
use courier_types::{encode_request, CodecError, CorrelationId, RequestEnvelope};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors an `invoke` call can surface to its caller.
///
/// The kinds stay distinguishable so an HTTP layer can map them (e.g.
/// `Timeout` to 504, `Operation` to the operation's own error shape).
#[derive(Debug, Error)]
pub enum RpcError {
    /// No reply arrived within the caller's deadline. The registry entry
    /// has been expired; a late reply will be discarded harmlessly.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The remote side answered with a well-formed failure response.
    #[error("operation failed: {0}")]
    Operation(String),

    /// The request could not be handed to the broker.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request envelope could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Correlation id collision - a programming error in id generation.
    #[error("duplicate correlation id {0}")]
    DuplicateCorrelationId(CorrelationId),

    /// The waiter was dropped before a reply arrived, e.g. the registry
    /// was swept or the service is shutting down.
    #[error("waiter closed before a reply arrived")]
    WaiterClosed,
}

/// Caller-side client for one logical service.
///
/// Combines the injected registry with the queue-send primitive. Clone is
/// cheap; all state lives behind `Arc`s, and concurrent `invoke` calls
/// from many tasks each own an independent waiter.
#[derive(Clone)]
pub struct RpcClient {
    /// Registry shared with the response listener.
    pending: Arc<PendingRequestStore>,
    /// Outbound queue transport.
    sender: Arc<dyn QueueSender>,
    /// Request queue of the target service.
    request_queue: String,
    /// Timeout applied when the caller passes none.
    default_timeout: Duration,
}

impl RpcClient {
    /// Create a client over an injected registry and transport.
    pub fn new(
        pending: Arc<PendingRequestStore>,
        sender: Arc<dyn QueueSender>,
        request_queue: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            pending,
            sender,
            request_queue: request_queue.into(),
            default_timeout,
        }
    }

    /// Create a client from a service configuration.
    pub fn from_config(
        pending: Arc<PendingRequestStore>,
        sender: Arc<dyn QueueSender>,
        config: &courier_types::ServiceConfig,
    ) -> Self {
        Self::new(
            pending,
            sender,
            config.request_queue.clone(),
            config.default_timeout,
        )
    }

    /// Send `operation` with `payload` and block until the reply, an
    /// error, or the timeout - whichever comes first.
    ///
    /// The registry entry is removed exactly once on every path: by the
    /// listener on completion, or by this method on send failure and on
    /// timeout.
    ///
    /// # Errors
    ///
    /// See [`RpcError`]; `Timeout` and `Operation` are the two ordinary
    /// failure modes callers are expected to handle.
    pub async fn invoke(
        &self,
        operation: &str,
        payload: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, RpcError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let correlation_id = CorrelationId::new();

        // Register before send: the waiter must be visible to the
        // listener before the request can possibly be answered.
        let rx = self
            .pending
            .register(correlation_id, operation)
            .map_err(|RegistryError::DuplicateCorrelationId(id)| {
                RpcError::DuplicateCorrelationId(id)
            })?;

        let envelope = RequestEnvelope::new(correlation_id, operation, payload);
        let bytes = encode_request(&envelope)?;

        if let Err(e) = self.sender.send(&self.request_queue, bytes).await {
            // The request never left; drop the waiter.
            self.pending.expire(correlation_id);
            return Err(e.into());
        }

        debug!(
            correlation_id = %correlation_id,
            operation = operation,
            queue = %self.request_queue,
            "Sent request"
        );

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response.into_result().map_err(RpcError::Operation),
            Ok(Err(_)) => Err(RpcError::WaiterClosed),
            Err(_) => {
                self.pending.expire(correlation_id);
                Err(RpcError::Timeout(timeout))
            }
        }
    }

    /// Number of requests currently awaiting a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    /// The registry backing this client.
    #[must_use]
    pub fn registry(&self) -> Arc<PendingRequestStore> {
        self.pending.clone()
    }
}
