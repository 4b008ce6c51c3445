//! Transport seams the protocol core requires from a broker integration.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from queue transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The queue exists but no consumer can ever receive from it again.
    #[error("queue {0:?} is closed")]
    QueueClosed(String),

    /// The message could not be handed to the broker.
    #[error("send to queue {queue:?} failed: {reason}")]
    SendFailed { queue: String, reason: String },
}

/// Sending side of a queue transport.
///
/// Fire-and-forget: a successful return means the broker accepted the
/// message, not that anyone processed it.
#[async_trait]
pub trait QueueSender: Send + Sync {
    /// Send raw bytes to a named queue.
    async fn send(&self, queue: &str, bytes: Vec<u8>) -> Result<(), TransportError>;
}

/// Consuming side of a queue transport.
pub trait QueueSubscriber: Send + Sync {
    /// Attach a consumer to a named queue.
    ///
    /// Each queue supports one active consumer; messages are delivered to
    /// it in arrival order for that queue only.
    fn subscribe(&self, queue: &str) -> Box<dyn QueueSubscription>;
}

/// An active consumer of one queue.
#[async_trait]
pub trait QueueSubscription: Send {
    /// Receive the next message.
    ///
    /// Returns `None` when the queue is closed and fully drained; a
    /// consumer loop treats that as shutdown.
    async fn recv(&mut self) -> Option<Vec<u8>>;
}
