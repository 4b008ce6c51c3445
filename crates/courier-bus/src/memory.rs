//! In-process queue bus.
//!
//! Uses one bounded `tokio::sync::mpsc` channel per named queue for
//! point-to-point semantics. Suitable for tests and single-process
//! deployments; distributed deployments implement the transport seams
//! over a real broker instead.

use crate::transport::{QueueSender, QueueSubscriber, QueueSubscription, TransportError};
use crate::DEFAULT_QUEUE_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One named queue: the producer handle, plus the consumer handle until a
/// subscriber claims it.
struct QueueState {
    sender: mpsc::Sender<Vec<u8>>,
    receiver: Option<mpsc::Receiver<Vec<u8>>>,
}

/// In-memory implementation of the queue transport.
///
/// Queues are created lazily on first send or subscribe, so registration
/// order between producers and consumers does not matter: messages sent
/// before the consumer attaches are buffered up to the queue capacity.
pub struct InMemoryQueueBus {
    /// Named queues.
    queues: RwLock<HashMap<String, QueueState>>,

    /// Channel capacity per queue.
    capacity: usize,

    /// Total messages accepted across all queues.
    messages_sent: AtomicU64,
}

impl InMemoryQueueBus {
    /// Create a bus with the default per-queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a bus with a specific per-queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity,
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Number of queues created so far.
    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.queues.read().len()
    }

    /// Total messages accepted across all queues.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Per-queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the producer handle for a queue, creating the queue if needed.
    fn producer(&self, queue: &str) -> mpsc::Sender<Vec<u8>> {
        if let Some(state) = self.queues.read().get(queue) {
            return state.sender.clone();
        }

        let mut queues = self.queues.write();
        let state = queues.entry(queue.to_string()).or_insert_with(|| {
            debug!(queue = queue, "Queue created");
            let (tx, rx) = mpsc::channel(self.capacity);
            QueueState {
                sender: tx,
                receiver: Some(rx),
            }
        });
        state.sender.clone()
    }
}

impl Default for InMemoryQueueBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueSender for InMemoryQueueBus {
    async fn send(&self, queue: &str, bytes: Vec<u8>) -> Result<(), TransportError> {
        // Clone the handle before awaiting; the queue map lock is never
        // held across a suspension point.
        let sender = self.producer(queue);

        sender
            .send(bytes)
            .await
            .map_err(|_| TransportError::QueueClosed(queue.to_string()))?;

        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl QueueSubscriber for InMemoryQueueBus {
    fn subscribe(&self, queue: &str) -> Box<dyn QueueSubscription> {
        let mut queues = self.queues.write();
        let state = queues.entry(queue.to_string()).or_insert_with(|| {
            debug!(queue = queue, "Queue created");
            let (tx, rx) = mpsc::channel(self.capacity);
            QueueState {
                sender: tx,
                receiver: Some(rx),
            }
        });

        match state.receiver.take() {
            Some(receiver) => Box::new(MemorySubscription { receiver }),
            None => {
                // The queue's single consumer slot is already claimed. The
                // replacement subscription reads as immediately closed.
                warn!(queue = queue, "Queue already has a consumer");
                let (tx, rx) = mpsc::channel(1);
                drop(tx);
                Box::new(MemorySubscription { receiver: rx })
            }
        }
    }
}

/// Consumer handle for one in-memory queue.
struct MemorySubscription {
    receiver: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl QueueSubscription for MemorySubscription {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}
