//! Pending Request Registry - the async-to-sync bridge.
//!
//! Maps correlation IDs to in-flight waiters. Safe for concurrent access
//! from many caller tasks and the response listener; no global lock
//! serializes unrelated calls.

use courier_types::{CorrelationId, ResponseEnvelope};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Errors from registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The correlation id is already registered. With a proper unique-id
    /// generator this never happens; it is a programming error in id
    /// generation, not a condition to retry.
    #[error("correlation id {0} is already registered")]
    DuplicateCorrelationId(CorrelationId),
}

/// A pending request waiting for its response.
struct PendingRequest {
    /// Single-assignment waiter slot.
    sender: oneshot::Sender<ResponseEnvelope>,
    /// When the entry was registered.
    created_at: Instant,
    /// Operation name (for logging).
    operation: String,
}

/// Statistics for the registry.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total waiters registered.
    pub total_registered: AtomicU64,
    /// Total waiters fulfilled by a matching response.
    pub total_completed: AtomicU64,
    /// Total entries expired by the caller-side timeout path.
    pub total_expired: AtomicU64,
    /// Total entries collected by the background sweep.
    pub total_swept: AtomicU64,
    /// Total late or unmatched responses discarded.
    pub total_unmatched: AtomicU64,
}

/// Concurrency-safe table of in-flight requests.
///
/// Ownership: the registry owns waiter slots. The RPC client is the only
/// writer of new entries; the response listener is the only writer that
/// fulfills them. Every path that removes an entry (`complete`, `expire`,
/// `sweep`) removes it exactly once; the second remover is a no-op.
///
/// The registry is explicitly constructed and injected, one per logical
/// service connection, so shutdown and drain stay local instead of
/// leaking into process-lifetime global state.
pub struct PendingRequestStore {
    /// Map of correlation ID to pending request.
    pending: DashMap<CorrelationId, PendingRequest>,
    /// Statistics.
    stats: Arc<PendingStats>,
}

impl PendingRequestStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Insert a new single-assignment waiter for `correlation_id`.
    ///
    /// The caller must complete registration before transmitting the
    /// request, so the listener can always find the entry; register then
    /// send, never the reverse.
    ///
    /// # Errors
    ///
    /// `RegistryError::DuplicateCorrelationId` if the id is already
    /// registered.
    pub fn register(
        &self,
        correlation_id: CorrelationId,
        operation: &str,
    ) -> Result<oneshot::Receiver<ResponseEnvelope>, RegistryError> {
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(correlation_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateCorrelationId(correlation_id));
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(PendingRequest {
                    sender: tx,
                    created_at: Instant::now(),
                    operation: operation.to_string(),
                });
            }
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            operation = operation,
            "Registered pending request"
        );

        Ok(rx)
    }

    /// Fulfill and remove the waiter for `correlation_id`.
    ///
    /// Returns true if a waiter was found and fulfilled. An absent entry
    /// means the response is late or unmatched (the caller may already
    /// have timed out); the response is discarded and logged, which is
    /// not an error for the registry.
    pub fn complete(&self, correlation_id: CorrelationId, response: ResponseEnvelope) -> bool {
        let Some((_, pending)) = self.pending.remove(&correlation_id) else {
            self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
            warn!(
                correlation_id = %correlation_id,
                "Discarding response for unknown or expired correlation id"
            );
            return false;
        };

        let waited = pending.created_at.elapsed();

        match pending.sender.send(response) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    waited_ms = waited.as_millis(),
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // Receiver already dropped; the caller gave up between the
                // map removal and this send.
                self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = pending.operation,
                    "Waiter dropped before completion"
                );
                false
            }
        }
    }

    /// Remove an entry without fulfilling it. Caller-side timeout path.
    ///
    /// Returns true if an entry was removed; false is the no-op case
    /// where the listener completed it first.
    pub fn expire(&self, correlation_id: CorrelationId) -> bool {
        if let Some((_, pending)) = self.pending.remove(&correlation_id) {
            self.stats.total_expired.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                operation = pending.operation,
                "Expired pending request"
            );
            true
        } else {
            false
        }
    }

    /// Remove and discard entries older than `max_age`.
    ///
    /// Defends against leaks when `expire` is never invoked, e.g. a
    /// caller task that died between register and its timeout firing.
    /// Returns the number of entries removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.pending.retain(|id, request| {
            let age = now.duration_since(request.created_at);
            if age > max_age {
                warn!(
                    correlation_id = %id,
                    operation = request.operation,
                    age_ms = age.as_millis(),
                    "Sweeping orphaned pending request"
                );
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.stats
                .total_swept
                .fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }

    /// Number of currently pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a correlation id is currently registered.
    #[must_use]
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Registry statistics.
    #[must_use]
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl Default for PendingRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task that periodically sweeps orphaned entries.
///
/// Runs regardless of whether any call is in flight; spawn it once per
/// registry. `max_age` must exceed the largest per-call timeout in use,
/// so only entries whose caller is already gone are collected.
pub async fn sweep_task(store: Arc<PendingRequestStore>, interval: Duration, max_age: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let removed = store.sweep(max_age);
        if removed > 0 {
            debug!(removed = removed, "Sweep collected orphaned requests");
        }
    }
}
