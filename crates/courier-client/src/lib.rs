//! # Courier Client - Blocking Calls over Fire-and-Forget Queues
//!
//! The caller side of the request/reply protocol. One `invoke()` call:
//!
//! ```text
//! caller ──► RpcClient::invoke()
//!               │ 1. generate CorrelationId
//!               │ 2. registry.register(id)      (happens-before send)
//!               │ 3. send request envelope ──────────► request queue
//!               │ 4. await waiter (bounded by timeout)
//!               ▼
//!          PendingRequestStore ◄── ResponseListener ◄── response queue
//! ```
//!
//! Registration strictly precedes the send, so a reply can never race
//! past an unregistered waiter. The timeout path and the completion path
//! both remove the registry entry; whichever runs second is a no-op. A
//! background sweep collects entries abandoned without either.
//!
//! This layer performs no retries: request delivery is not idempotent
//! (replaying a request can duplicate a side effect such as user
//! creation), so retry policy belongs to the caller.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod listener;
pub mod pending;

// Re-export main types
pub use client::{RpcClient, RpcError};
pub use listener::ResponseListener;
pub use pending::{sweep_task, PendingRequestStore, PendingStats, RegistryError};
