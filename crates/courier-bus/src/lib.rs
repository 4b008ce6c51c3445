//! # Courier Bus - Queue Transport for Request/Reply Messaging
//!
//! The protocol core needs exactly two primitives from a broker
//! integration: send bytes to a named queue, and consume bytes from a
//! named queue. This crate defines those seams and ships an in-process
//! implementation used by tests and single-process deployments.
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │  RPC Client  │                      │  Dispatcher  │
//! │              │  send("svc.req")     │              │
//! │              │ ──────┐              │              │
//! └──────────────┘       │              └──────────────┘
//!        ↑               ▼                      ↑
//!        │         ┌──────────────┐            │
//!        │         │  Queue Bus   │ ───────────┘
//!        └──────── │              │  subscribe("svc.req")
//!  subscribe(      └──────────────┘
//!   "svc.resp")
//! ```
//!
//! Delivery is point-to-point: each message lands with exactly one
//! consumer of its queue. No ordering is assumed across queues. Real
//! brokers provide at-least-once delivery; the in-memory bus happens to
//! deliver exactly once, which is strictly within that contract.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod memory;
pub mod transport;

// Re-export main types
pub use memory::InMemoryQueueBus;
pub use transport::{QueueSender, QueueSubscriber, QueueSubscription, TransportError};

/// Maximum messages buffered per queue before senders see backpressure.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
