//! # Courier Dispatch - The Callee Side of Request/Reply
//!
//! Consumes request envelopes from a request queue, routes them by
//! operation name, and guarantees a response envelope goes back with the
//! original correlation id - even when the handler fails or panics.
//!
//! ## Per-Message State Machine
//!
//! ```text
//! Received ──► Decoded ──► Dispatched ──► Handled ──► Replied
//!     │            │             │            │
//!     │ malformed  │ unknown op  │ handler    │ send failure
//!     ▼            ▼             ▼ error      ▼
//!   log+drop    failure       failure       log only
//!  (no id to    response      response    (caller timeout
//!   answer)                               is the backstop)
//! ```
//!
//! Handlers are pure `(payload) -> (data | error)` functions; they never
//! see correlation ids, so business logic stays independently testable.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod dispatcher;
pub mod handler;

// Re-export main types
pub use dispatcher::Dispatcher;
pub use handler::{FnHandler, HandlerError, OperationHandler, OperationTable};
