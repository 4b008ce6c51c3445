//! # Courier Test Suite
//!
//! Unified test crate covering the request/reply protocol end to end:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── request_reply.rs  # Happy path, unknown ops, handler failures, timeouts
//!     ├── concurrency.rs    # Parallel invokes, correlation uniqueness, worker pool
//!     └── resilience.rs     # Spurious replies, abandoned waiters, sweep
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p courier-tests
//! cargo test -p courier-tests integration::concurrency::
//! ```

#![allow(dead_code)]

pub mod integration;

/// Opt-in tracing for test debugging; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
