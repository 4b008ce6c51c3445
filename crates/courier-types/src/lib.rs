//! # Courier Types - Wire Types for Request/Reply over Queues
//!
//! Leaf crate shared by the client and dispatcher sides of the protocol.
//!
//! ## Envelope Shapes
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ RequestEnvelope                            │
//! │   correlation_id : CorrelationId (uuid v7) │
//! │   operation      : String                  │
//! │   payload        : serde_json::Value       │
//! └────────────────────────────────────────────┘
//! ┌────────────────────────────────────────────┐
//! │ ResponseEnvelope                           │
//! │   correlation_id : CorrelationId           │
//! │   success        : bool                    │
//! │   data           : present iff success     │
//! │   error          : present iff !success    │
//! └────────────────────────────────────────────┘
//! ```
//!
//! The payload is opaque to every layer below the operation handler:
//! the codec carries it verbatim, and payload-level decode problems are
//! reported through the response envelope's `error` field, never as a
//! protocol error.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod correlation;
pub mod envelope;
pub mod errors;

// Re-export main types
pub use codec::{decode_request, decode_response, encode_request, encode_response};
pub use config::{ConfigError, ServiceConfig};
pub use correlation::CorrelationId;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use errors::CodecError;

/// Protocol version carried in envelopes for forward compatibility.
pub const PROTOCOL_VERSION: u16 = 1;
