//! Request and response envelopes exchanged on queues.
//!
//! The envelope owns correlation and routing metadata; the payload schema
//! is owned by the operation, not by the envelope.

use crate::correlation::CorrelationId;
use crate::PROTOCOL_VERSION;
use serde::{Deserialize, Serialize};

/// Request envelope carried on a service's request queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Protocol version for forward compatibility.
    /// Checked by the codec before any other field is trusted.
    pub version: u16,

    /// Correlation ID for response matching.
    /// For requests: a newly generated UUID v7.
    pub correlation_id: CorrelationId,

    /// String tag identifying the handler on the dispatcher side.
    pub operation: String,

    /// Opaque operation payload.
    pub payload: serde_json::Value,
}

impl RequestEnvelope {
    /// Build a request envelope at the current protocol version.
    pub fn new(
        correlation_id: CorrelationId,
        operation: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            correlation_id,
            operation: operation.into(),
            payload,
        }
    }
}

/// Response envelope carried on a service's response queue.
///
/// Exactly one response envelope is produced per request envelope that
/// reached a dispatcher. `data` is present iff `success`; `error` is
/// present iff not. The constructors below are the only way this crate
/// builds responses, which keeps that invariant out of callers' hands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Correlation ID copied verbatim from the request.
    pub correlation_id: CorrelationId,

    /// Whether the operation succeeded.
    pub success: bool,

    /// Operation result, present iff `success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Human-readable failure reason, present iff not `success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a success response.
    pub fn success(correlation_id: CorrelationId, data: serde_json::Value) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            correlation_id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Build a failure response.
    pub fn failure(correlation_id: CorrelationId, error: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            correlation_id,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convert into the handler-level result the caller sees.
    ///
    /// A success with no `data` field decodes as JSON `null` (the two are
    /// indistinguishable on the wire for an opaque payload).
    pub fn into_result(self) -> Result<serde_json::Value, String> {
        if self.success {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(self.error.unwrap_or_default())
        }
    }
}
