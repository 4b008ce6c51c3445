//! Envelope codec: JSON bytes on the wire, validated envelope structs in
//! memory.
//!
//! Decoding rejects envelopes whose correlation id is missing/nil or whose
//! operation tag is empty. Payload contents are never inspected here.

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::errors::CodecError;
use crate::PROTOCOL_VERSION;

/// Encode a request envelope to wire bytes.
pub fn encode_request(envelope: &RequestEnvelope) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(envelope).map_err(CodecError::Serialize)
}

/// Decode a request envelope from wire bytes.
///
/// # Errors
///
/// - `CodecError::MalformedEnvelope` - bytes are not a valid envelope,
///   the correlation id is nil, or the operation is empty
/// - `CodecError::UnsupportedVersion` - envelope from a newer protocol
pub fn decode_request(bytes: &[u8]) -> Result<RequestEnvelope, CodecError> {
    let envelope: RequestEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::MalformedEnvelope(e.to_string()))?;

    check_version(envelope.version)?;

    if envelope.correlation_id.is_nil() {
        return Err(CodecError::MalformedEnvelope(
            "request has nil correlation id".into(),
        ));
    }
    if envelope.operation.is_empty() {
        return Err(CodecError::MalformedEnvelope(
            "request has empty operation".into(),
        ));
    }

    Ok(envelope)
}

/// Encode a response envelope to wire bytes.
pub fn encode_response(envelope: &ResponseEnvelope) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(envelope).map_err(CodecError::Serialize)
}

/// Decode a response envelope from wire bytes.
///
/// # Errors
///
/// - `CodecError::MalformedEnvelope` - bytes are not a valid envelope,
///   the correlation id is nil, or a failure carries no error message
/// - `CodecError::UnsupportedVersion` - envelope from a newer protocol
pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, CodecError> {
    let envelope: ResponseEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::MalformedEnvelope(e.to_string()))?;

    check_version(envelope.version)?;

    if envelope.correlation_id.is_nil() {
        return Err(CodecError::MalformedEnvelope(
            "response has nil correlation id".into(),
        ));
    }
    if !envelope.success && envelope.error.is_none() {
        return Err(CodecError::MalformedEnvelope(
            "failure response without error message".into(),
        ));
    }
    if envelope.success && envelope.error.is_some() {
        return Err(CodecError::MalformedEnvelope(
            "success response carrying an error message".into(),
        ));
    }

    Ok(envelope)
}

fn check_version(version: u16) -> Result<(), CodecError> {
    if version != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion {
            received: version,
            supported: PROTOCOL_VERSION,
        });
    }
    Ok(())
}
