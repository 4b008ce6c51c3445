//! Codec-level errors.

use thiserror::Error;

/// Errors from envelope encoding and decoding.
///
/// A malformed request envelope is the one case in the protocol where no
/// reply is possible: without a correlation id there is nothing to answer
/// to. Dispatchers log and drop such messages; they are a data-corruption
/// bug upstream, not a normal failure mode.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes did not decode to a well-formed envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope decoded but its protocol version is not supported.
    #[error("unsupported protocol version {received} (supported: {supported})")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// The envelope could not be serialized.
    #[error("envelope serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}
