//! Protocol encode/decode errors.

use thiserror::Error;

/// Errors raised while encoding or decoding wire envelopes.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// An outbound request could not be serialized.
    #[error("cannot encode {kind} request: {source}")]
    Encode {
        /// Wire kind of the request.
        kind: &'static str,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// An inbound frame was not a response envelope.
    #[error("malformed response envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// A response body did not match the shape its kind requires.
    #[error("malformed {kind} body: {source}")]
    Body {
        /// Wire kind of the response.
        kind: String,
        /// Underlying deserializer error.
        #[source]
        source: serde_json::Error,
    },
}
