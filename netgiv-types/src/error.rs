//! Error types for netgiv wire encoding.

use thiserror::Error;

use crate::MessageKind;

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// MessagePack serialization failed
    #[error("serialization of {kind} failed: {source}")]
    Serialization {
        /// The message being encoded.
        kind: MessageKind,
        /// Underlying encoder error.
        #[source]
        source: rmp_serde::encode::Error,
    },

    /// MessagePack deserialization failed, usually because the peer sent a
    /// different message than the protocol step expects.
    #[error("malformed message: expected {expected}: {source}")]
    Deserialization {
        /// The message the protocol step expected.
        expected: MessageKind,
        /// Underlying decoder error.
        #[source]
        source: rmp_serde::decode::Error,
    },

    /// Record exceeds the protocol maximum
    #[error("message too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Declared size of the record.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },
}
