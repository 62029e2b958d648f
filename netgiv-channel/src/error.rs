//! Error types for the secure channel.

use netgiv_core::{CryptoError, FrameError};
use netgiv_types::{MessageKind, WireError};
use thiserror::Error;

/// Errors raised while establishing or using a secure channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The underlying stream failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before sending its whole public key.
    #[error("handshake truncated: peer closed before sending its public key")]
    HandshakeTruncated,

    /// Key agreement was rejected.
    #[error("key agreement failed: {0}")]
    KeyAgreement(#[from] CryptoError),

    /// A frame failed to seal or open.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The stream ended in the middle of a frame.
    #[error("connection closed mid-frame ({buffered} bytes of an incomplete frame)")]
    TruncatedFrame {
        /// Wire bytes left over.
        buffered: usize,
    },

    /// The stream ended where a message was required.
    #[error("connection closed while waiting for {expected}")]
    UnexpectedEnd {
        /// The message the protocol step expected.
        expected: MessageKind,
    },

    /// The peer declared a record larger than the protocol allows.
    #[error("incoming message too large: {size} bytes (limit: {limit} bytes)")]
    MessageTooLarge {
        /// Declared record size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },

    /// Encoding or decoding a message failed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl ChannelError {
    /// Whether a frame failed authentication (tampering or wrong key).
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            ChannelError::Frame(FrameError::Decryption | FrameError::Runt { .. })
        )
    }

    /// Whether the peer went away (cleanly or not).
    pub fn is_disconnect(&self) -> bool {
        match self {
            ChannelError::HandshakeTruncated
            | ChannelError::TruncatedFrame { .. }
            | ChannelError::UnexpectedEnd { .. } => true,
            ChannelError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

/// Result type alias for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
