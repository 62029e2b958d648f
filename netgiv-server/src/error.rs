//! Error types for netgiv-server.

use netgiv_channel::ChannelError;
use std::path::PathBuf;

/// Main error type for netgiv-server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Could not bind the listening socket.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The configured address.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A file operation on an object failed.
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        /// What was being done.
        op: &'static str,
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Per-connection protocol errors. None of these affect other connections.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Channel failure: I/O, decryption, truncation or a malformed message.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The peer did not deliver in time.
    #[error("timed out after {secs}s waiting for {waiting_for}")]
    Timeout {
        /// What the session was waiting for.
        waiting_for: String,
        /// The deadline in seconds.
        secs: u64,
    },

    /// The client sent more than the configured object size limit.
    #[error("object too large: more than {limit} bytes")]
    ObjectTooLarge {
        /// Maximum allowed size.
        limit: u64,
    },

    /// Reading or writing an object failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The registry was purged while the object was still arriving.
    #[error("server is shutting down")]
    ShuttingDown,
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
