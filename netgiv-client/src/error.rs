//! Client errors.

use netgiv_channel::ChannelError;
use netgiv_types::{MessageKind, ObjectId, OperationType};
use thiserror::Error;

/// Errors surfaced to the user of the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server.
    #[error("could not connect to {address}: {source}")]
    Connect {
        /// Address dialled.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Connecting took longer than the configured timeout.
    #[error("timed out connecting to {address}")]
    ConnectTimeout {
        /// Address dialled.
        address: String,
    },

    /// The secure channel failed.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The server speaks a different protocol version.
    #[error("server rejected protocol version {version}")]
    WrongProtocol {
        /// Version this client sent.
        version: String,
    },

    /// The server rejected the auth token.
    #[error("server rejected the auth token")]
    BadAuthToken,

    /// No object matched.
    #[error("{}", not_found_message(.id))]
    NotFound {
        /// The requested id.
        id: ObjectId,
    },

    /// The server closed the connection in the middle of an operation.
    #[error("server closed the connection while waiting for {expected}")]
    UnexpectedEnd {
        /// The message the client expected.
        expected: MessageKind,
    },

    /// A received object did not match its announced size.
    #[error("received {received} bytes, server announced {announced}")]
    SizeMismatch {
        /// Size from the ReceiveResponse.
        announced: u32,
        /// Bytes actually received.
        received: u64,
    },

    /// The driver was established for another operation.
    #[error("connection was opened for {established}, not {requested}")]
    OperationMismatch {
        /// Operation named in the StartRequest.
        established: OperationType,
        /// Operation the caller tried to run.
        requested: OperationType,
    },

    /// Local input or output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn not_found_message(id: &ObjectId) -> String {
    if id.is_latest() {
        "nothing is stored on the server".to_string()
    } else {
        format!("no object with id {}", id)
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages() {
        assert_eq!(
            ClientError::NotFound { id: ObjectId::new(4) }.to_string(),
            "no object with id 4"
        );
        assert_eq!(
            ClientError::NotFound { id: ObjectId::LATEST }.to_string(),
            "nothing is stored on the server"
        );
    }

    #[test]
    fn auth_errors_are_readable() {
        assert_eq!(ClientError::BadAuthToken.to_string(), "server rejected the auth token");
        let err = ClientError::WrongProtocol {
            version: "v1.0".into(),
        };
        assert!(err.to_string().contains("v1.0"));
    }
}
