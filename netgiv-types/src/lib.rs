//! # netgiv-types
//!
//! Wire message types for the netgiv clipboard relay protocol.
//!
//! This crate provides the foundational types used across all netgiv crates:
//! - [`ObjectId`] - Server-assigned identity of a stored object
//! - [`ProtocolMessage`] - The closed catalog of logical messages (StartRequest, ListEntry, etc.)
//! - [`WireError`] - Encoding and decoding errors
//!
//! There is no type discriminator on the wire. Both peers decode messages in
//! the order dictated by the active operation, and each message type carries a
//! [`MessageKind`] label so a mismatch surfaces as an "expected X" decode error.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;

pub use error::WireError;
pub use ids::ObjectId;
pub use messages::{
    BurnRequest, BurnResponse, ListEntry, ListResponse, LookupStatus, MessageKind, OperationType,
    ProtocolMessage, ReceiveDataNext, ReceiveRequest, ReceiveResponse, SendDataNext,
    SendDataResponse, SendDataStart, StartRequest, StartResponse, StartStatus, MAX_MESSAGE_SIZE,
    PROTOCOL_VERSION,
};
