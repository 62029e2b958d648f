//! Protocol messages for netgiv.
//!
//! Every message is a self-contained MessagePack record with named fields.
//! Structs deny unknown fields, so decoding a record as the wrong message
//! type fails instead of yielding a half-filled value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ObjectId, WireError};

/// Protocol version string carried in every StartRequest.
pub const PROTOCOL_VERSION: &str = "v1.0";

/// Maximum encoded size of a single message record (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Label for each message type, used in logs and decode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Client opens a session
    StartRequest,
    /// Server verdict on version and token
    StartResponse,
    /// Metadata for an incoming object
    SendDataStart,
    /// One chunk of an incoming object
    SendDataNext,
    /// Server acknowledgement of a stored object
    SendDataResponse,
    /// Number of list entries to follow
    ListResponse,
    /// One stored object in a listing
    ListEntry,
    /// Request to fetch an object
    ReceiveRequest,
    /// Lookup result and metadata for a fetch
    ReceiveResponse,
    /// One chunk of a fetched object
    ReceiveDataNext,
    /// Request to delete an object
    BurnRequest,
    /// Lookup result for a delete
    BurnResponse,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A message in the closed protocol catalog.
///
/// The encoding carries no type tag; [`KIND`](Self::KIND) only exists on the
/// Rust side so the decoder can say what it was expecting.
pub trait ProtocolMessage: Serialize + DeserializeOwned + Send + Sync {
    /// The label for this message type.
    const KIND: MessageKind;

    /// Serialize to MessagePack bytes.
    fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(|source| WireError::Serialization {
            kind: Self::KIND,
            source,
        })
    }

    /// Deserialize from MessagePack bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(|source| WireError::Deserialization {
            expected: Self::KIND,
            source,
        })
    }
}

macro_rules! protocol_message {
    ($($ty:ident),* $(,)?) => {
        $(
            impl ProtocolMessage for $ty {
                const KIND: MessageKind = MessageKind::$ty;
            }
        )*
    };
}

protocol_message!(
    StartRequest,
    StartResponse,
    SendDataStart,
    SendDataNext,
    SendDataResponse,
    ListResponse,
    ListEntry,
    ReceiveRequest,
    ReceiveResponse,
    ReceiveDataNext,
    BurnRequest,
    BurnResponse,
);

/// The operation a client asks for in its StartRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Store stdin on the server (copy)
    Send,
    /// List stored objects
    List,
    /// Fetch a stored object (paste)
    Receive,
    /// Delete a stored object
    Burn,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::Send => "send",
            OperationType::List => "list",
            OperationType::Receive => "receive",
            OperationType::Burn => "burn",
        };
        f.write_str(name)
    }
}

/// First message after the key exchange, sent by the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartRequest {
    /// Requested operation
    pub operation: OperationType,
    /// Free-form client name (logged only)
    pub client_name: String,
    /// Must equal the server's protocol version exactly
    pub protocol_version: String,
    /// Shared secret configured on both ends
    pub auth_token: String,
}

impl fmt::Debug for StartRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartRequest")
            .field("operation", &self.operation)
            .field("client_name", &self.client_name)
            .field("protocol_version", &self.protocol_version)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// Server verdict on a StartRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartStatus {
    /// Session accepted, the operation flow follows
    Ok,
    /// Protocol version mismatch; the server closes the connection
    WrongProtocol,
    /// Auth token mismatch; the server closes the connection
    BadAuthToken,
}

/// Server response to a StartRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartResponse {
    /// The verdict
    pub status: StartStatus,
}

/// Metadata announcing an incoming object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendDataStart {
    /// Original file name, empty when sending from a pipe
    pub filename: String,
    /// Unused; clients send 0 because the size is not known up front
    pub total_size: u32,
}

/// One chunk of an object being sent to the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendDataNext {
    /// Chunk bytes
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// Set on the final chunk (which may be empty)
    pub last: bool,
}

impl fmt::Debug for SendDataNext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendDataNext")
            .field("data", &format!("[{} bytes]", self.data.len()))
            .field("last", &self.last)
            .finish()
    }
}

/// Acknowledgement that an object was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendDataResponse {
    /// Id assigned by the server
    pub id: ObjectId,
    /// Stored size in bytes
    pub size: u32,
    /// Detected content kind
    pub kind: String,
}

/// Header of a listing: how many entries follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListResponse {
    /// Number of ListEntry records that follow
    pub count: u32,
}

/// One stored object in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEntry {
    /// Object id
    pub id: ObjectId,
    /// Original file name, may be empty
    pub filename: String,
    /// Size in bytes
    pub size: u32,
    /// Detected content kind
    pub kind: String,
    /// Unix timestamp (seconds) when the object was stored
    pub created_at: u64,
}

/// Request to fetch an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiveRequest {
    /// Object to fetch, [`ObjectId::LATEST`] for the most recent
    pub id: ObjectId,
}

/// Result of resolving a Receive or Burn target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupStatus {
    /// Target found
    Ok,
    /// No object with that id (or no objects at all for id 0)
    NotFound,
}

/// Response to a ReceiveRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiveResponse {
    /// Lookup result
    pub status: LookupStatus,
    /// Original file name (empty when not found)
    pub filename: String,
    /// Detected content kind (empty when not found)
    pub kind: String,
    /// Size in bytes (0 when not found)
    pub size: u32,
}

impl ReceiveResponse {
    /// A NotFound response with empty metadata.
    pub fn not_found() -> Self {
        Self {
            status: LookupStatus::NotFound,
            filename: String::new(),
            kind: String::new(),
            size: 0,
        }
    }
}

/// One chunk of a fetched object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiveDataNext {
    /// Chunk bytes
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// Set only on the final chunk
    pub last: bool,
}

impl fmt::Debug for ReceiveDataNext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveDataNext")
            .field("data", &format!("[{} bytes]", self.data.len()))
            .field("last", &self.last)
            .finish()
    }
}

/// Request to delete an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BurnRequest {
    /// Object to delete, [`ObjectId::LATEST`] for the most recent
    pub id: ObjectId,
}

/// Response to a BurnRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BurnResponse {
    /// Lookup result
    pub status: LookupStatus,
}
