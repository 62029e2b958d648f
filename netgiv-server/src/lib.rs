//! # netgiv-server
//!
//! Relay server for netgiv, a private network clipboard.
//!
//! This crate implements a server that:
//! - Accepts TCP connections and runs an X25519 key exchange on each
//! - Authenticates every request with a shared token inside the encrypted
//!   channel
//! - Stores uploaded objects in temporary files, listed in an in-memory
//!   registry
//! - Serves exactly one operation (send, list, receive, burn) per connection
//!
//! ## Architecture
//!
//! ```text
//! client ──TCP──► Server::serve ──spawn──► Session ──► Registry (RwLock)
//!                                              │
//!                                              └─────► TempStore (netgiv_* files)
//! ```
//!
//! On shutdown every stored object is purged; nothing outlives the process.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod storage;

pub use config::{Config, ConfigError};
pub use error::{ProtocolError, ServerError, StorageError};
pub use registry::{Registry, StoredObject};
pub use server::{Server, ServerMetrics};
pub use session::Session;
pub use storage::{PendingObject, StorageHandle, TempStore};
