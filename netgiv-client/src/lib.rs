//! # netgiv-client
//!
//! Client library for netgiv, a private network clipboard.
//!
//! Every operation opens its own connection: key exchange, StartRequest
//! carrying the auth token, then the operation's messages.
//!
//! ## Example
//!
//! ```ignore
//! use netgiv_client::{Client, ClientConfig};
//! use netgiv_types::ObjectId;
//!
//! let client = Client::new(ClientConfig::new("clipboard.lan:4512", token));
//!
//! let receipt = client.copy("notes.txt", file).await?;
//! let entries = client.list().await?;
//! client.paste(ObjectId::LATEST, tokio::io::stdout()).await?;
//! client.burn(receipt.id).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;

pub use client::{
    Client, ClientConfig, ClientDriver, ReceiveInfo, SendReceipt, DEFAULT_CHUNK_SIZE,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use error::{ClientError, Result};
