//! # netgiv-channel
//!
//! Async I/O half of the netgiv transport: the cleartext key exchange, the
//! encrypted [`SecureChannel`] and the typed [`MessageCodec`] on top of it.
//!
//! Works over any `AsyncRead + AsyncWrite` stream, so the same code serves
//! TCP connections and in-memory pipes in tests.
//!
//! ```ignore
//! let mut codec = MessageCodec::establish(tcp_stream).await?;
//! codec.send(&start_request).await?;
//! let response: StartResponse = codec.expect().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod handshake;
pub mod secure;

pub use codec::MessageCodec;
pub use error::{ChannelError, Result};
pub use handshake::{exchange_keys, fingerprint};
pub use secure::{ReadChunk, SecureChannel, READ_CHUNK_SIZE};
