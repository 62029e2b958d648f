//! # netgiv-core
//!
//! Pure logic for netgiv (no I/O, instant tests).
//!
//! This crate implements the cryptography, framing, and state machines of the
//! protocol without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects (apart from drawing randomness for keys and nonces):
//! - [`crypto`] turns an X25519 exchange into a per-connection [`SharedKey`]
//! - [`frame`] seals plaintext into wire frames and reassembles frames from
//!   arbitrarily split byte slices
//! - [`state`] is the server session state machine
//! - [`kind`] classifies the first chunk of an upload
//!
//! The actual I/O (sockets, files) is performed by `netgiv-channel` and
//! `netgiv-server`, which feed bytes and events into these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crypto;
pub mod frame;
pub mod kind;
pub mod state;

pub use crypto::{
    CryptoError, EphemeralKeyPair, SharedKey, KEY_SIZE, NONCE_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE,
};
pub use frame::{
    FrameCodec, FrameError, FRAME_HEADER_SIZE, LENGTH_PREFIX_SIZE, MAX_CIPHERTEXT_LEN,
    MAX_FRAME_PLAINTEXT,
};
pub use kind::{detect_kind, TEXT_KIND, UNKNOWN_KIND};
pub use state::{verdict, Action, CloseReason, Event, SessionState};
