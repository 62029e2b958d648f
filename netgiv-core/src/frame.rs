//! Encrypted wire framing and stream reassembly.
//!
//! Wire format:
//! ```text
//! +-------------+------------------+----------------------------+
//! | NONCE (24B) | LENGTH (2B BE)   | CIPHERTEXT (LENGTH bytes)  |
//! +-------------+------------------+----------------------------+
//! ```
//!
//! Frames carry plaintext of a continuous byte stream; a frame boundary says
//! nothing about message boundaries. [`FrameCodec::decode`] accepts whatever
//! the socket delivered (less than a frame, exactly one, several) and returns
//! the plaintext of every complete frame, keeping the remainder buffered.

use thiserror::Error;

use crate::crypto::{CryptoError, SharedKey, NONCE_SIZE, TAG_SIZE};

/// Length prefix size.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Nonce plus length prefix.
pub const FRAME_HEADER_SIZE: usize = NONCE_SIZE + LENGTH_PREFIX_SIZE;

/// Largest ciphertext the length prefix can describe.
pub const MAX_CIPHERTEXT_LEN: usize = u16::MAX as usize;

/// Largest plaintext that fits in one frame.
pub const MAX_FRAME_PLAINTEXT: usize = MAX_CIPHERTEXT_LEN - TAG_SIZE;

/// Framing errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A frame failed authentication. The channel must be torn down.
    #[error("frame decryption failed: authentication error")]
    Decryption,

    /// A frame declared a ciphertext shorter than the authentication tag.
    #[error("frame declares {len} ciphertext bytes, shorter than the {TAG_SIZE}-byte tag")]
    Runt {
        /// Declared ciphertext length.
        len: usize,
    },

    /// An earlier frame failed authentication.
    #[error("frame codec poisoned by an earlier authentication failure")]
    Poisoned,

    /// Sealing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Seals outgoing plaintext and reassembles incoming frames for one connection.
#[derive(Debug)]
pub struct FrameCodec {
    key: SharedKey,
    /// Wire bytes not yet forming a complete frame.
    buffer: Vec<u8>,
    poisoned: bool,
}

impl FrameCodec {
    /// Create a codec around the connection's shared key.
    pub fn new(key: SharedKey) -> Self {
        Self {
            key,
            buffer: Vec::new(),
            poisoned: false,
        }
    }

    /// Seal plaintext into one or more frames.
    ///
    /// Empty plaintext still produces one (tag-only) frame. Plaintext longer
    /// than [`MAX_FRAME_PLAINTEXT`] is split.
    pub fn encode(&self, plaintext: &[u8]) -> Result<Vec<u8>, FrameError> {
        let frame_count = plaintext.len().div_ceil(MAX_FRAME_PLAINTEXT).max(1);
        let mut wire =
            Vec::with_capacity(plaintext.len() + frame_count * (FRAME_HEADER_SIZE + TAG_SIZE));

        let mut push_frame = |chunk: &[u8]| -> Result<(), FrameError> {
            let (nonce, ciphertext) = self.key.seal(chunk)?;
            wire.extend_from_slice(&nonce);
            wire.extend_from_slice(&(ciphertext.len() as u16).to_be_bytes());
            wire.extend_from_slice(&ciphertext);
            Ok(())
        };

        if plaintext.is_empty() {
            push_frame(&[])?;
        } else {
            for chunk in plaintext.chunks(MAX_FRAME_PLAINTEXT) {
                push_frame(chunk)?;
            }
        }

        Ok(wire)
    }

    /// Feed wire bytes and return the plaintext of every frame completed.
    ///
    /// The returned plaintext may be empty (only a partial frame arrived) or
    /// span several frames. An authentication failure poisons the codec:
    /// this and every later call fail.
    pub fn decode(&mut self, wire: &[u8]) -> Result<Vec<u8>, FrameError> {
        if self.poisoned {
            return Err(FrameError::Poisoned);
        }
        self.buffer.extend_from_slice(wire);

        let mut plaintext = Vec::new();
        let mut consumed = 0;

        loop {
            let rest = &self.buffer[consumed..];
            if rest.len() < FRAME_HEADER_SIZE {
                break;
            }

            let len = u16::from_be_bytes([rest[NONCE_SIZE], rest[NONCE_SIZE + 1]]) as usize;
            if rest.len() < FRAME_HEADER_SIZE + len {
                break;
            }
            if len < TAG_SIZE {
                self.poisoned = true;
                return Err(FrameError::Runt { len });
            }

            let mut nonce = [0u8; NONCE_SIZE];
            nonce.copy_from_slice(&rest[..NONCE_SIZE]);
            let ciphertext = &rest[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + len];

            match self.key.open(&nonce, ciphertext) {
                Ok(opened) => plaintext.extend_from_slice(&opened),
                Err(_) => {
                    self.poisoned = true;
                    return Err(FrameError::Decryption);
                }
            }

            consumed += FRAME_HEADER_SIZE + len;
        }

        self.buffer.drain(..consumed);
        Ok(plaintext)
    }

    /// Whether wire bytes of an incomplete frame are buffered.
    pub fn has_partial_frame(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Number of buffered wire bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
