//! Cryptographic primitives for netgiv.
//!
//! This module provides:
//! - Ephemeral X25519 key agreement, one keypair per connection
//! - HKDF-SHA256 derivation of the per-connection [`SharedKey`]
//! - XChaCha20-Poly1305 sealing with 192-bit random nonces
//!
//! # Security Notes
//!
//! - The exchanged public keys are not authenticated. The channel resists
//!   passive eavesdropping only; an active man-in-the-middle can substitute
//!   keys. The auth token sent inside the channel authenticates the request,
//!   not the endpoint.
//! - XChaCha20 uses 192-bit nonces (24 bytes), safe for random generation
//! - Key material is zeroized on drop and redacted in `Debug`

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use thiserror::Error;
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an X25519 public key on the wire.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Key size for XChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// HKDF info string binding derived keys to this protocol.
const KDF_INFO: &[u8] = b"netgiv-channel-v1";

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The peer's public key produced an all-zero shared secret.
    #[error("key agreement failed: peer sent a low-order public key")]
    NonContributory,

    /// The OS random source failed.
    #[error("random number generation failed: {0}")]
    Randomness(String),

    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Decryption failed (authentication error).
    #[error("decryption failed: authentication error")]
    DecryptionFailed,

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),
}

/// One side's ephemeral X25519 keypair.
///
/// Consumed by [`agree`](Self::agree), so a secret can never be used twice.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The public half, sent to the peer in cleartext.
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Combine with the peer's public key into the connection's [`SharedKey`].
    ///
    /// Both sides arrive at the same key regardless of who sent first: the
    /// HKDF salt is the two public keys in sorted order.
    pub fn agree(self, peer_public: &[u8; PUBLIC_KEY_SIZE]) -> Result<SharedKey, CryptoError> {
        let own_public = self.public_bytes();
        let shared = self.secret.diffie_hellman(&PublicKey::from(*peer_public));
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }

        let salt = transcript_salt(&own_public, peer_public);
        SharedKey::derive(shared.as_bytes(), &salt)
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public.as_bytes())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn transcript_salt(a: &[u8; PUBLIC_KEY_SIZE], b: &[u8; PUBLIC_KEY_SIZE]) -> [u8; 2 * PUBLIC_KEY_SIZE] {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut salt = [0u8; 2 * PUBLIC_KEY_SIZE];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(first);
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(second);
    salt
}

/// Symmetric key for one connection.
///
/// Holds a ready-to-use cipher so sealing and opening do not re-run the key
/// schedule per frame.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedKey {
    bytes: [u8; KEY_SIZE],
    #[zeroize(skip)]
    cipher: XChaCha20Poly1305,
}

impl SharedKey {
    fn derive(ikm: &[u8], salt: &[u8]) -> Result<Self, CryptoError> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), ikm);
        let mut bytes = [0u8; KEY_SIZE];
        hkdf.expand(KDF_INFO, &mut bytes)
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        let key = Self::from_bytes(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Build a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&bytes));
        Self { bytes, cipher }
    }

    /// Create a random key (for testing).
    pub fn random() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::Randomness(e.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Encrypt under a fresh random nonce.
    ///
    /// Returns (nonce, ciphertext); the ciphertext includes the 16-byte tag.
    pub fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>), CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::Randomness(e.to_string()))?;

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok((nonce, ciphertext))
    }

    /// Decrypt and verify.
    pub fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

// Don't leak keys in debug output
impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedKey([REDACTED])")
    }
}
