//! Cleartext X25519 public key exchange.
//!
//! Each side writes its 32-byte public key and reads the peer's. Neither key
//! is authenticated, so the resulting channel only resists passive
//! eavesdropping.

use netgiv_core::{EphemeralKeyPair, SharedKey, PUBLIC_KEY_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ChannelError, Result};

/// Run the key exchange on a fresh stream and derive the connection key.
///
/// Symmetric: client and server call the same function. A short read of the
/// peer key is an error, never a zero-padded key.
pub async fn exchange_keys<S>(stream: &mut S) -> Result<SharedKey>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let keypair = EphemeralKeyPair::generate();
    let own_public = keypair.public_bytes();

    stream.write_all(&own_public).await?;
    stream.flush().await?;

    let mut peer_public = [0u8; PUBLIC_KEY_SIZE];
    stream
        .read_exact(&mut peer_public)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ChannelError::HandshakeTruncated,
            _ => ChannelError::Io(e),
        })?;

    tracing::debug!(
        own = %fingerprint(&own_public),
        peer = %fingerprint(&peer_public),
        "Key exchange complete"
    );

    Ok(keypair.agree(&peer_public)?)
}

/// Short hex prefix of a public key for logs.
pub fn fingerprint(public: &[u8; PUBLIC_KEY_SIZE]) -> String {
    hex::encode(&public[..8])
}
