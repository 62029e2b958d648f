//! Encrypted byte channel over any async stream.

use netgiv_core::{FrameCodec, SharedKey};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ChannelError, Result};
use crate::handshake::exchange_keys;

/// Maximum wire bytes pulled from the stream per [`SecureChannel::read_chunk`].
pub const READ_CHUNK_SIZE: usize = 2048;

/// Plaintext produced by one read.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReadChunk {
    /// Plaintext of every frame completed by this read; may be empty.
    pub plaintext: Vec<u8>,
    /// The stream has ended and no partial frame is buffered.
    pub eof: bool,
}

/// Seals writes into frames and reassembles frames from arbitrary reads.
pub struct SecureChannel<S> {
    stream: S,
    codec: FrameCodec,
    eof: bool,
}

impl<S> SecureChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run the key exchange on `stream` and wrap it.
    pub async fn establish(mut stream: S) -> Result<Self> {
        let key = exchange_keys(&mut stream).await?;
        Ok(Self::new(stream, key))
    }

    /// Wrap a stream with an already agreed key.
    pub fn new(stream: S, key: SharedKey) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(key),
            eof: false,
        }
    }

    /// Encrypt and send plaintext. Each call uses fresh nonces.
    pub async fn write(&mut self, plaintext: &[u8]) -> Result<()> {
        let wire = self.codec.encode(plaintext)?;
        self.stream.write_all(&wire).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Pull one bounded read from the stream and return whatever plaintext
    /// it completed.
    ///
    /// End of stream with a partial frame still buffered is an error.
    pub async fn read_chunk(&mut self) -> Result<ReadChunk> {
        if self.eof {
            return Ok(ReadChunk {
                plaintext: Vec::new(),
                eof: true,
            });
        }

        let mut buf = [0u8; READ_CHUNK_SIZE];
        let n = self.stream.read(&mut buf).await?;

        if n == 0 {
            if self.codec.has_partial_frame() {
                return Err(ChannelError::TruncatedFrame {
                    buffered: self.codec.buffered(),
                });
            }
            self.eof = true;
            return Ok(ReadChunk {
                plaintext: Vec::new(),
                eof: true,
            });
        }

        let plaintext = self.codec.decode(&buf[..n])?;
        Ok(ReadChunk {
            plaintext,
            eof: false,
        })
    }

    /// Close our sending direction.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

impl<S> std::fmt::Debug for SecureChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel")
            .field("codec", &self.codec)
            .field("eof", &self.eof)
            .finish()
    }
}
