//! Typed protocol messages over a [`SecureChannel`].
//!
//! Each message is one record on the plaintext stream:
//! ```text
//! +----------------+----------------------------+
//! | LENGTH (4B BE) | MessagePack body           |
//! +----------------+----------------------------+
//! ```
//! Records carry no type tag. The caller names the type it expects at each
//! protocol step and a mismatch surfaces as a decode error.

use netgiv_types::{ProtocolMessage, WireError, MAX_MESSAGE_SIZE};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{ChannelError, Result};
use crate::secure::SecureChannel;

const RECORD_PREFIX_SIZE: usize = 4;

/// Sends and receives protocol messages in protocol order.
#[derive(Debug)]
pub struct MessageCodec<S> {
    channel: SecureChannel<S>,
    /// Plaintext received but not yet consumed as a record.
    inbox: Vec<u8>,
}

impl<S> MessageCodec<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established channel.
    pub fn new(channel: SecureChannel<S>) -> Self {
        Self {
            channel,
            inbox: Vec::new(),
        }
    }

    /// Run the key exchange on `stream` and wrap the resulting channel.
    pub async fn establish(stream: S) -> Result<Self> {
        Ok(Self::new(SecureChannel::establish(stream).await?))
    }

    /// Encode and send one message.
    pub async fn send<M: ProtocolMessage>(&mut self, message: &M) -> Result<()> {
        let body = message.to_bytes()?;
        if body.len() > MAX_MESSAGE_SIZE {
            return Err(WireError::TooLarge {
                size: body.len(),
                limit: MAX_MESSAGE_SIZE,
            }
            .into());
        }

        let mut record = Vec::with_capacity(RECORD_PREFIX_SIZE + body.len());
        record.extend_from_slice(&(body.len() as u32).to_be_bytes());
        record.extend_from_slice(&body);

        tracing::trace!(kind = %M::KIND, len = body.len(), "Sending message");
        self.channel.write(&record).await
    }

    /// Receive the next message, decoded as `M`.
    ///
    /// Returns `Ok(None)` if the peer closed the stream cleanly on a record
    /// boundary. A close in the middle of a record is an error.
    pub async fn recv<M: ProtocolMessage>(&mut self) -> Result<Option<M>> {
        loop {
            if let Some(body) = self.take_record()? {
                tracing::trace!(kind = %M::KIND, len = body.len(), "Received message");
                return Ok(Some(M::from_bytes(&body)?));
            }

            let chunk = self.channel.read_chunk().await?;
            self.inbox.extend_from_slice(&chunk.plaintext);

            if chunk.eof {
                if let Some(body) = self.take_record()? {
                    return Ok(Some(M::from_bytes(&body)?));
                }
                if self.inbox.is_empty() {
                    return Ok(None);
                }
                return Err(ChannelError::UnexpectedEnd { expected: M::KIND });
            }
        }
    }

    /// Receive the next message; end of stream is an error.
    pub async fn expect<M: ProtocolMessage>(&mut self) -> Result<M> {
        self.recv::<M>()
            .await?
            .ok_or(ChannelError::UnexpectedEnd { expected: M::KIND })
    }

    /// Close our sending direction so the peer sees end of stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.channel.shutdown().await
    }

    fn take_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.inbox.len() < RECORD_PREFIX_SIZE {
            return Ok(None);
        }

        let len = u32::from_be_bytes([self.inbox[0], self.inbox[1], self.inbox[2], self.inbox[3]])
            as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(ChannelError::MessageTooLarge {
                size: len,
                limit: MAX_MESSAGE_SIZE,
            });
        }
        if self.inbox.len() < RECORD_PREFIX_SIZE + len {
            return Ok(None);
        }

        let body = self.inbox[RECORD_PREFIX_SIZE..RECORD_PREFIX_SIZE + len].to_vec();
        self.inbox.drain(..RECORD_PREFIX_SIZE + len);
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netgiv_core::{SharedKey, KEY_SIZE};
    use netgiv_types::{
        ListEntry, ListResponse, MessageKind, ObjectId, OperationType, SendDataNext,
        SendDataStart, StartRequest, StartResponse, StartStatus, PROTOCOL_VERSION,
    };
    use tokio::io::DuplexStream;

    fn pair(capacity: usize) -> (MessageCodec<DuplexStream>, MessageCodec<DuplexStream>) {
        let (a, b) = tokio::io::duplex(capacity);
        let key = [0x24; KEY_SIZE];
        (
            MessageCodec::new(SecureChannel::new(a, SharedKey::from_bytes(key))),
            MessageCodec::new(SecureChannel::new(b, SharedKey::from_bytes(key))),
        )
    }

    fn start() -> StartRequest {
        StartRequest {
            operation: OperationType::Send,
            client_name: "test".into(),
            protocol_version: PROTOCOL_VERSION.into(),
            auth_token: "token".into(),
        }
    }

    #[tokio::test]
    async fn messages_arrive_in_order() {
        let (mut client, mut server) = pair(64 * 1024);

        client.send(&start()).await.unwrap();
        client
            .send(&SendDataStart {
                filename: "notes.txt".into(),
                total_size: 0,
            })
            .await
            .unwrap();
        client
            .send(&SendDataNext {
                data: b"hello".to_vec(),
                last: true,
            })
            .await
            .unwrap();

        assert_eq!(server.expect::<StartRequest>().await.unwrap(), start());
        assert_eq!(
            server.expect::<SendDataStart>().await.unwrap().filename,
            "notes.txt"
        );
        let chunk = server.expect::<SendDataNext>().await.unwrap();
        assert_eq!(chunk.data, b"hello");
        assert!(chunk.last);
    }

    #[tokio::test]
    async fn over_real_handshake() {
        let (a, b) = tokio::io::duplex(4096);
        let (client, server) = tokio::join!(MessageCodec::establish(a), MessageCodec::establish(b));
        let (mut client, mut server) = (client.unwrap(), server.unwrap());

        server
            .send(&StartResponse {
                status: StartStatus::BadAuthToken,
            })
            .await
            .unwrap();

        let response = client.expect::<StartResponse>().await.unwrap();
        assert_eq!(response.status, StartStatus::BadAuthToken);
    }

    #[tokio::test]
    async fn wrong_expected_type_is_a_decode_error() {
        let (mut client, mut server) = pair(4096);
        client.send(&ListResponse { count: 2 }).await.unwrap();

        let err = server.expect::<ListEntry>().await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Wire(WireError::Deserialization {
                expected: MessageKind::ListEntry,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn clean_close_is_none() {
        let (mut client, mut server) = pair(4096);
        client.shutdown().await.unwrap();

        assert!(server.recv::<StartRequest>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_where_message_required_is_unexpected_end() {
        let (mut client, mut server) = pair(4096);
        client.shutdown().await.unwrap();

        let err = server.expect::<SendDataNext>().await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::UnexpectedEnd {
                expected: MessageKind::SendDataNext
            }
        ));
    }

    #[tokio::test]
    async fn close_mid_record_is_unexpected_end() {
        let (a, b) = tokio::io::duplex(4096);
        let key = [0x24; KEY_SIZE];
        let mut raw = SecureChannel::new(a, SharedKey::from_bytes(key));
        let mut server = MessageCodec::new(SecureChannel::new(b, SharedKey::from_bytes(key)));

        // Prefix promises 100 bytes, only 3 follow.
        raw.write(&[0, 0, 0, 100, 1, 2, 3]).await.unwrap();
        raw.shutdown().await.unwrap();

        let err = server.recv::<StartRequest>().await.unwrap_err();
        assert!(matches!(err, ChannelError::UnexpectedEnd { .. }));
    }

    #[tokio::test]
    async fn oversized_declared_length_is_rejected() {
        let (a, b) = tokio::io::duplex(4096);
        let key = [0x24; KEY_SIZE];
        let mut raw = SecureChannel::new(a, SharedKey::from_bytes(key));
        let mut server = MessageCodec::new(SecureChannel::new(b, SharedKey::from_bytes(key)));

        let declared = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
        raw.write(&declared).await.unwrap();

        let err = server.recv::<StartRequest>().await.unwrap_err();
        assert!(matches!(err, ChannelError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn large_chunk_spans_many_frames_and_reads() {
        let (mut client, mut server) = pair(1024);
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 256) as u8).collect();
        let message = SendDataNext {
            data: data.clone(),
            last: false,
        };

        let (sent, received) = tokio::join!(client.send(&message), server.expect::<SendDataNext>());
        sent.unwrap();
        assert_eq!(received.unwrap().data, data);
    }

    #[tokio::test]
    async fn ids_survive_the_codec() {
        let (mut client, mut server) = pair(4096);
        let entry = ListEntry {
            id: ObjectId::new(9),
            filename: String::new(),
            size: 3,
            kind: "text/plain".into(),
            created_at: 1,
        };
        client.send(&entry).await.unwrap();

        assert_eq!(server.expect::<ListEntry>().await.unwrap(), entry);
    }
}
