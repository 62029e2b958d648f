//! Client - the main interface for netgiv.
//!
//! [`Client`] dials the server once per operation. [`ClientDriver`] does the
//! protocol work over any stream: key exchange, start/auth, then exactly
//! the message sequence the server expects for the chosen operation.
//!
//! ```text
//! copy:    SendDataStart, SendDataNext* (last)  ->  SendDataResponse
//! list:                                          <-  ListResponse, ListEntry * count
//! paste:   ReceiveRequest                        <-  ReceiveResponse, ReceiveDataNext* (last)
//! burn:    BurnRequest                           <-  BurnResponse
//! ```

use netgiv_channel::MessageCodec;
use netgiv_types::{
    BurnRequest, BurnResponse, ListEntry, ListResponse, LookupStatus, ObjectId, OperationType,
    ProtocolMessage, ReceiveDataNext, ReceiveRequest, ReceiveResponse, SendDataNext,
    SendDataResponse, SendDataStart, StartRequest, StartResponse, StartStatus, PROTOCOL_VERSION,
};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{ClientError, Result};

/// Default bytes per SendDataNext.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`Client`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Server address, `host:port`.
    pub address: String,
    /// Shared secret configured on the server.
    pub auth_token: String,
    /// Name sent to the server for its logs.
    pub client_name: String,
    /// Protocol version to announce.
    pub protocol_version: String,
    /// Bytes per uploaded chunk.
    pub chunk_size: usize,
    /// Limit on establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with defaults for everything but address and token.
    pub fn new(address: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            auth_token: auth_token.into(),
            client_name: format!("netgiv/{}", env!("CARGO_PKG_VERSION")),
            protocol_version: PROTOCOL_VERSION.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the client name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set the upload chunk size (at least one byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

// Don't leak the token in debug output
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("auth_token", &"[REDACTED]")
            .field("client_name", &self.client_name)
            .field("protocol_version", &self.protocol_version)
            .field("chunk_size", &self.chunk_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Result of a successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Id the server assigned.
    pub id: ObjectId,
    /// Bytes stored.
    pub size: u32,
    /// Kind the server detected.
    pub kind: String,
}

/// Metadata of a pasted object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveInfo {
    /// Original file name, may be empty.
    pub filename: String,
    /// Detected kind.
    pub kind: String,
    /// Size in bytes.
    pub size: u32,
}

/// Dials the server, one connection per operation.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a client.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload `input` until it ends.
    pub async fn copy<R>(&self, filename: &str, input: R) -> Result<SendReceipt>
    where
        R: AsyncRead + Unpin,
    {
        self.open(OperationType::Send).await?.copy(filename, input).await
    }

    /// List stored objects.
    pub async fn list(&self) -> Result<Vec<ListEntry>> {
        self.open(OperationType::List).await?.list().await
    }

    /// Download an object into `output`. [`ObjectId::LATEST`] fetches the
    /// most recent one.
    pub async fn paste<W>(&self, id: ObjectId, output: W) -> Result<ReceiveInfo>
    where
        W: AsyncWrite + Unpin,
    {
        self.open(OperationType::Receive).await?.paste(id, output).await
    }

    /// Delete an object. [`ObjectId::LATEST`] deletes the most recent one.
    pub async fn burn(&self, id: ObjectId) -> Result<()> {
        self.open(OperationType::Burn).await?.burn(id).await
    }

    async fn open(&self, operation: OperationType) -> Result<ClientDriver<TcpStream>> {
        let address = &self.config.address;
        let stream = match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::Connect {
                    address: address.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ClientError::ConnectTimeout {
                    address: address.clone(),
                })
            }
        };
        tracing::debug!(%address, %operation, "Connected");

        ClientDriver::establish(stream, &self.config, operation).await
    }
}

/// Runs one operation over an established, authenticated channel.
#[derive(Debug)]
pub struct ClientDriver<S> {
    codec: MessageCodec<S>,
    operation: OperationType,
    chunk_size: usize,
}

impl<S> ClientDriver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Key exchange, then StartRequest. Fails with the server's verdict if
    /// the version or token is refused.
    pub async fn establish(stream: S, config: &ClientConfig, operation: OperationType) -> Result<Self> {
        let mut codec = MessageCodec::establish(stream).await?;

        codec
            .send(&StartRequest {
                operation,
                client_name: config.client_name.clone(),
                protocol_version: config.protocol_version.clone(),
                auth_token: config.auth_token.clone(),
            })
            .await?;

        let response: StartResponse = required(&mut codec).await?;
        match response.status {
            StartStatus::Ok => Ok(Self {
                codec,
                operation,
                chunk_size: config.chunk_size.max(1),
            }),
            StartStatus::WrongProtocol => Err(ClientError::WrongProtocol {
                version: config.protocol_version.clone(),
            }),
            StartStatus::BadAuthToken => Err(ClientError::BadAuthToken),
        }
    }

    /// The operation this connection was opened for.
    pub fn operation(&self) -> OperationType {
        self.operation
    }

    /// Send `input` in chunks until it ends; the final chunk carries `last`.
    pub async fn copy<R>(mut self, filename: &str, mut input: R) -> Result<SendReceipt>
    where
        R: AsyncRead + Unpin,
    {
        self.check(OperationType::Send)?;

        self.codec
            .send(&SendDataStart {
                filename: filename.to_string(),
                total_size: 0,
            })
            .await?;

        // Read one chunk ahead so the final chunk can be flagged without a
        // trailing empty one.
        let mut current = read_chunk(&mut input, self.chunk_size).await?;
        loop {
            let next = if current.len() < self.chunk_size {
                Vec::new()
            } else {
                read_chunk(&mut input, self.chunk_size).await?
            };
            let last = next.is_empty();

            self.codec.send(&SendDataNext { data: current, last }).await?;
            if last {
                break;
            }
            current = next;
        }

        let response: SendDataResponse = required(&mut self.codec).await?;
        self.finish().await;

        tracing::debug!(id = %response.id, size = response.size, "Copy complete");
        Ok(SendReceipt {
            id: response.id,
            size: response.size,
            kind: response.kind,
        })
    }

    /// Fetch the listing.
    pub async fn list(mut self) -> Result<Vec<ListEntry>> {
        self.check(OperationType::List)?;

        let header: ListResponse = required(&mut self.codec).await?;
        let mut entries = Vec::with_capacity(header.count.min(1024) as usize);
        for _ in 0..header.count {
            entries.push(required::<ListEntry, S>(&mut self.codec).await?);
        }
        self.finish().await;

        Ok(entries)
    }

    /// Fetch an object and write it to `output` in order.
    pub async fn paste<W>(mut self, id: ObjectId, mut output: W) -> Result<ReceiveInfo>
    where
        W: AsyncWrite + Unpin,
    {
        self.check(OperationType::Receive)?;

        self.codec.send(&ReceiveRequest { id }).await?;
        let response: ReceiveResponse = required(&mut self.codec).await?;
        if response.status == LookupStatus::NotFound {
            return Err(ClientError::NotFound { id });
        }

        let mut received: u64 = 0;
        loop {
            let chunk: ReceiveDataNext = required(&mut self.codec).await?;
            output.write_all(&chunk.data).await?;
            received += chunk.data.len() as u64;
            if chunk.last {
                break;
            }
        }
        output.flush().await?;
        self.finish().await;

        if received != response.size as u64 {
            return Err(ClientError::SizeMismatch {
                announced: response.size,
                received,
            });
        }

        Ok(ReceiveInfo {
            filename: response.filename,
            kind: response.kind,
            size: response.size,
        })
    }

    /// Delete an object.
    pub async fn burn(mut self, id: ObjectId) -> Result<()> {
        self.check(OperationType::Burn)?;

        self.codec.send(&BurnRequest { id }).await?;
        let response: BurnResponse = required(&mut self.codec).await?;
        self.finish().await;

        match response.status {
            LookupStatus::Ok => Ok(()),
            LookupStatus::NotFound => Err(ClientError::NotFound { id }),
        }
    }

    fn check(&self, requested: OperationType) -> Result<()> {
        if self.operation == requested {
            Ok(())
        } else {
            Err(ClientError::OperationMismatch {
                established: self.operation,
                requested,
            })
        }
    }

    async fn finish(&mut self) {
        if let Err(e) = self.codec.shutdown().await {
            tracing::debug!("Shutdown failed: {}", e);
        }
    }
}

/// Next message; a closed stream is [`ClientError::UnexpectedEnd`].
async fn required<M, S>(codec: &mut MessageCodec<S>) -> Result<M>
where
    M: ProtocolMessage,
    S: AsyncRead + AsyncWrite + Unpin,
{
    codec
        .recv::<M>()
        .await?
        .ok_or(ClientError::UnexpectedEnd { expected: M::KIND })
}

/// Fill up to `size` bytes; shorter only at end of input.
async fn read_chunk<R>(input: &mut R, size: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}
