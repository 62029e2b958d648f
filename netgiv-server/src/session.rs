//! Per-connection session management.
//!
//! A `Session` runs the key exchange, reads the StartRequest, checks it and
//! runs exactly one operation flow. Transitions come from the pure
//! [`SessionState`] machine in netgiv-core; this module does the I/O.

use netgiv_channel::{ChannelError, MessageCodec};
use netgiv_core::{detect_kind, verdict, Action, Event, SessionState};
use netgiv_types::{
    BurnRequest, BurnResponse, ListResponse, LookupStatus, OperationType, ProtocolMessage,
    ReceiveDataNext, ReceiveRequest, ReceiveResponse, SendDataNext, SendDataResponse,
    SendDataStart, StartRequest, StartResponse, StartStatus, PROTOCOL_VERSION,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::error::{ProtocolError, ProtocolResult};
use crate::registry::StoredObject;
use crate::server::{Server, ServerMetrics};

/// A per-connection session.
pub struct Session {
    server: Arc<Server>,
    state: SessionState,
    io_timeout: Duration,
}

impl Session {
    /// Create a new session for a connection.
    pub fn new(server: Arc<Server>) -> Self {
        let io_timeout = server.config().limits.io_timeout();
        Self {
            server,
            state: SessionState::new(),
            io_timeout,
        }
    }

    /// Run the session until completion.
    pub async fn run<S>(mut self, stream: S) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let result = self.drive(stream).await;
        if let Err(e) = &result {
            for action in self.advance(Event::Failed {
                error: e.to_string(),
            }) {
                if let Action::Close { reason } = action {
                    tracing::debug!(?reason, "Session closed: {}", e);
                }
            }
        }
        result
    }

    fn advance(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = self.state.on_event(event);
        self.state = next;
        actions
    }

    async fn drive<S>(&mut self, stream: S) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut codec = match deadline(self.io_timeout, "key exchange", MessageCodec::establish(stream)).await {
            Ok(codec) => codec,
            Err(ProtocolError::Channel(e)) if e.is_disconnect() => {
                tracing::debug!("Peer left during key exchange");
                self.advance(Event::PeerClosed);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        self.advance(Event::HandshakeCompleted);

        let start = match deadline(self.io_timeout, "StartRequest", codec.recv::<StartRequest>()).await? {
            Some(start) => start,
            None => {
                tracing::debug!("Peer left before sending a request");
                self.advance(Event::PeerClosed);
                return Ok(());
            }
        };
        tracing::Span::current().record("operation", tracing::field::display(start.operation));
        tracing::debug!(client = %start.client_name, "Start request");

        let mut pending: VecDeque<Action> = self
            .advance(Event::StartReceived {
                operation: start.operation,
            })
            .into();

        while let Some(action) = pending.pop_front() {
            match action {
                Action::Authenticate(_) => {
                    let status = self.authenticate(&start);
                    pending.extend(self.advance(Event::Verdict(status)));
                }
                Action::SendStartResponse(status) => {
                    self.send(&mut codec, &StartResponse { status }).await?;
                }
                Action::Dispatch(operation) => {
                    self.dispatch(operation, &mut codec).await?;
                    pending.extend(self.advance(Event::FlowCompleted));
                }
                Action::Close { reason } => {
                    if let Err(e) = codec.shutdown().await {
                        tracing::debug!("Shutdown after {:?}: {}", reason, e);
                    }
                    if reason.is_error() {
                        tracing::warn!(?reason, "Session ended early");
                    } else {
                        tracing::debug!(?reason, "Session complete");
                    }
                }
            }
        }

        Ok(())
    }

    fn authenticate(&self, start: &StartRequest) -> StartStatus {
        let version_matches = start.protocol_version == PROTOCOL_VERSION;
        let expected = self.server.config().server.auth_token.as_bytes();
        let token_matches: bool = start.auth_token.as_bytes().ct_eq(expected).into();

        let status = verdict(version_matches, token_matches);
        match status {
            StartStatus::Ok => {}
            StartStatus::WrongProtocol => {
                ServerMetrics::incr(&self.server.metrics().auth_failures);
                tracing::warn!(
                    client_version = %start.protocol_version,
                    server_version = PROTOCOL_VERSION,
                    "Protocol version mismatch"
                );
            }
            StartStatus::BadAuthToken => {
                ServerMetrics::incr(&self.server.metrics().auth_failures);
                tracing::warn!(client = %start.client_name, "Bad auth token");
            }
        }
        status
    }

    async fn dispatch<S>(&self, operation: OperationType, codec: &mut MessageCodec<S>) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        match operation {
            OperationType::Send => self.handle_send(codec).await,
            OperationType::List => self.handle_list(codec).await,
            OperationType::Receive => self.handle_receive(codec).await,
            OperationType::Burn => self.handle_burn(codec).await,
        }
    }

    /// Receive an object and store it.
    async fn handle_send<S>(&self, codec: &mut MessageCodec<S>) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let header: SendDataStart = self.expect(codec).await?;
        let id = self.server.registry().next_id();
        let limit = self.server.config().storage.object_size_limit();

        // Dropped on any early return, taking the partial file with it.
        let mut pending = self.server.store().create()?;
        let mut kind: Option<&'static str> = None;

        loop {
            let chunk: SendDataNext = self.expect(codec).await?;
            if kind.is_none() {
                kind = Some(detect_kind(&chunk.data));
            }
            if pending.written() + chunk.data.len() as u64 > limit {
                tracing::warn!(id = %id, limit, "Object exceeds size limit");
                return Err(ProtocolError::ObjectTooLarge { limit });
            }
            pending.write(&chunk.data).await?;
            ServerMetrics::add(&self.server.metrics().bytes_received, chunk.data.len() as u64);

            if chunk.last {
                break;
            }
        }

        let (handle, size) = pending.finish().await?;
        let kind = kind.unwrap_or(netgiv_core::TEXT_KIND).to_string();
        let object = StoredObject {
            id,
            handle,
            filename: header.filename,
            kind: kind.clone(),
            size: size as u32,
            created_at: current_timestamp(),
        };
        if let Err(object) = self.server.registry().append(object).await {
            tracing::warn!(id = %id, "Registry closed, discarding object");
            if let Err(e) = self.server.store().remove(&object.handle).await {
                tracing::warn!(id = %id, "Failed to remove object file: {}", e);
            }
            return Err(ProtocolError::ShuttingDown);
        }
        ServerMetrics::incr(&self.server.metrics().objects_stored);

        tracing::info!(id = %id, size, kind = %kind, "Stored object");

        self.send(
            codec,
            &SendDataResponse {
                id,
                size: size as u32,
                kind,
            },
        )
        .await
    }

    /// Send the count, then one entry per stored object.
    async fn handle_list<S>(&self, codec: &mut MessageCodec<S>) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let objects = self.server.registry().list().await;
        self.send(
            codec,
            &ListResponse {
                count: objects.len() as u32,
            },
        )
        .await?;
        for object in &objects {
            self.send(codec, &object.to_list_entry()).await?;
        }
        tracing::debug!(count = objects.len(), "Listed objects");
        Ok(())
    }

    /// Stream a stored object back in bounded chunks.
    async fn handle_receive<S>(&self, codec: &mut MessageCodec<S>) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let request: ReceiveRequest = self.expect(codec).await?;
        let object = match self.server.registry().find(request.id).await {
            Some(object) => object,
            None => {
                tracing::info!(id = %request.id, "Receive: not found");
                self.send(codec, &ReceiveResponse::not_found()).await?;
                return Ok(());
            }
        };

        // Opened before answering so a concurrent burn fails cleanly here.
        let mut file = self.server.store().read(&object.handle).await?;

        self.send(
            codec,
            &ReceiveResponse {
                status: LookupStatus::Ok,
                filename: object.filename.clone(),
                kind: object.kind.clone(),
                size: object.size,
            },
        )
        .await?;

        let chunk_size = self.server.config().limits.chunk_size;
        let mut remaining = object.size as usize;
        loop {
            let mut data = vec![0u8; remaining.min(chunk_size)];
            file.read_exact(&mut data).await.map_err(|e| {
                crate::error::StorageError::io("read", object.handle.path(), e)
            })?;
            remaining -= data.len();
            let sent = data.len() as u64;

            self.send(
                codec,
                &ReceiveDataNext {
                    data,
                    last: remaining == 0,
                },
            )
            .await?;
            ServerMetrics::add(&self.server.metrics().bytes_sent, sent);

            if remaining == 0 {
                break;
            }
        }

        tracing::info!(id = %object.id, size = object.size, "Sent object");
        Ok(())
    }

    /// Delete a stored object.
    async fn handle_burn<S>(&self, codec: &mut MessageCodec<S>) -> ProtocolResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let request: BurnRequest = self.expect(codec).await?;
        let status = match self.server.registry().take(request.id).await {
            Some(object) => {
                if let Err(e) = self.server.store().remove(&object.handle).await {
                    tracing::warn!(id = %object.id, "Failed to remove object file: {}", e);
                }
                ServerMetrics::incr(&self.server.metrics().objects_burned);
                tracing::info!(id = %object.id, "Burned object");
                LookupStatus::Ok
            }
            None => {
                tracing::info!(id = %request.id, "Burn: not found");
                LookupStatus::NotFound
            }
        };

        self.send(codec, &BurnResponse { status }).await
    }

    /// Await the next message under the I/O deadline.
    async fn expect<M, S>(&self, codec: &mut MessageCodec<S>) -> ProtocolResult<M>
    where
        M: ProtocolMessage,
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        deadline(self.io_timeout, M::KIND, codec.expect::<M>()).await
    }

    /// Write one message under the I/O deadline. A peer that stops reading
    /// stalls the write once the transport buffers fill.
    async fn send<M, S>(&self, codec: &mut MessageCodec<S>, message: &M) -> ProtocolResult<()>
    where
        M: ProtocolMessage,
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        deadline(self.io_timeout, format!("peer to read {}", M::KIND), codec.send(message)).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

/// Run `fut` under `timeout`; expiry becomes [`ProtocolError::Timeout`].
async fn deadline<T, F>(
    timeout: Duration,
    waiting_for: impl std::fmt::Display,
    fut: F,
) -> ProtocolResult<T>
where
    F: Future<Output = Result<T, ChannelError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ProtocolError::Timeout {
            waiting_for: waiting_for.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use netgiv_types::{ListEntry, ObjectId, ReceiveDataNext, StartStatus};
    use tokio::io::DuplexStream;

    const TOKEN: &str = "test-token";

    fn server(dir: &std::path::Path) -> Arc<Server> {
        let mut config = Config::with_auth_token(TOKEN);
        config.storage.temp_dir = Some(dir.to_path_buf());
        config.limits.io_timeout_secs = 2;
        Arc::new(Server::new(config).unwrap())
    }

    fn start(operation: OperationType) -> StartRequest {
        StartRequest {
            operation,
            client_name: "session-test".into(),
            protocol_version: PROTOCOL_VERSION.into(),
            auth_token: TOKEN.into(),
        }
    }

    /// Spawn a session on one end of a pipe and hand back the client codec.
    async fn connect(
        server: &Arc<Server>,
    ) -> (
        MessageCodec<DuplexStream>,
        tokio::task::JoinHandle<ProtocolResult<()>>,
    ) {
        connect_buffered(server, 64 * 1024).await
    }

    async fn connect_buffered(
        server: &Arc<Server>,
        buffer: usize,
    ) -> (
        MessageCodec<DuplexStream>,
        tokio::task::JoinHandle<ProtocolResult<()>>,
    ) {
        let (client, served) = tokio::io::duplex(buffer);
        let session = Session::new(server.clone());
        let task = tokio::spawn(session.run(served));
        (MessageCodec::establish(client).await.unwrap(), task)
    }

    async fn open(server: &Arc<Server>, operation: OperationType) -> (MessageCodec<DuplexStream>, tokio::task::JoinHandle<ProtocolResult<()>>) {
        let (mut codec, task) = connect(server).await;
        codec.send(&start(operation)).await.unwrap();
        let response: StartResponse = codec.expect().await.unwrap();
        assert_eq!(response.status, StartStatus::Ok);
        (codec, task)
    }

    async fn send_object(server: &Arc<Server>, filename: &str, chunks: &[&[u8]]) -> SendDataResponse {
        let (mut codec, task) = open(server, OperationType::Send).await;
        codec
            .send(&SendDataStart {
                filename: filename.into(),
                total_size: 0,
            })
            .await
            .unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            codec
                .send(&SendDataNext {
                    data: chunk.to_vec(),
                    last: i + 1 == chunks.len(),
                })
                .await
                .unwrap();
        }
        let response = codec.expect::<SendDataResponse>().await.unwrap();
        task.await.unwrap().unwrap();
        response
    }

    #[tokio::test]
    async fn send_stores_object() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = send_object(&server, "", &[b"hello ", b"world"]).await;

        assert_eq!(response.id, ObjectId::new(1));
        assert_eq!(response.size, 11);
        assert_eq!(response.kind, "text/plain");

        let stored = server.registry().find(ObjectId::LATEST).await.unwrap();
        assert_eq!(std::fs::read(stored.handle.path()).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn empty_send_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = send_object(&server, "empty", &[b""]).await;
        assert_eq!(response.size, 0);
        assert_eq!(server.registry().len().await, 1);
    }

    #[tokio::test]
    async fn kind_comes_from_first_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = send_object(&server, "img.png", &[b"\x89PNG\r\n\x1a\n", b"rest"]).await;
        assert_eq!(response.kind, "image/png");
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_without_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let (mut codec, task) = connect(&server).await;

        let mut request = start(OperationType::Send);
        request.auth_token = "nope".into();
        codec.send(&request).await.unwrap();

        let response: StartResponse = codec.expect().await.unwrap();
        assert_eq!(response.status, StartStatus::BadAuthToken);
        task.await.unwrap().unwrap();
        assert!(server.registry().is_empty().await);
        assert_eq!(
            server
                .metrics()
                .auth_failures
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn wrong_version_is_rejected_first() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let (mut codec, task) = connect(&server).await;

        let mut request = start(OperationType::List);
        request.protocol_version = "v0.9".into();
        request.auth_token = "also wrong".into();
        codec.send(&request).await.unwrap();

        let response: StartResponse = codec.expect().await.unwrap();
        assert_eq!(response.status, StartStatus::WrongProtocol);
        // The server closes; nothing else follows.
        assert!(codec.recv::<ListResponse>().await.unwrap().is_none());
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn list_sends_count_then_entries() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        send_object(&server, "a.txt", &[b"aaa"]).await;
        send_object(&server, "b.txt", &[b"bb"]).await;

        let (mut codec, task) = open(&server, OperationType::List).await;
        let header: ListResponse = codec.expect().await.unwrap();
        assert_eq!(header.count, 2);
        let first: ListEntry = codec.expect().await.unwrap();
        let second: ListEntry = codec.expect().await.unwrap();
        task.await.unwrap().unwrap();

        assert_eq!((first.id.value(), first.filename.as_str(), first.size), (1, "a.txt", 3));
        assert_eq!((second.id.value(), second.filename.as_str(), second.size), (2, "b.txt", 2));
    }

    #[tokio::test]
    async fn receive_streams_in_chunks_with_last_flag() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 7) as u8 + b'a').collect();
        send_object(&server, "big.txt", &[&payload]).await;

        let (mut codec, task) = open(&server, OperationType::Receive).await;
        codec.send(&ReceiveRequest { id: ObjectId::new(1) }).await.unwrap();
        let response: ReceiveResponse = codec.expect().await.unwrap();
        assert_eq!(response.status, LookupStatus::Ok);
        assert_eq!(response.size, 5000);

        let mut received = Vec::new();
        let mut chunks = 0;
        loop {
            let chunk: ReceiveDataNext = codec.expect().await.unwrap();
            assert!(chunk.data.len() <= 2048);
            received.extend(chunk.data);
            chunks += 1;
            if chunk.last {
                break;
            }
        }
        task.await.unwrap().unwrap();

        assert_eq!(received, payload);
        assert_eq!(chunks, 3);
    }

    #[tokio::test]
    async fn receive_empty_object_is_one_last_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        send_object(&server, "", &[b""]).await;

        let (mut codec, task) = open(&server, OperationType::Receive).await;
        codec.send(&ReceiveRequest { id: ObjectId::LATEST }).await.unwrap();
        let response: ReceiveResponse = codec.expect().await.unwrap();
        assert_eq!(response.size, 0);

        let chunk: ReceiveDataNext = codec.expect().await.unwrap();
        assert!(chunk.data.is_empty());
        assert!(chunk.last);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn receive_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let (mut codec, task) = open(&server, OperationType::Receive).await;
        codec.send(&ReceiveRequest { id: ObjectId::LATEST }).await.unwrap();
        let response: ReceiveResponse = codec.expect().await.unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(response, ReceiveResponse::not_found());
    }

    #[tokio::test]
    async fn burn_removes_entry_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        send_object(&server, "", &[b"gone soon"]).await;
        let path = server.registry().find(ObjectId::LATEST).await.unwrap().handle.path().to_path_buf();

        let (mut codec, task) = open(&server, OperationType::Burn).await;
        codec.send(&BurnRequest { id: ObjectId::new(1) }).await.unwrap();
        let response: BurnResponse = codec.expect().await.unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(response.status, LookupStatus::Ok);
        assert!(server.registry().is_empty().await);
        assert!(!path.exists());

        let (mut codec, task) = open(&server, OperationType::Burn).await;
        codec.send(&BurnRequest { id: ObjectId::new(1) }).await.unwrap();
        let response: BurnResponse = codec.expect().await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(response.status, LookupStatus::NotFound);
    }

    #[tokio::test]
    async fn oversized_send_is_aborted_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_auth_token(TOKEN);
        config.storage.temp_dir = Some(dir.path().to_path_buf());
        config.storage.max_object_size = 4;
        let server = Arc::new(Server::new(config).unwrap());

        let (mut codec, task) = open(&server, OperationType::Send).await;
        codec
            .send(&SendDataStart {
                filename: String::new(),
                total_size: 0,
            })
            .await
            .unwrap();
        codec
            .send(&SendDataNext {
                data: b"too long".to_vec(),
                last: true,
            })
            .await
            .unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ProtocolError::ObjectTooLarge { limit: 4 })));
        assert!(server.registry().is_empty().await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn disconnect_mid_send_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let (mut codec, task) = open(&server, OperationType::Send).await;
        codec
            .send(&SendDataStart {
                filename: String::new(),
                total_size: 0,
            })
            .await
            .unwrap();
        codec
            .send(&SendDataNext {
                data: b"partial".to_vec(),
                last: false,
            })
            .await
            .unwrap();
        codec.shutdown().await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Channel(ChannelError::UnexpectedEnd { .. })
        ));
        assert!(server.registry().is_empty().await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let (_codec, task) = connect(&server).await;

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout { .. }));
        assert!(err.to_string().contains("StartRequest"));
    }

    #[tokio::test]
    async fn send_finishing_after_purge_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let (mut codec, task) = open(&server, OperationType::Send).await;
        codec
            .send(&SendDataStart {
                filename: "late.txt".into(),
                total_size: 0,
            })
            .await
            .unwrap();
        codec
            .send(&SendDataNext {
                data: b"first half ".to_vec(),
                last: false,
            })
            .await
            .unwrap();

        assert_eq!(server.purge().await, 0);

        codec
            .send(&SendDataNext {
                data: b"second half".to_vec(),
                last: true,
            })
            .await
            .unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ProtocolError::ShuttingDown)));
        assert!(server.registry().is_empty().await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reader_that_stalls_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_auth_token(TOKEN);
        config.storage.temp_dir = Some(dir.path().to_path_buf());
        config.limits.io_timeout_secs = 1;
        let server = Arc::new(Server::new(config).unwrap());

        let payload = vec![b'x'; 4096];
        let chunks: Vec<&[u8]> = (0..25).map(|_| payload.as_slice()).collect();
        send_object(&server, "bulk.txt", &chunks).await;

        let (mut codec, task) = connect_buffered(&server, 1024).await;
        codec.send(&start(OperationType::Receive)).await.unwrap();
        let response: StartResponse = codec.expect().await.unwrap();
        assert_eq!(response.status, StartStatus::Ok);
        codec.send(&ReceiveRequest { id: ObjectId::LATEST }).await.unwrap();

        // Never read the object; the pipe fills and the server's write stalls.
        let result = tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .expect("session should give up on its own")
            .unwrap();
        let err = result.unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout { secs: 1, .. }));
        assert!(err.to_string().contains("peer to read"));
    }

    #[tokio::test]
    async fn early_hangup_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let (mut codec, task) = connect(&server).await;
        codec.shutdown().await.unwrap();

        assert!(task.await.unwrap().is_ok());
    }

    #[test]
    fn timestamp_is_after_2020() {
        assert!(current_timestamp() > 1_577_836_800);
    }
}
