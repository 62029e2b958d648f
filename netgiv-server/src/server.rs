//! Main netgiv server coordination.
//!
//! `Server` owns the configuration, the object registry, the backing store
//! and the metrics. Each accepted connection gets a [`Session`] holding an
//! `Arc<Server>`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::registry::Registry;
use crate::session::Session;
use crate::storage::TempStore;

/// Operational counters.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Connections accepted.
    pub connections_total: AtomicU64,
    /// Objects stored by completed Sends.
    pub objects_stored: AtomicU64,
    /// Objects deleted by Burns.
    pub objects_burned: AtomicU64,
    /// Object bytes received.
    pub bytes_received: AtomicU64,
    /// Object bytes sent by Receives.
    pub bytes_sent: AtomicU64,
    /// StartRequests rejected for version or token.
    pub auth_failures: AtomicU64,
    /// Sessions that ended in an error.
    pub errors_total: AtomicU64,
}

impl ServerMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    fn log_summary(&self) {
        tracing::info!(
            connections = self.connections_total.load(Ordering::Relaxed),
            stored = self.objects_stored.load(Ordering::Relaxed),
            burned = self.objects_burned.load(Ordering::Relaxed),
            bytes_in = self.bytes_received.load(Ordering::Relaxed),
            bytes_out = self.bytes_sent.load(Ordering::Relaxed),
            auth_failures = self.auth_failures.load(Ordering::Relaxed),
            errors = self.errors_total.load(Ordering::Relaxed),
            "Server metrics"
        );
    }
}

/// The netgiv relay server.
#[derive(Debug)]
pub struct Server {
    config: Config,
    registry: Registry,
    store: TempStore,
    metrics: ServerMetrics,
}

impl Server {
    /// Create a server from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = TempStore::open(config.storage.temp_dir.clone())?;
        Ok(Self {
            config,
            registry: Registry::new(),
            store,
            metrics: ServerMetrics::default(),
        })
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the object registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the backing store.
    pub fn store(&self) -> &TempStore {
        &self.store
    }

    /// Get the operational metrics.
    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let address = self.config.server.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        self.serve(listener, shutdown).await
    }

    /// Accept connections on `listener` until `shutdown` resolves, then purge
    /// every stored object.
    ///
    /// Sessions still running at shutdown are not waited for.
    pub async fn serve<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(address = %listener.local_addr()?, "netgiv server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!("Accept failed: {}", e);
                            continue;
                        }
                    };
                    ServerMetrics::incr(&self.metrics.connections_total);

                    let server = self.clone();
                    let span = tracing::info_span!(
                        "session",
                        %peer,
                        operation = tracing::field::Empty
                    );
                    tokio::spawn(
                        async move {
                            if let Err(e) = Session::new(server.clone()).run(stream).await {
                                ServerMetrics::incr(&server.metrics.errors_total);
                                tracing::warn!("Session failed: {}", e);
                            }
                        }
                        .instrument(span),
                    );
                }
            }
        }

        let purged = self.purge().await;
        tracing::info!(purged, "Stored objects removed");
        self.metrics.log_summary();
        Ok(())
    }

    /// Remove every stored object and its file. Returns how many were removed.
    pub async fn purge(&self) -> usize {
        let objects = self.registry.drain().await;
        for object in &objects {
            if let Err(e) = self.store.remove(&object.handle).await {
                tracing::warn!(id = %object.id, "Failed to remove object file: {}", e);
            }
        }
        objects.len()
    }
}
