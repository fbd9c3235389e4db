//! # stepcast Relay
//!
//! A dumb broadcast hub. Every text frame received from one client is
//! forwarded unchanged to every other connected client, never back to the
//! sender. There is no schema, no acknowledgement and no persistence.
//!
//! ## Usage
//!
//! ```ignore
//! let relay = RelayServer::new(RelayConfig::default());
//! let addr = relay.start().await?;
//! // ...
//! relay.stop().await;
//! ```

mod connection;
mod error;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use stepcast_config::RelayConfig;

pub use error::RelayError;
pub use server::create_router;

/// Frames buffered per client before the relay drops for that client.
pub(crate) const CLIENT_BUFFER: usize = 32;

/// Shared relay state: the broadcast set.
#[derive(Default)]
pub struct RelayState {
    clients: DashMap<Uuid, mpsc::Sender<Utf8Bytes>>,
}

impl RelayState {
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Forward `text` to every client except `from`.
    pub(crate) fn broadcast(&self, from: Uuid, text: Utf8Bytes) {
        let mut delivered = 0usize;
        for entry in self.clients.iter() {
            if *entry.key() == from {
                continue;
            }
            match entry.value().try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Client {} is not keeping up, frame dropped", entry.key());
                }
                // A client mid-disconnect.
                Err(TrySendError::Closed(_)) => {}
            }
        }
        debug!("Forwarded message from {} to {} client(s)", from, delivered);
    }

    fn disconnect_all(&self) {
        self.clients.clear();
    }
}

struct Running {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

/// The relay server.
pub struct RelayServer {
    config: RelayConfig,
    state: Arc<RelayState>,
    running: Mutex<Option<Running>>,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            state: Arc::new(RelayState::default()),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> Arc<RelayState> {
        self.state.clone()
    }

    pub fn client_count(&self) -> usize {
        self.state.client_count()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|r| r.addr)
    }

    /// Bind and start serving. Returns the bound address (useful with port 0).
    pub async fn start(&self) -> Result<SocketAddr, RelayError> {
        if let Some(addr) = self.local_addr() {
            return Err(RelayError::AlreadyRunning(addr));
        }

        let address = self.config.address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|source| RelayError::Bind {
                address: address.clone(),
                source,
            })?;
        let addr = listener.local_addr()?;

        let router = create_router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!("Relay server error: {}", e);
            }
        });

        info!("Relay listening on ws://{}", addr);
        *self.running.lock() = Some(Running {
            addr,
            shutdown_tx,
            task,
        });
        Ok(addr)
    }

    /// Stop accepting clients and drop every open connection.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        let _ = running.shutdown_tx.send(());
        self.state.disconnect_all();
        let _ = running.task.await;
        info!("Relay on {} stopped", running.addr);
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), RelayError>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> RelayConfig {
        RelayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let state = RelayState::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::channel(CLIENT_BUFFER);
        let (tx_b, mut rx_b) = mpsc::channel(CLIENT_BUFFER);
        state.clients.insert(a, tx_a);
        state.clients.insert(b, tx_b);

        state.broadcast(a, Utf8Bytes::from_static("hello"));

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap().as_str(), "hello");
    }

    #[test]
    fn test_stalled_client_is_bounded() {
        let state = RelayState::default();
        let (sender, slow, fast) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (tx_slow, mut rx_slow) = mpsc::channel(CLIENT_BUFFER);
        let (tx_fast, mut rx_fast) = mpsc::channel(CLIENT_BUFFER);
        state.clients.insert(slow, tx_slow);
        state.clients.insert(fast, tx_fast);

        for i in 0..CLIENT_BUFFER + 10 {
            state.broadcast(sender, Utf8Bytes::from(i.to_string()));
            // The fast client drains as it goes.
            assert_eq!(rx_fast.try_recv().unwrap().as_str(), i.to_string());
        }

        let mut buffered = Vec::new();
        while let Ok(text) = rx_slow.try_recv() {
            buffered.push(text.as_str().to_string());
        }
        assert_eq!(buffered.len(), CLIENT_BUFFER);
        assert_eq!(buffered.first().map(String::as_str), Some("0"));
        assert_eq!(buffered.last(), Some(&(CLIENT_BUFFER - 1).to_string()));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let relay = RelayServer::new(loopback());
        assert!(relay.local_addr().is_none());

        let addr = relay.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(relay.local_addr(), Some(addr));
        assert!(matches!(
            relay.start().await,
            Err(RelayError::AlreadyRunning(_))
        ));

        relay.stop().await;
        assert!(relay.local_addr().is_none());
        relay.stop().await;
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let first = RelayServer::new(loopback());
        let addr = first.start().await.unwrap();

        let second = RelayServer::new(RelayConfig {
            host: "127.0.0.1".to_string(),
            port: addr.port(),
        });
        assert!(matches!(second.start().await, Err(RelayError::Bind { .. })));
        first.stop().await;
    }
}
