//! In-process transport built on Tokio channels.
//!
//! [`MemoryConnector`] hands every new connection's remote half to a
//! [`MemoryListener`], so a test or a demo can play the part of the
//! streaming service without opening a socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::{ConnectRequest, Connection, ConnectionId, Connector, SocketPool, TransportError};

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// A [`Connector`] whose connections terminate in a [`MemoryListener`].
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    pool: SocketPool<()>,
}

impl MemoryConnector {
    /// Creates a connector and the listener that receives its peers.
    pub fn new() -> (Self, MemoryListener) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                peers: tx,
                pool: SocketPool::new(),
            },
            MemoryListener { peers: rx },
        )
    }

    /// Number of open connections for `endpoint`.
    pub fn open_connections(&self, endpoint: &str) -> usize {
        self.pool.len(endpoint)
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn connect(
        &self,
        request: &ConnectRequest,
    ) -> Result<Self::Connection, Self::Error> {
        let id = ConnectionId::new(NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed));
        let (to_peer, from_client) = mpsc::unbounded_channel();
        let (to_client, from_peer) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            request: request.clone(),
            outbound: Some(to_client),
            inbound: from_client,
        };
        self.peers
            .send(peer)
            .map_err(|_| TransportError::ConnectionClosed("listener dropped".into()))?;

        self.pool.insert(request.endpoint(), id, ());
        Ok(MemoryConnection {
            id,
            endpoint: request.endpoint().to_string(),
            outbound: std::sync::Mutex::new(Some(to_peer)),
            inbound: Mutex::new(from_peer),
            closed: Arc::new(AtomicBool::new(false)),
            pool: self.pool.clone(),
        })
    }
}

/// Accepts the remote halves of connections opened by a [`MemoryConnector`].
pub struct MemoryListener {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryListener {
    /// Waits for the next connection. Returns `None` once the connector is dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.recv().await
    }
}

/// The service side of an in-memory connection.
pub struct MemoryPeer {
    request: ConnectRequest,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryPeer {
    /// The request the client connected with.
    pub fn request(&self) -> &ConnectRequest {
        &self.request
    }

    /// Sends a frame to the client.
    pub fn send(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.outbound
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionClosed("peer closed".into()))?
            .send(data)
            .map_err(|_| TransportError::ConnectionClosed("client closed".into()))
    }

    /// Receives the next frame from the client; `None` once the client closed.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }

    /// Closes the service side; the client's `recv` then returns `Ok(None)`.
    pub fn close(&mut self) {
        self.outbound = None;
    }
}

/// The client side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    endpoint: String,
    outbound: std::sync::Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: Arc<AtomicBool>,
    pool: SocketPool<()>,
}

impl MemoryConnection {
    /// Returns `true` once [`close`](Connection::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let guard = self
            .outbound
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionClosed("send after close".into()))?
            .send(data.to_vec())
            .map_err(|_| TransportError::ConnectionClosed("peer dropped".into()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        if self.is_closed() {
            return Ok(None);
        }
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.outbound
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        // A reader parked in `recv` holds the lock; it is woken when the
        // peer side drops instead.
        if let Ok(mut inbound) = self.inbound.try_lock() {
            inbound.close();
        }
        self.pool.remove(&self.endpoint, self.id);
        tracing::debug!(id = %self.id, "memory stream closed");
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.pool.remove(&self.endpoint, self.id);
    }
}
