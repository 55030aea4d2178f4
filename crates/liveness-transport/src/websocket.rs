//! WebSocket client transport using `tokio-tungstenite`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ConnectRequest, Connection, ConnectionId, Connector, SocketPool, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default bound on the WebSocket upgrade handshake.
const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket state shared between a connection handle and the pool.
///
/// The sink and the source live behind separate locks so a pending
/// `recv` never blocks a concurrent `send`.
struct Socket {
    id: ConnectionId,
    url: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    source: Mutex<SplitStream<WsStream>>,
    closed: AtomicBool,
}

impl Socket {
    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.sink.lock().await.close().await {
            // The peer may already be gone; closing must still succeed.
            tracing::debug!(id = %self.id, error = %e, "close handshake failed");
        }
        tracing::debug!(id = %self.id, url = %self.url, "WebSocket closed");
    }
}

/// A [`Connector`] that opens WebSocket streams and tracks them in a
/// [`SocketPool`] keyed by endpoint URL.
pub struct WebSocketConnector {
    pool: SocketPool<Arc<Socket>>,
    open_timeout: Duration,
}

impl WebSocketConnector {
    /// Creates a connector with an empty pool.
    pub fn new() -> Self {
        Self {
            pool: SocketPool::new(),
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }

    /// Bounds how long the upgrade handshake may take.
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Number of open sockets for `endpoint`.
    pub fn open_sockets(&self, endpoint: &str) -> usize {
        self.pool.len(endpoint)
    }

    /// Closes every socket this connector opened.
    pub async fn destroy(&self) {
        let sockets = self.pool.drain();
        tracing::debug!(count = sockets.len(), "destroying WebSocket pool");
        for socket in sockets {
            socket.close().await;
        }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn connect(
        &self,
        request: &ConnectRequest,
    ) -> Result<Self::Connection, Self::Error> {
        let mut handshake = request
            .url()
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            handshake.headers_mut().insert(name, value);
        }

        let (ws, _response) = tokio::time::timeout(
            self.open_timeout,
            tokio_tungstenite::connect_async(handshake),
        )
        .await
        .map_err(|_| TransportError::OpenTimeout(self.open_timeout))?
        .map_err(|e| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (sink, source) = ws.split();
        let socket = Arc::new(Socket {
            id,
            url: request.endpoint().to_string(),
            sink: Mutex::new(sink),
            source: Mutex::new(source),
            closed: AtomicBool::new(false),
        });
        self.pool.insert(request.endpoint(), id, Arc::clone(&socket));
        tracing::debug!(%id, endpoint = request.endpoint(), "opened WebSocket stream");

        Ok(WebSocketConnection {
            socket,
            pool: self.pool.clone(),
        })
    }
}

/// One WebSocket stream. Dropping it releases its pool entry.
pub struct WebSocketConnection {
    socket: Arc<Socket>,
    pool: SocketPool<Arc<Socket>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.socket.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed(
                "send after close".into(),
            ));
        }
        let msg = Message::Binary(data.to_vec().into());
        self.socket.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.socket.source.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    if self.socket.closed.load(Ordering::SeqCst) {
                        return Ok(None);
                    }
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.pool.remove(&self.socket.url, self.socket.id);
        self.socket.close().await;
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.socket.id
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.pool.remove(&self.socket.url, self.socket.id);
    }
}
