//! Stream transport layer for liveness sessions.
//!
//! Provides the [`Connection`] and [`Connector`] traits that abstract over
//! the socket a liveness session streams through, plus:
//!
//! - [`ConnectRequest`]: endpoint, query parameters and headers for one
//!   session-start handshake
//! - [`SocketPool`]: open sockets keyed by target URL, one private entry
//!   per logical stream
//! - [`DuplexStream`]: non-blocking send queue plus idempotent close on top
//!   of any [`Connection`]
//! - [`MemoryConnector`]: an in-process transport for tests and demos
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`
//! - `tls`: enables `wss://` endpoints

mod duplex;
mod error;
mod memory;
mod pool;
mod request;
#[cfg(feature = "websocket")]
mod websocket;

pub use duplex::DuplexStream;
pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector, MemoryListener, MemoryPeer};
pub use pool::SocketPool;
pub use request::ConnectRequest;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Opens outbound connections to a streaming endpoint.
///
/// One connector may serve many sessions; every call to
/// [`connect`](Connector::connect) produces an independent connection.
///
/// ## Why `impl Future + Send`
///
/// The session runtime calls `connect` from a spawned task, so the future
/// must be `Send`. A plain `async fn` in a trait leaves that bound
/// unstated; spelling the return type out puts it on every
/// implementation. Implementations can still be written as `async fn`.
///
/// ## Errors
///
/// `Error` must be `'static` so callers can inspect it through
/// `std::error::Error::downcast_ref`. Connectors that give up waiting for
/// the stream to open should report it with an error the caller can
/// recognize as a timeout, as [`TransportError::OpenTimeout`] is.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;
    /// The error type for connect operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a new connection for the given request.
    fn connect(
        &self,
        request: &ConnectRequest,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single duplex connection that can send and receive binary frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one binary frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    ///
    /// Must be idempotent: closing an already-closed connection is `Ok(())`.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "stream-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "first");
        map.insert(ConnectionId::new(2), "second");
        assert_eq!(map[&ConnectionId::new(1)], "first");
    }
}
