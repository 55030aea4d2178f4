//! Non-blocking duplex wrapper around a [`Connection`].
//!
//! Sending only enqueues a frame; a dedicated writer task drains the queue
//! into the socket. Backpressure is whatever the underlying socket does;
//! this layer adds no flow control of its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{Connection, ConnectionId, TransportError};

/// Upper bound on the close handshake so teardown never hangs.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// A connection plus its outbound queue and writer task.
pub struct DuplexStream<C: Connection> {
    conn: Arc<C>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    writer: JoinHandle<()>,
    closed: AtomicBool,
}

impl<C: Connection> DuplexStream<C> {
    /// Wraps `conn` and spawns its writer task.
    pub fn new(conn: C) -> Self {
        let conn = Arc::new(conn);
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer_conn = Arc::clone(&conn);
        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = writer_conn.send(&frame).await {
                    tracing::warn!(
                        id = %writer_conn.id(),
                        error = %e,
                        "writer stopped: send failed"
                    );
                    break;
                }
            }
        });
        Self {
            conn,
            outbound: tx,
            writer,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueues one frame without waiting for it to hit the socket.
    pub fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed("stream closed".into()));
        }
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::ConnectionClosed("writer stopped".into()))
    }

    /// A shared handle to the connection, for a reader task.
    pub fn connection(&self) -> Arc<C> {
        Arc::clone(&self.conn)
    }

    /// Identifier of the underlying connection.
    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Abandons queued frames and closes the connection.
    ///
    /// Idempotent and infallible: errors from the socket are logged, and a
    /// second call returns immediately.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.writer.abort();
        match tokio::time::timeout(CLOSE_TIMEOUT, self.conn.close()).await {
            Ok(Ok(())) => tracing::debug!(id = %self.conn.id(), "stream closed"),
            Ok(Err(e)) => {
                tracing::debug!(id = %self.conn.id(), error = %e, "close reported an error")
            }
            Err(_) => tracing::warn!(id = %self.conn.id(), "close timed out"),
        }
    }
}

impl<C: Connection> Drop for DuplexStream<C> {
    fn drop(&mut self) {
        self.writer.abort();
    }
}
