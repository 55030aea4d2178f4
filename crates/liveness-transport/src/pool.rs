//! Socket pool: open sockets grouped by target URL.
//!
//! Several logical streams may share one connector (and therefore one pool),
//! but every stream owns its own entry. Removing an entry never touches
//! siblings under the same URL or entries under other URLs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ConnectionId;

/// A cloneable handle to a shared map of `url -> [(id, socket)]`.
///
/// Uses a blocking mutex: every critical section is a plain map operation,
/// and entries must be removable from `Drop`.
#[derive(Debug)]
pub struct SocketPool<T> {
    entries: Arc<Mutex<HashMap<String, Vec<(ConnectionId, T)>>>>,
}

impl<T> Clone for SocketPool<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for SocketPool<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> SocketPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a socket under `url`.
    pub fn insert(&self, url: &str, id: ConnectionId, socket: T) {
        self.lock()
            .entry(url.to_string())
            .or_default()
            .push((id, socket));
    }

    /// Removes one socket. Returns it if it was still registered.
    pub fn remove(&self, url: &str, id: ConnectionId) -> Option<T> {
        let mut entries = self.lock();
        let sockets = entries.get_mut(url)?;
        let index = sockets.iter().position(|(sid, _)| *sid == id)?;
        let (_, socket) = sockets.remove(index);
        if sockets.is_empty() {
            entries.remove(url);
        }
        Some(socket)
    }

    /// Number of sockets registered under `url`.
    pub fn len(&self, url: &str) -> usize {
        self.lock().get(url).map_or(0, Vec::len)
    }

    /// Total number of sockets across all URLs.
    pub fn total(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Returns `true` if no sockets are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if `id` is registered under `url`.
    pub fn contains(&self, url: &str, id: ConnectionId) -> bool {
        self.lock()
            .get(url)
            .is_some_and(|sockets| sockets.iter().any(|(sid, _)| *sid == id))
    }

    /// Removes and returns every socket in the pool.
    pub fn drain(&self) -> Vec<T> {
        self.lock()
            .drain()
            .flat_map(|(_, sockets)| sockets.into_iter().map(|(_, s)| s))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<(ConnectionId, T)>>> {
        // A poisoned pool still holds valid entries; keep using it.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
