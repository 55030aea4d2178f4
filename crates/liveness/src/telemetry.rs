//! Attempt counting and session-start telemetry.
//!
//! Every session start tells the service how many attempts the user has
//! made recently and whether a pre-check screen was shown. The counter
//! lives in a caller-supplied [`KeyValueStore`] so it survives across
//! sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use liveness_protocol::endpoint::{ATTEMPT_COUNT_PARAM, PRECHECK_VIEW_ENABLED_PARAM};
use liveness_tick::Clock;
use liveness_transport::ConnectRequest;

/// Storage key of the attempt record.
pub const ATTEMPT_KEY: &str = "LivenessAttempt";

/// Attempts further apart than this start a fresh count.
pub const ATTEMPT_WINDOW_MS: u64 = 300_000;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Durable string storage, such as a browser's local storage or a file.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value)
    }
}

/// A process-local [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

// ---------------------------------------------------------------------------
// Attempt tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct AttemptRecord {
    timestamp: u64,
    count: u32,
}

/// Counts session attempts within a rolling window.
pub struct AttemptTracker<S, C> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> AttemptTracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Records an attempt and returns its number.
    ///
    /// The count restarts at 1 when there is no record or the last attempt
    /// is older than [`ATTEMPT_WINDOW_MS`]; otherwise it goes up by one.
    /// The stored timestamp is always moved to now.
    pub fn attempt_count(&self) -> u32 {
        let now = self.clock.now_ms();
        let previous = self.load();

        let count = match previous {
            Some(record) if now.saturating_sub(record.timestamp) <= ATTEMPT_WINDOW_MS => {
                record.count.saturating_add(1)
            }
            _ => 1,
        };

        let record = AttemptRecord {
            timestamp: now,
            count,
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.store.set(ATTEMPT_KEY, json),
            Err(e) => tracing::warn!(error = %e, "failed to encode attempt record"),
        }
        tracing::debug!(count, "liveness attempt recorded");
        count
    }

    fn load(&self) -> Option<AttemptRecord> {
        let raw = self.store.get(ATTEMPT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable attempt record");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request decoration
// ---------------------------------------------------------------------------

/// The telemetry sent with every session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryQuery {
    pub attempt_count: u32,
    pub precheck_view_enabled: bool,
}

impl TelemetryQuery {
    /// Adds the telemetry query parameters to `request`.
    pub fn apply(&self, request: &mut ConnectRequest) {
        request.set_query(ATTEMPT_COUNT_PARAM, self.attempt_count.to_string());
        request.set_query(
            PRECHECK_VIEW_ENABLED_PARAM,
            if self.precheck_view_enabled { "1" } else { "0" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveness_tick::ManualClock;
    use std::sync::Arc;

    fn tracker(clock: &ManualClock) -> (AttemptTracker<Arc<MemoryStore>, ManualClock>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AttemptTracker::new(Arc::clone(&store), clock.clone()), store)
    }

    #[test]
    fn test_attempt_count_starts_at_one() {
        let clock = ManualClock::new(1_000_000);
        let (tracker, _) = tracker(&clock);
        assert_eq!(tracker.attempt_count(), 1);
    }

    #[test]
    fn test_attempt_count_increments_within_window() {
        let clock = ManualClock::new(1_000_000);
        let (tracker, _) = tracker(&clock);
        tracker.attempt_count();
        clock.advance(60_000);
        assert_eq!(tracker.attempt_count(), 2);
        clock.advance(ATTEMPT_WINDOW_MS);
        assert_eq!(tracker.attempt_count(), 3);
    }

    #[test]
    fn test_attempt_count_resets_after_window() {
        let clock = ManualClock::new(1_000_000);
        let (tracker, _) = tracker(&clock);
        tracker.attempt_count();
        tracker.attempt_count();
        clock.advance(ATTEMPT_WINDOW_MS + 1);
        assert_eq!(tracker.attempt_count(), 1);
    }

    #[test]
    fn test_attempt_count_rewrites_timestamp() {
        let clock = ManualClock::new(1_000_000);
        let (tracker, store) = tracker(&clock);
        tracker.attempt_count();
        clock.advance(5_000);
        tracker.attempt_count();

        let record: AttemptRecord =
            serde_json::from_str(&store.get(ATTEMPT_KEY).unwrap()).unwrap();
        assert_eq!(record.timestamp, 1_005_000);
        assert_eq!(record.count, 2);
    }

    #[test]
    fn test_attempt_count_survives_garbage_record() {
        let clock = ManualClock::new(1_000_000);
        let (tracker, store) = tracker(&clock);
        store.set(ATTEMPT_KEY, "not json".into());
        assert_eq!(tracker.attempt_count(), 1);
    }

    #[test]
    fn test_telemetry_query_sets_params() {
        let mut request = ConnectRequest::new("ws://svc");
        TelemetryQuery {
            attempt_count: 4,
            precheck_view_enabled: false,
        }
        .apply(&mut request);
        assert_eq!(request.query_value(ATTEMPT_COUNT_PARAM), Some("4"));
        assert_eq!(request.query_value(PRECHECK_VIEW_ENABLED_PARAM), Some("0"));
    }
}
