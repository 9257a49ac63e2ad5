//! Keyed store of in-flight and completed backend responses.
//!
//! Every page-level resource lives here under a stable logical key
//! ("project", "forms", "backupsConfig"). An entry is created when a fetch
//! starts, resolved or rejected when the transport answers, and removed when
//! the data-retention stage decides the next page must not see it.
//!
//! Each fetch carries a request id. A write-back only lands if its id still
//! matches the entry, so a resolution racing a clear or a replacing fetch is
//! discarded no matter which side finishes first. Clearing also aborts the
//! transport future through its cancellation token.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::shell::Transport;

// ============================================================================
// Entry states
// ============================================================================

/// Observable state of one data key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataState {
    /// No entry: never fetched, or cleared.
    Absent,
    /// A fetch is in flight.
    Pending,
    /// The backend answered with a value.
    Resolved(Value),
    /// The backend answered with an error.
    Rejected(TransportError),
}

impl DataState {
    pub fn is_absent(&self) -> bool {
        matches!(self, DataState::Absent)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DataState::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, DataState::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, DataState::Rejected(_))
    }

    /// The resolved value, if this state holds one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            DataState::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

enum EntryState {
    Pending,
    Resolved(Value),
    Rejected(TransportError),
}

struct Entry {
    state: EntryState,
    /// Id of the fetch (or direct write) that owns this entry.
    request_id: u64,
    /// Abort handle for the in-flight fetch, present while pending.
    cancel: Option<CancellationToken>,
}

impl Entry {
    fn resolved_value(&self) -> Option<&Value> {
        match &self.state {
            EntryState::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// Watchers
// ============================================================================

/// Callback invoked when a watched key's value changes.
///
/// Receives the new resolved value, or `None` when the value is discarded.
pub type WatchCallback = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Active subscription to one data key. Dropping it unsubscribes.
pub struct WatcherHandle {
    key: String,
    id: u64,
    store: Weak<DataStore>,
}

impl WatcherHandle {
    /// The key this subscription watches.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            let mut watchers = store.watchers.lock().unwrap();
            if let Some(list) = watchers.get_mut(&self.key) {
                list.retain(|(id, _)| *id != self.id);
                if list.is_empty() {
                    watchers.remove(&self.key);
                }
            }
        }
    }
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

// ============================================================================
// Store
// ============================================================================

/// Process-wide cache of backend responses, keyed by logical name.
pub struct DataStore {
    transport: Arc<dyn Transport>,
    entries: Mutex<HashMap<String, Entry>>,
    watchers: Mutex<HashMap<String, Vec<(u64, WatchCallback)>>>,
    next_request_id: AtomicU64,
    next_watcher_id: AtomicU64,
}

impl DataStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            entries: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            next_request_id: AtomicU64::new(0),
            next_watcher_id: AtomicU64::new(0),
        }
    }

    /// State of `key` right now.
    pub fn state(&self, key: &str) -> DataState {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            None => DataState::Absent,
            Some(entry) => match &entry.state {
                EntryState::Pending => DataState::Pending,
                EntryState::Resolved(value) => DataState::Resolved(value.clone()),
                EntryState::Rejected(err) => DataState::Rejected(err.clone()),
            },
        }
    }

    /// The resolved value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|e| e.resolved_value().cloned())
    }

    /// Whether a fetch for `key` is in flight.
    pub fn is_pending(&self, key: &str) -> bool {
        self.state(key).is_pending()
    }

    /// Snapshot of every key with an entry, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Fetch `url` into `key`.
    ///
    /// Replaces any in-flight fetch for the same key, aborting it. The
    /// returned value is also written into the store unless the entry was
    /// cleared or replaced while the request was in flight; in that case the
    /// result is discarded and `Cancelled` is returned.
    pub async fn fetch(&self, key: &str, url: &str) -> Result<Value, TransportError> {
        let token = CancellationToken::new();
        let request_id = {
            let mut entries = self.entries.lock().unwrap();
            if let Some(existing) = entries.get(key) {
                if let Some(previous) = &existing.cancel {
                    crate::debug_log!("replacing in-flight fetch for '{}'", key);
                    previous.cancel();
                }
            }
            let id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
            entries.insert(
                key.to_string(),
                Entry {
                    state: EntryState::Pending,
                    request_id: id,
                    cancel: Some(token.clone()),
                },
            );
            id
        };
        crate::trace_log!("fetch started for '{}': {}", key, url);

        let request = self.transport.fetch(url);
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransportError::Cancelled),
            result = request => result,
        };

        self.complete_fetch(key, request_id, outcome)
    }

    /// Write `outcome` into `key` if the fetch identified by `request_id`
    /// still owns the entry; otherwise discard it.
    fn complete_fetch(
        &self,
        key: &str,
        request_id: u64,
        outcome: Result<Value, TransportError>,
    ) -> Result<Value, TransportError> {
        let resolved = {
            let mut entries = self.entries.lock().unwrap();
            let current = entries
                .get(key)
                .is_some_and(|entry| entry.request_id == request_id);
            if !current {
                crate::debug_log!("discarding stale result for '{}'", key);
                return Err(TransportError::Cancelled);
            }
            match &outcome {
                Ok(value) => {
                    entries.insert(
                        key.to_string(),
                        Entry {
                            state: EntryState::Resolved(value.clone()),
                            request_id,
                            cancel: None,
                        },
                    );
                    Some(value.clone())
                }
                Err(TransportError::Cancelled) => {
                    // Aborted before any data arrived.
                    entries.remove(key);
                    None
                }
                Err(err) => {
                    crate::debug_log!("fetch for '{}' rejected: {}", key, err);
                    entries.insert(
                        key.to_string(),
                        Entry {
                            state: EntryState::Rejected(err.clone()),
                            request_id,
                            cancel: None,
                        },
                    );
                    None
                }
            }
        };

        if let Some(value) = &resolved {
            self.notify(key, Some(value));
        }
        outcome
    }

    /// Write a value directly, as after a login or a local mutation.
    ///
    /// Invalidates any fetch in flight for the key.
    pub fn write(&self, key: &str, value: Value) {
        {
            let mut entries = self.entries.lock().unwrap();
            if let Some(existing) = entries.get(key) {
                if let Some(token) = &existing.cancel {
                    token.cancel();
                }
            }
            let id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
            entries.insert(
                key.to_string(),
                Entry {
                    state: EntryState::Resolved(value.clone()),
                    request_id: id,
                    cancel: None,
                },
            );
        }
        self.notify(key, Some(&value));
    }

    /// Remove `key` entirely, aborting any fetch in flight for it.
    ///
    /// Watchers are told only when a resolved value was actually discarded.
    pub fn clear(&self, key: &str) {
        let had_value = {
            let mut entries = self.entries.lock().unwrap();
            match entries.remove(key) {
                None => return,
                Some(entry) => {
                    if let Some(token) = &entry.cancel {
                        token.cancel();
                    }
                    entry.resolved_value().is_some()
                }
            }
        };
        crate::debug_log!("cleared data for '{}'", key);
        if had_value {
            self.notify(key, None);
        }
    }

    /// Abort the in-flight fetch for `key`, leaving resolved data untouched.
    pub fn cancel(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(key) {
            if matches!(entry.state, EntryState::Pending) {
                if let Some(token) = &entry.cancel {
                    token.cancel();
                }
                entries.remove(key);
                crate::debug_log!("cancelled fetch for '{}'", key);
            }
        }
    }

    /// Subscribe to value changes for `key`.
    ///
    /// The callback receives `Some` on every resolved write and `None` when
    /// the value is cleared. The subscription lasts until the handle drops.
    pub fn watch(self: &Arc<Self>, key: &str, callback: WatchCallback) -> WatcherHandle {
        let id = self.next_watcher_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.watchers
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push((id, callback));
        WatcherHandle {
            key: key.to_string(),
            id,
            store: Arc::downgrade(self),
        }
    }

    /// Number of active subscriptions, across all keys.
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().unwrap().values().map(Vec::len).sum()
    }

    fn notify(&self, key: &str, value: Option<&Value>) {
        let callbacks: Vec<WatchCallback> = {
            let watchers = self.watchers.lock().unwrap();
            match watchers.get(key) {
                None => return,
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            }
        };
        for callback in callbacks {
            callback(value);
        }
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock().unwrap();
        let mut states: Vec<(&String, &str)> = entries
            .iter()
            .map(|(key, entry)| {
                let state = match entry.state {
                    EntryState::Pending => "pending",
                    EntryState::Resolved(_) => "resolved",
                    EntryState::Rejected(_) => "rejected",
                };
                (key, state)
            })
            .collect();
        states.sort();
        f.debug_struct("DataStore").field("entries", &states).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct NoTransport;

    impl Transport for NoTransport {
        fn fetch(
            &self,
            _url: &str,
        ) -> futures::future::BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async { Err(TransportError::Network { message: "offline".into() }) })
        }

        fn restore_session(
            &self,
        ) -> futures::future::BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async { Err(TransportError::Status { code: 404, message: String::new() }) })
        }

        fn log_in(
            &self,
            _email: &str,
            _password: &str,
        ) -> futures::future::BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async { Err(TransportError::Status { code: 401, message: String::new() }) })
        }

        fn log_out(
            &self,
            _token: &str,
        ) -> futures::future::BoxFuture<'static, Result<(), TransportError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn store() -> Arc<DataStore> {
        Arc::new(DataStore::new(Arc::new(NoTransport)))
    }

    #[test]
    fn test_write_and_get() {
        let store = store();
        assert_eq!(store.state("project"), DataState::Absent);

        store.write("project", json!({"id": 1}));
        assert_eq!(store.get("project"), Some(json!({"id": 1})));
        assert!(store.state("project").is_resolved());
    }

    #[test]
    fn test_clear_removes_entry() {
        let store = store();
        store.write("project", json!({"id": 1}));
        store.clear("project");

        assert_eq!(store.state("project"), DataState::Absent);
        assert_eq!(store.get("project"), None);
    }

    #[test]
    fn test_watch_sees_writes_and_clears() {
        let store = store();
        let seen: Arc<Mutex<Vec<Option<Value>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = store.watch(
            "backupsConfig",
            Arc::new(move |value| sink.lock().unwrap().push(value.cloned())),
        );

        store.write("backupsConfig", json!({"setAt": "2024-01-01"}));
        store.clear("backupsConfig");
        // Clearing an absent key notifies nobody.
        store.clear("backupsConfig");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Some(json!({"setAt": "2024-01-01"})));
        assert_eq!(seen[1], None);
    }

    #[test]
    fn test_dropped_handle_unsubscribes() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = store.watch(
            "project",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(store.watcher_count(), 1);

        drop(handle);
        assert_eq!(store.watcher_count(), 0);

        store.write("project", json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stale_completion_discarded() {
        let store = store();
        store.write("forms", json!([1, 2]));

        // A completion whose request id no longer owns the entry is dropped.
        let result = store.complete_fetch("forms", 0, Ok(json!([3])));
        assert_eq!(result, Err(TransportError::Cancelled));
        assert_eq!(store.get("forms"), Some(json!([1, 2])));
    }
}
