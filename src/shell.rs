//! Host integration seams.
//!
//! The navigator core stays host-agnostic: everything that touches the
//! backend, durable client storage, or the user-facing chrome goes through
//! the traits here. [`HeadlessShell`] and [`MemoryClientStore`] are the
//! in-process implementations used by the demos and the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::TransportError;

// ============================================================================
// Transport
// ============================================================================

/// Backend access for session and page data.
pub trait Transport: Send + Sync {
    /// Fetch a resource as JSON.
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Value, TransportError>>;

    /// Restore the cookie-backed session, if the backend has one for us.
    fn restore_session(&self) -> BoxFuture<'static, Result<Value, TransportError>>;

    /// Establish a session from credentials.
    fn log_in(
        &self,
        email: &str,
        password: &str,
    ) -> BoxFuture<'static, Result<Value, TransportError>>;

    /// Invalidate the session behind `token`.
    fn log_out(&self, token: &str) -> BoxFuture<'static, Result<(), TransportError>>;
}

// ============================================================================
// Client storage
// ============================================================================

/// Durable key-value storage on the client (locale preference and the like).
pub trait ClientStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`ClientStore`].
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryClientStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

// ============================================================================
// Shell
// ============================================================================

/// User-facing chrome the navigator drives directly.
pub trait Shell: Send + Sync {
    /// Set the window or document title.
    fn set_title(&self, title: &str);

    /// Ask the user to confirm leaving unsaved work. `true` proceeds with
    /// the navigation, `false` keeps the current page.
    fn confirm(&self, message: &str) -> bool;
}

/// [`Shell`] with no UI: records titles and answers confirms from a flag.
#[derive(Debug)]
pub struct HeadlessShell {
    titles: Mutex<Vec<String>>,
    confirm_response: AtomicBool,
    confirms_asked: AtomicUsize,
}

impl HeadlessShell {
    /// A shell that confirms every prompt.
    pub fn new() -> Self {
        Self {
            titles: Mutex::new(Vec::new()),
            confirm_response: AtomicBool::new(true),
            confirms_asked: AtomicUsize::new(0),
        }
    }

    /// Choose the answer future confirm prompts receive.
    pub fn set_confirm_response(&self, response: bool) {
        self.confirm_response.store(response, Ordering::SeqCst);
    }

    /// Every title set so far, oldest first.
    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    /// The most recent title, if any was set.
    pub fn last_title(&self) -> Option<String> {
        self.titles.lock().unwrap().last().cloned()
    }

    /// How many confirm prompts have been shown.
    pub fn confirms_asked(&self) -> usize {
        self.confirms_asked.load(Ordering::SeqCst)
    }
}

impl Default for HeadlessShell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell for HeadlessShell {
    fn set_title(&self, title: &str) {
        crate::trace_log!("title set: {}", title);
        self.titles.lock().unwrap().push(title.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms_asked.fetch_add(1, Ordering::SeqCst);
        let response = self.confirm_response.load(Ordering::SeqCst);
        crate::debug_log!("confirm '{}': {}", message, response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_client_store() {
        let store = MemoryClientStore::new();
        assert_eq!(store.get("locale"), None);

        store.set("locale", "es");
        assert_eq!(store.get("locale"), Some("es".to_string()));

        store.remove("locale");
        assert_eq!(store.get("locale"), None);
    }

    #[test]
    fn test_headless_shell_records_titles() {
        let shell = HeadlessShell::new();
        shell.set_title("Projects | Fieldwork");
        shell.set_title("Users | Fieldwork");

        assert_eq!(shell.last_title(), Some("Users | Fieldwork".to_string()));
        assert_eq!(shell.titles().len(), 2);
    }

    #[test]
    fn test_headless_shell_confirm_response() {
        let shell = HeadlessShell::new();
        assert!(shell.confirm("Leave without saving?"));

        shell.set_confirm_response(false);
        assert!(!shell.confirm("Leave without saving?"));
        assert_eq!(shell.confirms_asked(), 2);
    }
}
