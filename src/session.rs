//! Session lifecycle: restore, login, logout.
//!
//! The session lives in the [`DataStore`] under [`SESSION_KEY`], so the
//! guard pipeline and post-entry watchers observe it like any other cached
//! response. Restoration runs at most once per application lifetime; a
//! failed restore leaves the session absent, indistinguishable from never
//! having had one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::shell::Transport;
use crate::store::DataStore;

/// Data key the session is cached under.
pub const SESSION_KEY: &str = "session";

/// The authenticated principal a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: i64,
    pub display_name: String,
}

/// An authenticated session returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub principal: Option<Principal>,
}

impl Session {
    /// Whether the session's expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Reads and mutates the session entry in the data store.
pub struct SessionStore {
    store: Arc<DataStore>,
    transport: Arc<dyn Transport>,
    restore_attempted: AtomicBool,
}

impl SessionStore {
    pub fn new(store: Arc<DataStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            transport,
            restore_attempted: AtomicBool::new(false),
        }
    }

    /// The active session, if one exists and has not expired.
    pub fn current(&self) -> Option<Session> {
        let value = self.store.get(SESSION_KEY)?;
        match serde_json::from_value::<Session>(value) {
            Ok(session) if session.is_expired() => None,
            Ok(session) => Some(session),
            Err(err) => {
                crate::warn_log!("malformed session entry: {}", err);
                None
            }
        }
    }

    /// Whether an unexpired session exists.
    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }

    /// Exchange the stored credential for a session, at most once per
    /// application lifetime.
    ///
    /// Returns whether a session exists afterwards. Every failure mode
    /// (no stored credential, backend rejection, network error, expired
    /// session) leaves the session absent.
    pub async fn restore(&self) -> bool {
        if self.restore_attempted.swap(true, Ordering::SeqCst) {
            return self.is_logged_in();
        }
        match self.transport.restore_session().await {
            Ok(value) => self.accept(value, "restore"),
            Err(err) => {
                crate::debug_log!("session restore failed: {}", err);
            }
        }
        self.is_logged_in()
    }

    /// Establish a session from credentials and cache it.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<Session, TransportError> {
        let value = self.transport.log_in(email, password).await?;
        let session: Session =
            serde_json::from_value(value.clone()).map_err(|err| TransportError::Network {
                message: format!("malformed login response: {err}"),
            })?;
        self.store.write(SESSION_KEY, value);
        crate::info_log!("logged in");
        Ok(session)
    }

    /// Invalidate the current session.
    ///
    /// The local entry is cleared even when the backend call fails, so the
    /// client never keeps a session the user asked to end.
    pub async fn log_out(&self) -> Result<(), TransportError> {
        let token = self.current().map(|session| session.token);
        self.store.clear(SESSION_KEY);
        if let Some(token) = token {
            self.transport.log_out(&token).await?;
            crate::info_log!("logged out");
        }
        Ok(())
    }

    fn accept(&self, value: Value, origin: &str) {
        match serde_json::from_value::<Session>(value.clone()) {
            Ok(session) if session.is_expired() => {
                crate::debug_log!("session from {} already expired", origin);
            }
            Ok(_) => {
                self.store.write(SESSION_KEY, value);
                crate::info_log!("session restored");
            }
            Err(err) => {
                crate::warn_log!("malformed session from {}: {}", origin, err);
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.is_logged_in())
            .field(
                "restore_attempted",
                &self.restore_attempted.load(Ordering::SeqCst),
            )
            .finish_non_exhaustive()
    }
}
