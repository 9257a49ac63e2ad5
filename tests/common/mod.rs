//! Shared fixtures for the integration suites.
//!
//! Provides a scriptable [`FakeTransport`], a route table shaped like a real
//! project-management client, and builders wiring both into a [`Navigator`]
//! with a recording shell.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::Notify;

use fieldwork_navigator::{
    HeadlessShell, Navigator, NavigatorBuilder, Route, RouteTable, Shell, Transport,
    TransportError,
};

// ============================================================================
// Scriptable transport
// ============================================================================

/// [`Transport`] whose responses are canned per URL. Any URL may be gated so
/// its future stays pending until the test releases it.
pub struct FakeTransport {
    responses: Mutex<HashMap<String, Result<Value, TransportError>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fetch_log: Mutex<Vec<String>>,
    restore_response: Mutex<Result<Value, TransportError>>,
    restore_gate: Mutex<Option<Arc<Notify>>>,
    restore_calls: AtomicUsize,
    login_response: Mutex<Result<Value, TransportError>>,
}

impl FakeTransport {
    /// A backend with no cookie session and no canned responses.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            fetch_log: Mutex::new(Vec::new()),
            restore_response: Mutex::new(Err(TransportError::Status {
                code: 404,
                message: "no session cookie".into(),
            })),
            restore_gate: Mutex::new(None),
            restore_calls: AtomicUsize::new(0),
            login_response: Mutex::new(Err(TransportError::Status {
                code: 401,
                message: "bad credentials".into(),
            })),
        }
    }

    /// Can a successful JSON response for `url`.
    pub fn respond(&self, url: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(value));
    }

    /// Can a failure for `url`.
    pub fn fail(&self, url: &str, error: TransportError) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }

    /// Hold responses for `url` until [`release`](Self::release) is called.
    pub fn gate(&self, url: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::new(Notify::new()));
    }

    /// Release one pending (or future) request to a gated `url`.
    pub fn release(&self, url: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(url) {
            gate.notify_one();
        }
    }

    pub fn set_restore(&self, response: Result<Value, TransportError>) {
        *self.restore_response.lock().unwrap() = response;
    }

    /// Hold the session-restore response until released.
    pub fn gate_restore(&self) {
        *self.restore_gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_restore(&self) {
        if let Some(gate) = self.restore_gate.lock().unwrap().as_ref() {
            gate.notify_one();
        }
    }

    pub fn set_login(&self, response: Result<Value, TransportError>) {
        *self.login_response.lock().unwrap() = response;
    }

    /// How many times the session restore endpoint was hit.
    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }

    /// Every fetched URL, oldest first.
    pub fn fetches(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Value, TransportError>> {
        self.fetch_log.lock().unwrap().push(url.to_string());
        let gate = self.gates.lock().unwrap().get(url).cloned();
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Status {
                    code: 404,
                    message: format!("no canned response for {url}"),
                })
            });
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            response
        })
    }

    fn restore_session(&self) -> BoxFuture<'static, Result<Value, TransportError>> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.restore_gate.lock().unwrap().clone();
        let response = self.restore_response.lock().unwrap().clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            response
        })
    }

    fn log_in(
        &self,
        _email: &str,
        _password: &str,
    ) -> BoxFuture<'static, Result<Value, TransportError>> {
        let response = self.login_response.lock().unwrap().clone();
        Box::pin(async move { response })
    }

    fn log_out(&self, _token: &str) -> BoxFuture<'static, Result<(), TransportError>> {
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A session body the backend would return, expiring `expires_in_hours` from
/// now.
pub fn session_json(expires_in_hours: i64) -> Value {
    json!({
        "token": "fixture-token",
        "createdAt": Utc::now().to_rfc3339(),
        "expiresAt": (Utc::now() + Duration::hours(expires_in_hours)).to_rfc3339(),
    })
}

/// Route table shaped like a project-management client: a login view, an
/// account page, and a project area with nested forms.
pub fn fixture_table() -> RouteTable {
    RouteTable::new(vec![
        Route::new("/login", "AccountLogin")
            .anonymity_required()
            .title_static("Log in"),
        Route::new("/", "Home").title_static("Home"),
        Route::new("/reset-password", "AccountResetPassword")
            .anonymity_required()
            .skip_session_restore(),
        Route::new("/account/edit", "AccountEdit").login_required(),
        Route::new("/projects/:projectId", "ProjectLayout")
            .login_required()
            .load_async("ProjectLayout")
            .child(
                Route::new("", "ProjectOverview")
                    .login_required()
                    .load_async("ProjectOverview")
                    .validate("project", |project| project["archived"] != true)
                    .title_from("project", |project| {
                        project["name"].as_str().map(String::from)
                    })
                    .preserve_when_params_equal("project", &["projectId"]),
            )
            .child(
                Route::new("forms/:xmlFormId", "FormShow")
                    .login_required()
                    .load_async("FormShow")
                    .validate("project", |project| project["archived"] != true)
                    .title_from("form", |form| form["name"].as_str().map(String::from))
                    .preserve_when_params_equal("project", &["projectId"]),
            ),
    ])
    .preserve_everywhere("session")
}

/// Everything a pipeline test needs to drive and observe a navigator.
pub struct Fixture {
    pub navigator: Navigator,
    pub transport: Arc<FakeTransport>,
    pub shell: Arc<HeadlessShell>,
}

/// Build a fixture around `transport`, with a hook for extra builder calls.
pub fn build_fixture(
    transport: FakeTransport,
    configure: impl FnOnce(NavigatorBuilder) -> NavigatorBuilder,
) -> Fixture {
    let transport = Arc::new(transport);
    let shell = Arc::new(HeadlessShell::new());
    let builder = Navigator::builder(fixture_table(), Arc::clone(&transport) as Arc<dyn Transport>)
        .shell(Arc::clone(&shell) as Arc<dyn Shell>);
    let navigator = configure(builder).build();
    Fixture {
        navigator,
        transport,
        shell,
    }
}

/// Fixture with no cookie session: the user starts anonymous.
pub fn fixture() -> Fixture {
    build_fixture(FakeTransport::new(), |builder| builder)
}

/// Fixture whose session restore succeeds: the user starts logged in.
pub fn logged_in_fixture() -> Fixture {
    let transport = FakeTransport::new();
    transport.set_restore(Ok(session_json(24)));
    build_fixture(transport, |builder| builder)
}

/// Let spawned work (preloads, watcher-triggered redirects) run to
/// completion on the current-thread runtime.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
