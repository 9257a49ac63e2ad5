//! The navigator: route transitions through the guard pipeline.
//!
//! This module provides the central navigation object. It owns the
//! [`RouterState`](crate::RouterState), the route table, and every store the
//! guard stages consult, and it orchestrates the full transition pipeline:
//!
//! 1. **Bootstrap** (first transition only) — load the locale and, when the
//!    terminal descriptor asks for it, restore the session. Runs exactly once
//!    per application lifetime; failures fall back to defaults.
//! 2. **Authorization** — `require_login` / `require_anonymity` checks.
//! 3. **Data validity** — `validate_data` predicates against resolved values.
//! 4. **Unsaved changes** — confirm prompt; declining retains the current
//!    route.
//! 5. **Data retention** — clear cached responses the new route does not
//!    preserve, aborting their in-flight fetches.
//! 6. **View preloading** — kick off the async view of every descriptor in
//!    the matched chain without waiting.
//! 7. **Watcher rewiring** — tear down old subscriptions, subscribe the new
//!    route's validity and title watchers.
//! 8. **Ambient cleanup** — dismiss the visible alert and recompute the
//!    title.
//!
//! Stages 2 through 4 run before the route commits, so an abort never leaves
//! the displayed path and the committed route disagreeing. A navigation
//! started while another is still inside the pipeline supersedes it: the
//! older transition re-checks its navigation id after every suspension point
//! and before the commit, and applies none of its remaining effects once
//! stale. Redirects issued by a stage replay the pipeline from stage 2 with
//! a fresh navigation id, up to [`MAX_REDIRECT_DEPTH`] levels deep.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::OnceCell;

#[cfg(feature = "cache")]
use crate::cache::ResolveCache;
use crate::error::{NavigationError, NavigationResult, TransportError};
use crate::guards::{self, StageAction};
use crate::loader::{LoadFn, ViewLoader};
use crate::locale::{LocaleLoader, LocaleStore};
use crate::params::{split_path_query, QueryParams};
use crate::resolve::{resolve_match_stack, MatchStack};
use crate::route::{RouteMeta, RouteTable};
use crate::session::{Session, SessionStore};
use crate::shell::{ClientStore, HeadlessShell, MemoryClientStore, Shell, Transport};
use crate::state::RouterState;
use crate::store::{DataStore, WatcherHandle};
use crate::{debug_log, error_log, info_log, warn_log};

/// Maximum redirect depth to prevent infinite redirect loops.
pub const MAX_REDIRECT_DEPTH: usize = 5;

/// Client-store key holding the user's locale preference.
pub const LOCALE_STORAGE_KEY: &str = "locale";

// ============================================================================
// Navigation operation type
// ============================================================================

/// Internal enum for the kind of history change to perform after the
/// pre-entry stages pass.
#[derive(Debug, Clone, Copy)]
enum NavigateOp {
    Push,
    Replace,
    Back,
    Forward,
}

impl NavigateOp {
    /// History operation for a redirect replacing this navigation. A
    /// redirected back/forward becomes a push; the original entry never
    /// committed.
    fn for_redirect(self) -> Self {
        match self {
            NavigateOp::Replace => NavigateOp::Replace,
            _ => NavigateOp::Push,
        }
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Application navigator.
///
/// Cheap to clone; all clones share the same state, stores, and history.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fieldwork_navigator::navigator::Navigator;
/// use fieldwork_navigator::route::{Route, RouteTable};
/// # use fieldwork_navigator::shell::Transport;
/// # fn transport() -> Arc<dyn Transport> { unimplemented!() }
///
/// # async fn run() {
/// let table = RouteTable::new(vec![
///     Route::new("/login", "AccountLogin").anonymity_required(),
///     Route::new("/projects/:projectId", "ProjectShow").login_required(),
/// ])
/// .preserve_everywhere("session");
///
/// let navigator = Navigator::builder(table, transport()).build();
/// let result = navigator.push("/projects/1").await;
/// assert!(result.is_success() || result.is_blocked());
/// # }
/// ```
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

struct NavigatorInner {
    table: RouteTable,
    state: Mutex<RouterState>,
    #[cfg(feature = "cache")]
    resolve_cache: Mutex<ResolveCache>,
    data: Arc<DataStore>,
    sessions: SessionStore,
    loader: Arc<ViewLoader>,
    locales: LocaleStore,
    alerts: crate::alert::AlertStore,
    shell: Arc<dyn Shell>,
    client_store: Arc<dyn ClientStore>,
    app_name: String,
    login_path: String,
    default_path: String,
    bootstrap: OnceCell<()>,
    watchers: Mutex<Vec<WatcherHandle>>,
}

impl Navigator {
    /// Start building a navigator for `table`, with `transport` as the HTTP
    /// boundary.
    pub fn builder(table: RouteTable, transport: Arc<dyn Transport>) -> NavigatorBuilder {
        NavigatorBuilder::new(table, transport)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate to a path, running the full guard pipeline.
    pub async fn push(&self, path: impl Into<String>) -> NavigationResult {
        let full = path.into();
        let nav_id = self.inner.state.lock().unwrap().start_navigation();
        self.inner
            .run_pipeline(full, NavigateOp::Push, nav_id, 0)
            .await
    }

    /// Replace the current path, running the full guard pipeline.
    pub async fn replace(&self, path: impl Into<String>) -> NavigationResult {
        let full = path.into();
        let nav_id = self.inner.state.lock().unwrap().start_navigation();
        self.inner
            .run_pipeline(full, NavigateOp::Replace, nav_id, 0)
            .await
    }

    /// Go back in history, checking guards on the target route.
    pub async fn back(&self) -> Option<NavigationResult> {
        let (target, nav_id) = {
            let state = self.inner.state.lock().unwrap();
            let target = state.peek_back_path()?.to_string();
            (target, state.start_navigation())
        };
        Some(
            self.inner
                .run_pipeline(target, NavigateOp::Back, nav_id, 0)
                .await,
        )
    }

    /// Go forward in history, checking guards on the target route.
    pub async fn forward(&self) -> Option<NavigationResult> {
        let (target, nav_id) = {
            let state = self.inner.state.lock().unwrap();
            let target = state.peek_forward_path()?.to_string();
            (target, state.start_navigation())
        };
        Some(
            self.inner
                .run_pipeline(target, NavigateOp::Forward, nav_id, 0)
                .await,
        )
    }

    /// Replace the current path, discarding unsaved changes without a
    /// prompt. Used when staying on the page is not an option, such as when
    /// its data has become invalid.
    pub async fn force_replace(&self, path: impl Into<String>) -> NavigationResult {
        self.inner.force_replace(path.into()).await
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Log in and navigate to the page the user originally asked for.
    ///
    /// When the current route carries a `next` query parameter (put there by
    /// the authorization stage), the post-login navigation goes there;
    /// otherwise it goes to the default view.
    pub async fn log_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<NavigationResult, TransportError> {
        self.inner.sessions.log_in(email, password).await?;
        let next = {
            let state = self.inner.state.lock().unwrap();
            state.current_full_path().and_then(|full| {
                let (_, query) = split_path_query(full);
                query.and_then(|q| {
                    QueryParams::from_query_string(q)
                        .get("next")
                        .map(String::from)
                })
            })
        };
        let target = next.unwrap_or_else(|| self.inner.default_path.clone());
        Ok(self.push(target).await)
    }

    /// Log out and return to the login view.
    pub async fn log_out(&self) -> Result<NavigationResult, TransportError> {
        self.inner.sessions.log_out().await?;
        Ok(self.force_replace(self.inner.login_path.clone()).await)
    }

    /// Whether an unexpired session exists.
    pub fn is_logged_in(&self) -> bool {
        self.inner.sessions.is_logged_in()
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.sessions.current()
    }

    // ========================================================================
    // Locale
    // ========================================================================

    /// Switch the locale and persist the preference.
    pub async fn set_locale(&self, tag: &str) -> Result<(), TransportError> {
        self.inner.locales.activate(tag).await?;
        self.inner
            .client_store
            .set(LOCALE_STORAGE_KEY, &self.inner.locales.active());
        Ok(())
    }

    /// The locale currently in effect.
    pub fn locale(&self) -> String {
        self.inner.locales.active()
    }

    // ========================================================================
    // Unsaved changes
    // ========================================================================

    /// Mark the current page as holding (or no longer holding) unsaved
    /// edits. While set, leaving the page prompts for confirmation.
    pub fn set_unsaved_changes(&self, value: bool) {
        self.inner.state.lock().unwrap().set_unsaved_changes(value);
    }

    /// Whether the host should warn before unloading the application, as for
    /// a browser `beforeunload` prompt.
    pub fn should_block_unload(&self) -> bool {
        self.inner.state.lock().unwrap().unsaved_changes()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The committed path, including any query string. `None` until the
    /// first transition commits.
    pub fn current_path(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .unwrap()
            .current_full_path()
            .map(String::from)
    }

    /// Route params of the committed route.
    pub fn current_params(&self) -> crate::RouteParams {
        self.inner.state.lock().unwrap().current_params().clone()
    }

    /// View identifier of the committed terminal descriptor.
    pub fn current_view(&self) -> Option<String> {
        let state = self.inner.state.lock().unwrap();
        state
            .current_stack()
            .leaf()
            .map(|entry| entry.route.view.clone())
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.state.lock().unwrap().can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.inner.state.lock().unwrap().can_go_forward()
    }

    /// The cached-response store.
    pub fn data(&self) -> &Arc<DataStore> {
        &self.inner.data
    }

    /// The async view loader.
    pub fn loader(&self) -> &Arc<ViewLoader> {
        &self.inner.loader
    }

    /// The transient alert store.
    pub fn alerts(&self) -> &crate::alert::AlertStore {
        &self.inner.alerts
    }

    /// Statistics for the resolve cache.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.inner.resolve_cache.lock().unwrap().stats().clone()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("current_path", &self.current_path())
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// NavigatorBuilder
// ============================================================================

/// Builder for [`Navigator`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fieldwork_navigator::navigator::Navigator;
/// use fieldwork_navigator::route::RouteTable;
/// # use fieldwork_navigator::shell::Transport;
/// # fn transport() -> Arc<dyn Transport> { unimplemented!() }
///
/// let navigator = Navigator::builder(RouteTable::default(), transport())
///     .app_name("Fieldwork")
///     .default_locale("en")
///     .build();
/// ```
#[must_use]
pub struct NavigatorBuilder {
    table: RouteTable,
    transport: Arc<dyn Transport>,
    shell: Arc<dyn Shell>,
    client_store: Arc<dyn ClientStore>,
    app_name: String,
    login_path: String,
    default_path: String,
    default_locale: String,
    locale_loader: Option<LocaleLoader>,
    view_loader: Option<LoadFn>,
}

impl NavigatorBuilder {
    /// Create a builder with headless shell and in-memory client storage.
    pub fn new(table: RouteTable, transport: Arc<dyn Transport>) -> Self {
        Self {
            table,
            transport,
            shell: Arc::new(HeadlessShell::new()),
            client_store: Arc::new(MemoryClientStore::new()),
            app_name: "Fieldwork".to_string(),
            login_path: "/login".to_string(),
            default_path: "/".to_string(),
            default_locale: crate::locale::FALLBACK_LOCALE.to_string(),
            locale_loader: None,
            view_loader: None,
        }
    }

    /// Shell driving titles and confirm prompts.
    pub fn shell(mut self, shell: Arc<dyn Shell>) -> Self {
        self.shell = shell;
        self
    }

    /// Durable client storage for the locale preference.
    pub fn client_store(mut self, client_store: Arc<dyn ClientStore>) -> Self {
        self.client_store = client_store;
        self
    }

    /// Application name appended to every document title.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Path of the login view (default `/login`).
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Path of the default view (default `/`).
    pub fn default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = path.into();
        self
    }

    /// Locale used when no preference is stored (default `en`).
    pub fn default_locale(mut self, tag: impl Into<String>) -> Self {
        self.default_locale = tag.into();
        self
    }

    /// Loader for locale message bundles.
    pub fn locale_loader(mut self, loader: LocaleLoader) -> Self {
        self.locale_loader = Some(loader);
        self
    }

    /// Loader backend for async view bundles.
    pub fn view_loader(mut self, loader: LoadFn) -> Self {
        self.view_loader = Some(loader);
        self
    }

    /// Build the navigator.
    pub fn build(self) -> Navigator {
        let data = Arc::new(DataStore::new(Arc::clone(&self.transport)));
        let sessions = SessionStore::new(Arc::clone(&data), Arc::clone(&self.transport));
        let loader = Arc::new(match self.view_loader {
            Some(load_fn) => ViewLoader::new(load_fn),
            None => ViewLoader::instant(),
        });
        let locales = match self.locale_loader {
            Some(loader) => LocaleStore::new(self.default_locale, loader),
            None => LocaleStore::accepting(self.default_locale),
        };
        Navigator {
            inner: Arc::new(NavigatorInner {
                table: self.table,
                state: Mutex::new(RouterState::new()),
                #[cfg(feature = "cache")]
                resolve_cache: Mutex::new(ResolveCache::new()),
                data,
                sessions,
                loader,
                locales,
                alerts: crate::alert::AlertStore::new(),
                shell: self.shell,
                client_store: self.client_store,
                app_name: self.app_name,
                login_path: self.login_path,
                default_path: self.default_path,
                bootstrap: OnceCell::new(),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

impl NavigatorInner {
    /// Core navigation method that runs the full pipeline.
    async fn run_pipeline(
        self: &Arc<Self>,
        full: String,
        op: NavigateOp,
        nav_id: usize,
        redirect_depth: usize,
    ) -> NavigationResult {
        if redirect_depth >= MAX_REDIRECT_DEPTH {
            error_log!(
                "redirect loop detected (depth {}) navigating to '{}'",
                redirect_depth,
                full
            );
            return NavigationResult::Error(NavigationError::TooManyRedirects { path: full });
        }

        let (path, _query) = split_path_query(&full);
        let stack = self.resolve(path);
        let meta = match stack.leaf_meta() {
            Some(meta) => meta.clone(),
            None => {
                warn_log!("no route matches '{}'", full);
                return NavigationResult::NotFound { path: full };
            }
        };

        let (from_full, from_params) = {
            let state = self.state.lock().unwrap();
            if !state.is_navigation_current(nav_id) {
                return NavigationResult::Superseded { path: full };
            }
            (
                state.current_full_path().map(String::from),
                state.current_params().clone(),
            )
        };
        info_log!(
            "navigation {:?}: '{}' → '{}'",
            op,
            from_full.as_deref().unwrap_or(""),
            full
        );

        // Stage 1: once per application start.
        self.bootstrap
            .get_or_init(|| self.run_bootstrap(&meta))
            .await;
        if !self.state.lock().unwrap().is_navigation_current(nav_id) {
            debug_log!("navigation to '{}' superseded during bootstrap", full);
            return NavigationResult::Superseded { path: full };
        }

        // Stage 2: authorization.
        match guards::check_authorization(
            &meta,
            self.sessions.is_logged_in(),
            &full,
            &self.login_path,
            &self.default_path,
        ) {
            StageAction::Proceed => {}
            StageAction::Redirect { to, reason } => {
                debug_log!(
                    "authorization redirecting '{}' → '{}' ({})",
                    full,
                    to,
                    reason.as_deref().unwrap_or("unspecified")
                );
                return self.redirect(full, to, op, nav_id, redirect_depth).await;
            }
            StageAction::Abort { reason } => {
                warn_log!("navigation to '{}' blocked: {}", full, reason);
                return NavigationResult::Blocked {
                    reason,
                    redirect: None,
                };
            }
        }

        // Stage 3: data validity.
        match guards::check_data_validity(&meta, &self.data, &self.default_path) {
            StageAction::Proceed => {}
            StageAction::Redirect { to, reason } => {
                debug_log!(
                    "invalid data redirecting '{}' → '{}' ({})",
                    full,
                    to,
                    reason.as_deref().unwrap_or("unspecified")
                );
                return self.redirect(full, to, op, nav_id, redirect_depth).await;
            }
            StageAction::Abort { reason } => {
                warn_log!("navigation to '{}' blocked: {}", full, reason);
                return NavigationResult::Blocked {
                    reason,
                    redirect: None,
                };
            }
        }

        // Stage 4: unsaved changes.
        let unsaved = self.state.lock().unwrap().unsaved_changes();
        if let StageAction::Abort { reason } = guards::check_unsaved_changes(unsaved, self.shell.as_ref())
        {
            info_log!("navigation to '{}' cancelled: {}", full, reason);
            return NavigationResult::Blocked {
                reason,
                redirect: None,
            };
        }

        // Commit. The supersession check and the history change happen under
        // one lock, so the displayed path and the committed route always
        // agree.
        let event = {
            let mut state = self.state.lock().unwrap();
            if !state.is_navigation_current(nav_id) {
                debug_log!("navigation to '{}' superseded before commit", full);
                return NavigationResult::Superseded { path: full };
            }
            let event = match op {
                NavigateOp::Push => state.push(full.clone()),
                NavigateOp::Replace => state.replace(full.clone()),
                // Peeked before the pipeline started; any history change
                // since would have failed the supersession check above.
                NavigateOp::Back => state.back().expect("back after peek"),
                NavigateOp::Forward => state.forward().expect("forward after peek"),
            };
            state.set_current_match(stack.clone());
            state.set_unsaved_changes(false);
            event
        };

        // Stage 5: data retention. The very first transition clears nothing;
        // the bootstrap has just populated the store.
        if from_full.is_some() && !meta.preserve_data.preserves_all() {
            let to_params = stack.params();
            for key in self.data.keys() {
                if !meta.preserve_data.preserves(&key, &to_params, &from_params) {
                    self.data.clear(&key);
                }
            }
        }

        // Stage 6: preload every async view in the chain, in parallel.
        for entry in stack.entries() {
            if let Some(view) = &entry.route.meta.async_view {
                self.loader.preload(view);
            }
        }

        // Stage 7: watcher rewiring.
        self.rewire_watchers(&meta);

        // Stage 8: ambient cleanup.
        self.alerts.dismiss();
        self.update_title();

        info_log!(
            "navigation complete: '{}' (chain depth {})",
            event.to,
            stack.len()
        );
        NavigationResult::Success { path: event.to }
    }

    /// Replace the pending transition with one to `to`, replaying the
    /// pipeline from the authorization stage under a fresh navigation id.
    fn redirect(
        self: &Arc<Self>,
        superseded: String,
        to: String,
        op: NavigateOp,
        nav_id: usize,
        redirect_depth: usize,
    ) -> BoxFuture<'static, NavigationResult> {
        let inner = Arc::clone(self);
        Box::pin(async move {
            let next_id = {
                let state = inner.state.lock().unwrap();
                if !state.is_navigation_current(nav_id) {
                    return NavigationResult::Superseded { path: superseded };
                }
                state.start_navigation()
            };
            inner
                .run_pipeline(to, op.for_redirect(), next_id, redirect_depth + 1)
                .await
        })
    }

    /// Initial requests: locale load and session restore, concurrently,
    /// both failure-tolerant.
    async fn run_bootstrap(&self, meta: &RouteMeta) {
        let tag = self
            .client_store
            .get(LOCALE_STORAGE_KEY)
            .unwrap_or_else(|| self.locales.fallback().to_string());
        let restore = meta.restore_session;
        tokio::join!(self.locales.activate_or_fallback(&tag), async {
            if restore {
                self.sessions.restore().await;
            }
        });
        info_log!(
            "initial requests complete (locale '{}', session {})",
            self.locales.active(),
            if self.sessions.is_logged_in() {
                "restored"
            } else {
                "absent"
            }
        );
    }

    async fn force_replace(self: &Arc<Self>, path: String) -> NavigationResult {
        let nav_id = {
            let mut state = self.state.lock().unwrap();
            state.set_unsaved_changes(false);
            state.start_navigation()
        };
        self.run_pipeline(path, NavigateOp::Replace, nav_id, 0).await
    }

    /// Drop the previous route's subscriptions and wire up the new ones: a
    /// validity watcher per `validate_data` pair, plus a title watcher when
    /// the title derives from a data key.
    fn rewire_watchers(self: &Arc<Self>, meta: &RouteMeta) {
        let mut rewired = Vec::new();
        for (key, validator) in &meta.validate_data {
            let validator = Arc::clone(validator);
            let weak = Arc::downgrade(self);
            let watched = key.clone();
            rewired.push(self.data.watch(
                key,
                Arc::new(move |value| {
                    let Some(value) = value else { return };
                    if validator(value) {
                        return;
                    }
                    if let Some(inner) = weak.upgrade() {
                        debug_log!("data for '{}' became invalid, leaving page", watched);
                        inner.leave_invalid_page();
                    }
                }),
            ));
        }
        if let Some(title_key) = meta.title.key() {
            let weak = Arc::downgrade(self);
            rewired.push(self.data.watch(
                title_key,
                Arc::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.update_title();
                    }
                }),
            ));
        }
        *self.watchers.lock().unwrap() = rewired;
    }

    fn leave_invalid_page(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        let path = self.default_path.clone();
        tokio::spawn(async move {
            inner.force_replace(path).await;
        });
    }

    /// Recompute the document title from the committed terminal descriptor
    /// and its data: "part | app name", or the app name alone.
    fn update_title(&self) {
        let title = {
            let state = self.state.lock().unwrap();
            state
                .current_stack()
                .leaf_meta()
                .map(|meta| meta.title.clone())
        };
        let part = title.and_then(|title| {
            let value = title.key().and_then(|key| self.data.get(key));
            title.part(value.as_ref())
        });
        let text = match part {
            Some(part) => format!("{} | {}", part, self.app_name),
            None => self.app_name.clone(),
        };
        self.shell.set_title(&text);
    }

    fn resolve(&self, path: &str) -> MatchStack {
        #[cfg(feature = "cache")]
        if let Some(stack) = self.resolve_cache.lock().unwrap().get(path) {
            return stack;
        }
        let stack = resolve_match_stack(self.table.routes(), path);
        #[cfg(feature = "cache")]
        self.resolve_cache
            .lock()
            .unwrap()
            .set(path.to_string(), stack.clone());
        stack
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use futures::future::BoxFuture;
    use serde_json::Value;

    struct OfflineTransport;

    impl Transport for OfflineTransport {
        fn fetch(&self, _url: &str) -> BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async {
                Err(TransportError::Network {
                    message: "offline".into(),
                })
            })
        }

        fn restore_session(&self) -> BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async {
                Err(TransportError::Status {
                    code: 404,
                    message: "no cookie".into(),
                })
            })
        }

        fn log_in(
            &self,
            _email: &str,
            _password: &str,
        ) -> BoxFuture<'static, Result<Value, TransportError>> {
            Box::pin(async {
                Err(TransportError::Status {
                    code: 401,
                    message: "bad credentials".into(),
                })
            })
        }

        fn log_out(&self, _token: &str) -> BoxFuture<'static, Result<(), TransportError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn navigator() -> Navigator {
        let table = RouteTable::new(vec![
            Route::new("/", "Home"),
            Route::new("/users", "UserList"),
            Route::new("/users/:id", "UserShow"),
            Route::new("/login", "AccountLogin").anonymity_required(),
        ]);
        Navigator::builder(table, Arc::new(OfflineTransport)).build()
    }

    #[tokio::test]
    async fn test_nav_push() {
        let nav = navigator();
        assert_eq!(nav.current_path(), None);

        assert!(nav.push("/users").await.is_success());
        assert_eq!(nav.current_path(), Some("/users".to_string()));

        assert!(nav.push("/users/123").await.is_success());
        assert_eq!(nav.current_path(), Some("/users/123".to_string()));
        assert_eq!(nav.current_params().get("id"), Some(&"123".to_string()));
        assert_eq!(nav.current_view(), Some("UserShow".to_string()));
    }

    #[tokio::test]
    async fn test_nav_back_forward() {
        let nav = navigator();
        nav.push("/users").await;
        nav.push("/users/7").await;

        assert!(nav.can_go_back());
        let back = nav.back().await.unwrap();
        assert!(back.is_success());
        assert_eq!(nav.current_path(), Some("/users".to_string()));

        assert!(nav.can_go_forward());
        let forward = nav.forward().await.unwrap();
        assert!(forward.is_success());
        assert_eq!(nav.current_path(), Some("/users/7".to_string()));
        assert!(!nav.can_go_forward());
    }

    #[tokio::test]
    async fn test_nav_replace_leaves_no_history() {
        let nav = navigator();
        nav.push("/users").await;
        nav.replace("/users/9").await;

        assert_eq!(nav.current_path(), Some("/users/9".to_string()));
        assert!(!nav.can_go_back());
    }

    #[tokio::test]
    async fn test_nav_not_found() {
        let nav = navigator();
        nav.push("/users").await;

        let result = nav.push("/missing/route").await;
        assert!(result.is_not_found());
        // The failed navigation commits nothing.
        assert_eq!(nav.current_path(), Some("/users".to_string()));
    }

    #[tokio::test]
    async fn test_anonymity_redirect_goes_to_default() {
        let nav = navigator();
        nav.data().write(
            crate::session::SESSION_KEY,
            serde_json::json!({
                "token": "t",
                "createdAt": chrono::Utc::now().to_rfc3339(),
                "expiresAt": (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
            }),
        );

        let result = nav.push("/login").await;
        assert!(result.is_success());
        assert_eq!(nav.current_path(), Some("/".to_string()));
    }
}
