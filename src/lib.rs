//! Client-side navigation pipeline for API-backed single-page applications.
//!
//! `fieldwork-navigator` models the part of a thick client that decides
//! whether, and how, a route transition happens. Every navigation runs an
//! ordered pipeline: one-time bootstrap (locale + session restore),
//! authorization, data-validity checks, an unsaved-changes prompt, and then
//! the post-entry work of clearing cached responses the new route does not
//! preserve, preloading async views, rewiring data watchers, and refreshing
//! the document title. Concurrent navigations supersede each other: only the
//! most recently started transition may commit, and a superseded transition
//! applies none of its remaining effects.
//!
//! The crate is headless. Rendering, HTTP, and the host chrome sit behind
//! the [`Shell`], [`Transport`], and [`ClientStore`] traits, so the whole
//! pipeline can be driven from tests or embedded in any UI layer.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fieldwork_navigator::{Navigator, Route, RouteTable};
//! # use fieldwork_navigator::Transport;
//! # fn transport() -> Arc<dyn Transport> { unimplemented!() }
//!
//! # async fn run() {
//! let table = RouteTable::new(vec![
//!     Route::new("/login", "AccountLogin").anonymity_required(),
//!     Route::new("/", "Home").login_required(),
//!     Route::new("/projects/:projectId", "ProjectShow")
//!         .login_required()
//!         .load_async("ProjectShow")
//!         .validate("project", |project| project["archived"] != true)
//!         .title_from("project", |project| {
//!             project["name"].as_str().map(String::from)
//!         }),
//! ])
//! .preserve_everywhere("session");
//!
//! let navigator = Navigator::builder(table, transport())
//!     .app_name("Fieldwork")
//!     .build();
//!
//! match navigator.push("/projects/1").await {
//!     result if result.is_success() => println!("entered {:?}", navigator.current_path()),
//!     result => println!("navigation did not commit: {:?}", result),
//! }
//! # }
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Description                                   | Default |
//! |-----------|-----------------------------------------------|---------|
//! | `log`     | Route logging through the `log` crate         | yes     |
//! | `tracing` | Route logging through the `tracing` crate     | no      |
//! | `cache`   | LRU cache for route resolution                | yes     |
//!
//! The `log` and `tracing` features are mutually exclusive — enable at most
//! one.
//!
//! # Module map
//!
//! - [`route`] — route descriptors, the static route table, per-route
//!   metadata (auth, data preservation, validation, titles, async views).
//! - [`matching`] — path normalization and single-route matching.
//! - [`resolve`] — nested resolution of a path to its descriptor chain.
//! - [`state`] — history, the committed route, and navigation ids.
//! - [`navigator`] — the pipeline itself.
//! - [`guards`] — the pure pre-entry checks the pipeline runs.
//! - [`store`] — keyed cache of API responses with cancellation and watchers.
//! - [`session`] — session restore, login, logout.
//! - [`loader`] — single-flight async view loading.
//! - [`locale`] — locale activation with fallback.
//! - [`alert`] — the transient alert slot.
//! - [`shell`] — host traits: [`Transport`], [`Shell`], [`ClientStore`].

pub mod alert;
#[cfg(feature = "cache")]
pub mod cache;
pub mod error;
pub mod guards;
pub mod loader;
pub mod locale;
pub mod logging;
pub mod matching;
pub mod navigator;
pub mod params;
pub mod resolve;
pub mod route;
pub mod session;
pub mod shell;
pub mod state;
pub mod store;

pub use alert::{Alert, AlertSeverity, AlertStore};
#[cfg(feature = "cache")]
pub use cache::{CacheStats, ResolveCache};
pub use error::{LoadError, NavigationError, NavigationResult, TransportError};
pub use guards::{StageAction, UNSAVED_CHANGES_PROMPT};
pub use loader::{LoadFn, LoadedView, ViewHandle, ViewLoader};
pub use locale::{LocaleLoader, LocaleStore, FALLBACK_LOCALE};
pub use matching::normalize_path;
pub use navigator::{Navigator, NavigatorBuilder, LOCALE_STORAGE_KEY, MAX_REDIRECT_DEPTH};
pub use params::{split_path_query, QueryParams, RouteParams};
pub use resolve::{resolve_match_stack, MatchEntry, MatchStack};
pub use route::{PreserveRule, Route, RouteMeta, RouteTable, Title, Validator};
pub use session::{Principal, Session, SessionStore, SESSION_KEY};
pub use shell::{ClientStore, HeadlessShell, MemoryClientStore, Shell, Transport};
pub use state::{RouteChangeEvent, RouterState};
pub use store::{DataState, DataStore, WatchCallback, WatcherHandle};
