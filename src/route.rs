//! Route descriptors and per-route metadata.
//!
//! A [`Route`] maps a path pattern to a view identifier and carries the
//! metadata the guard pipeline reads on every transition:
//!
//! - authorization flags (`require_login`, `require_anonymity`)
//! - whether the initial bootstrap should restore a stored session
//! - which cached response keys survive a transition ([`PreserveData`])
//! - validity predicates over cached responses (`validate_data`)
//! - how the document title is derived ([`Title`])
//! - which async view to preload
//!
//! Routes nest; a matched path yields a chain of descriptors and the most
//! specific one (the terminal descriptor) supplies the metadata, except the
//! async view, which is preloaded for every descriptor in the chain.
//!
//! # Example
//!
//! ```
//! use fieldwork_navigator::route::Route;
//!
//! let route = Route::new("/login", "AccountLogin")
//!     .anonymity_required()
//!     .title_static("Log in");
//! assert!(route.meta.require_anonymity);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::params::RouteParams;

/// Predicate applied to a cached response value.
///
/// Returns `false` when the value no longer supports the route (e.g. the
/// entity it describes was deleted).
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Derives the page-title part from a cached response value.
pub type TitleFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

// ============================================================================
// Title derivation
// ============================================================================

/// How a route derives the document title.
#[derive(Clone, Default)]
pub enum Title {
    /// No title part; the application name stands alone
    #[default]
    None,
    /// Fixed title part
    Static(String),
    /// Title part derived from a cached response value
    FromData { key: String, derive: TitleFn },
}

impl Title {
    /// Data key the title depends on, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Title::FromData { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Compute the title part given the current value for [`Self::key`].
    ///
    /// `value` is `None` when the data is absent or still pending.
    pub fn part(&self, value: Option<&Value>) -> Option<String> {
        match self {
            Title::None => None,
            Title::Static(s) => Some(s.clone()),
            Title::FromData { derive, .. } => value.and_then(|v| derive(v)),
        }
    }
}

impl fmt::Debug for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Title::None => write!(f, "Title::None"),
            Title::Static(s) => write!(f, "Title::Static({:?})", s),
            Title::FromData { key, .. } => write!(f, "Title::FromData({:?})", key),
        }
    }
}

// ============================================================================
// Data preservation
// ============================================================================

/// Condition under which a cached response key survives a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreserveRule {
    /// The key always survives transitions into this route
    Always,
    /// The key survives only when the named route params are equal on both
    /// sides of the transition (e.g. project data survives while the
    /// projectId stays the same)
    WhenParamsEqual(Vec<String>),
}

/// Which cached response keys a transition into this route preserves.
///
/// The wildcard short-circuits clearing entirely: when set, no key is cleared
/// during the transition.
#[derive(Debug, Clone, Default)]
pub struct PreserveData {
    all: bool,
    keys: HashMap<String, PreserveRule>,
}

impl PreserveData {
    /// Whether the wildcard is set: skip all clearing this transition.
    pub fn preserves_all(&self) -> bool {
        self.all
    }

    /// Whether `key` survives a transition with the given params.
    pub fn preserves(&self, key: &str, to: &RouteParams, from: &RouteParams) -> bool {
        if self.all {
            return true;
        }
        match self.keys.get(key) {
            Some(PreserveRule::Always) => true,
            Some(PreserveRule::WhenParamsEqual(names)) => {
                names.iter().all(|name| to.get(name) == from.get(name))
            }
            None => false,
        }
    }

    fn insert(&mut self, key: impl Into<String>, rule: PreserveRule) {
        self.keys.insert(key.into(), rule);
    }
}

// ============================================================================
// Route metadata
// ============================================================================

/// Per-route metadata read by the guard pipeline.
///
/// All fields are read from the terminal descriptor of the matched chain,
/// except `async_view`, which stage 6 reads from every descriptor.
#[derive(Clone)]
pub struct RouteMeta {
    /// Redirect to the login view when no session exists
    pub require_login: bool,
    /// Redirect to the default view when a session exists
    pub require_anonymity: bool,
    /// Restore a stored session during the initial bootstrap
    pub restore_session: bool,
    /// Cached response keys that survive transitions into this route
    pub preserve_data: PreserveData,
    /// Ordered (data key, predicate) pairs; a resolved value rejected by its
    /// predicate makes the route invalid
    pub validate_data: Vec<(String, Validator)>,
    /// Document title derivation
    pub title: Title,
    /// View identifier to preload
    pub async_view: Option<String>,
}

impl Default for RouteMeta {
    fn default() -> Self {
        Self {
            require_login: false,
            require_anonymity: false,
            restore_session: true,
            preserve_data: PreserveData::default(),
            validate_data: Vec::new(),
            title: Title::None,
            async_view: None,
        }
    }
}

impl fmt::Debug for RouteMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMeta")
            .field("require_login", &self.require_login)
            .field("require_anonymity", &self.require_anonymity)
            .field("restore_session", &self.restore_session)
            .field("preserve_data", &self.preserve_data)
            .field(
                "validate_data",
                &self
                    .validate_data
                    .iter()
                    .map(|(key, _)| key.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("title", &self.title)
            .field("async_view", &self.async_view)
            .finish()
    }
}

// ============================================================================
// Route
// ============================================================================

/// One node of the route tree: a path pattern, a view identifier, metadata,
/// and nested children.
///
/// Paths are relative to the parent route; an empty path marks the index
/// child. Dynamic `:param` segments bind route params.
///
/// # Example
///
/// ```
/// use fieldwork_navigator::route::Route;
///
/// let projects = Route::new("/projects/:projectId", "ProjectShow")
///     .login_required()
///     .preserve_when_params_equal("project", &["projectId"])
///     .load_async("ProjectShow")
///     .child(Route::new("", "ProjectOverview"))
///     .child(Route::new("settings", "ProjectSettings"));
/// assert_eq!(projects.children.len(), 2);
/// ```
#[derive(Clone)]
pub struct Route {
    /// Path pattern, relative to the parent route
    pub path: String,
    /// View identifier rendered when this route matches
    pub view: String,
    /// Guard metadata
    pub meta: RouteMeta,
    /// Nested child routes
    pub children: Vec<Arc<Route>>,
}

impl Route {
    /// Create a route mapping `path` to the view named `view`.
    #[must_use]
    pub fn new(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: view.into(),
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    /// Require an active session; redirects to the login view otherwise.
    #[must_use]
    pub fn login_required(mut self) -> Self {
        self.meta.require_login = true;
        self
    }

    /// Require the absence of a session; redirects to the default view
    /// otherwise.
    #[must_use]
    pub fn anonymity_required(mut self) -> Self {
        self.meta.require_anonymity = true;
        self
    }

    /// Skip session restoration during the initial bootstrap.
    #[must_use]
    pub fn skip_session_restore(mut self) -> Self {
        self.meta.restore_session = false;
        self
    }

    /// Preserve the cached response for `key` across transitions into this
    /// route.
    #[must_use]
    pub fn preserve(mut self, key: impl Into<String>) -> Self {
        self.meta.preserve_data.insert(key, PreserveRule::Always);
        self
    }

    /// Preserve `key` only when the named route params are equal across the
    /// transition.
    #[must_use]
    pub fn preserve_when_params_equal(mut self, key: impl Into<String>, params: &[&str]) -> Self {
        self.meta.preserve_data.insert(
            key,
            PreserveRule::WhenParamsEqual(params.iter().map(|p| (*p).to_string()).collect()),
        );
        self
    }

    /// Preserve every cached response across transitions into this route.
    #[must_use]
    pub fn preserve_all(mut self) -> Self {
        self.meta.preserve_data.all = true;
        self
    }

    /// Add a validity predicate over the cached response for `key`.
    #[must_use]
    pub fn validate<F>(mut self, key: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.meta
            .validate_data
            .push((key.into(), Arc::new(predicate)));
        self
    }

    /// Use a fixed document-title part for this route.
    #[must_use]
    pub fn title_static(mut self, part: impl Into<String>) -> Self {
        self.meta.title = Title::Static(part.into());
        self
    }

    /// Derive the document-title part from the cached response for `key`.
    #[must_use]
    pub fn title_from<F>(mut self, key: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.meta.title = Title::FromData {
            key: key.into(),
            derive: Arc::new(derive),
        };
        self
    }

    /// Preload the view bundle named `view` when this route participates in a
    /// matched chain.
    #[must_use]
    pub fn load_async(mut self, view: impl Into<String>) -> Self {
        self.meta.async_view = Some(view.into());
        self
    }

    /// Add a nested child route.
    #[must_use]
    pub fn child(mut self, child: Route) -> Self {
        self.children.push(Arc::new(child));
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("view", &self.view)
            .field("meta", &self.meta)
            .field("children", &self.children)
            .finish()
    }
}

/// The static route table the navigator resolves against.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Build a table from top-level routes.
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Top-level routes, in declaration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Return `true` if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Mark `key` as preserved by every route in the table.
    ///
    /// Session-scoped data survives ordinary navigation this way without
    /// repeating the rule on each declaration.
    #[must_use]
    pub fn preserve_everywhere(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        for route in &mut self.routes {
            mark_preserved(Arc::make_mut(route), &key);
        }
        self
    }
}

fn mark_preserved(route: &mut Route, key: &str) {
    route.meta.preserve_data.insert(key, PreserveRule::Always);
    for child in &mut route.children {
        mark_preserved(Arc::make_mut(child), key);
    }
}
