//! Guard decisions for route transitions.
//!
//! Each check here is a pure decision: it inspects the terminal descriptor's
//! metadata and the current application state, and answers with a
//! [`StageAction`]. The navigator runs the checks in pipeline order and
//! applies the answer; nothing in this module mutates state.

use crate::params::QueryParams;
use crate::route::RouteMeta;
use crate::shell::Shell;
use crate::store::DataStore;

/// Prompt shown before discarding unsaved edits.
pub const UNSAVED_CHANGES_PROMPT: &str =
    "Are you sure you want to leave this page? Your changes might not be saved.";

// ============================================================================
// StageAction
// ============================================================================

/// Answer of one guard check.
///
/// # Example
///
/// ```
/// use fieldwork_navigator::guards::StageAction;
///
/// let action = StageAction::redirect("/login");
/// assert!(action.is_redirect());
/// assert_eq!(action.redirect_target(), Some("/login"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    /// Let the transition continue to the next check.
    Proceed,

    /// Replace the transition with one to a different path.
    Redirect {
        /// Path to redirect to.
        to: String,
        /// Optional human-readable reason for redirecting.
        reason: Option<String>,
    },

    /// Stop the transition; the current route is retained.
    Abort {
        /// Human-readable reason for aborting.
        reason: String,
    },
}

impl StageAction {
    /// Create an action that lets the transition continue.
    pub fn proceed() -> Self {
        Self::Proceed
    }

    /// Create an action that redirects to a different path.
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: None,
        }
    }

    /// Create a redirect action with a human-readable reason.
    pub fn redirect_with_reason(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: Some(reason.into()),
        }
    }

    /// Create an action that stops the transition.
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort {
            reason: reason.into(),
        }
    }

    /// Check if this action lets the transition continue.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    /// Check if this action redirects the transition.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Check if this action stops the transition.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }

    /// Get the redirect path, if this is a redirect action.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect { to, .. } => Some(to.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// Authorization
// ============================================================================

/// Implements the `require_login` and `require_anonymity` meta fields.
///
/// A login-only route visited without a session redirects to the login view
/// with the originally requested path carried as the `next` query parameter,
/// so a successful login can return there. An anonymity-only route visited
/// with a session redirects to the default view.
pub fn check_authorization(
    meta: &RouteMeta,
    logged_in: bool,
    requested: &str,
    login_path: &str,
    default_path: &str,
) -> StageAction {
    if meta.require_login && !logged_in {
        let mut query = QueryParams::new();
        query.insert("next".to_string(), requested.to_string());
        return StageAction::redirect_with_reason(
            format!("{}?{}", login_path, query.to_query_string()),
            "login required",
        );
    }
    if meta.require_anonymity && logged_in {
        return StageAction::redirect_with_reason(default_path, "already logged in");
    }
    StageAction::Proceed
}

// ============================================================================
// Data validity
// ============================================================================

/// Implements the `validate_data` meta field.
///
/// Predicates run against resolved values only; a key that is absent,
/// pending, or rejected passes, because the page handles loading and error
/// display itself.
pub fn check_data_validity(meta: &RouteMeta, data: &DataStore, default_path: &str) -> StageAction {
    for (key, validator) in &meta.validate_data {
        if let Some(value) = data.get(key) {
            if !validator(&value) {
                crate::debug_log!("data for '{}' failed validation", key);
                return StageAction::redirect_with_reason(
                    default_path,
                    format!("invalid data for '{key}'"),
                );
            }
        }
    }
    StageAction::Proceed
}

// ============================================================================
// Unsaved changes
// ============================================================================

/// Ask the user to confirm leaving a page with unsaved edits.
///
/// Without unsaved edits the transition proceeds silently. With them, a
/// declined prompt retains the current route.
pub fn check_unsaved_changes(unsaved: bool, shell: &dyn Shell) -> StageAction {
    if !unsaved {
        return StageAction::Proceed;
    }
    if shell.confirm(UNSAVED_CHANGES_PROMPT) {
        StageAction::Proceed
    } else {
        StageAction::abort("unsaved changes")
    }
}

// ============================================================================
// Tests
// ============================================================================
