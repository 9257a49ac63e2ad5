//! Error handling for the navigator.
//!
//! This module defines the types returned when a navigation attempt cannot
//! complete successfully:
//!
//! - [`NavigationResult`] — the top-level outcome of any navigation
//!   (`Success`, `NotFound`, `Blocked`, `Superseded`, `Error`).
//! - [`NavigationError`] — a detailed error variant (route not found, redirect
//!   loop, transport failure, etc.).
//! - [`TransportError`] — a failure reported by the HTTP boundary; also the
//!   rejection value stored in cached response entries.
//! - [`LoadError`] — a failed async view load. `Clone` because a single load
//!   outcome is shared by every concurrent caller.
//!
//! # Examples
//!
//! ```
//! use fieldwork_navigator::error::NavigationResult;
//!
//! let result = NavigationResult::Success { path: "/".into() };
//! assert!(result.is_success());
//!
//! let blocked = NavigationResult::Blocked {
//!     reason: "unsaved changes".into(),
//!     redirect: None,
//! };
//! assert!(blocked.is_blocked());
//! ```

use std::fmt;

// ============================================================================
// Navigation Result Types
// ============================================================================

/// Outcome of a navigation attempt through the guard pipeline.
///
/// Every call to [`Navigator::push`](crate::navigator::Navigator::push)
/// (and friends) returns this enum.
#[derive(Debug, Clone)]
pub enum NavigationResult {
    /// Navigation succeeded
    Success { path: String },
    /// Route not found
    NotFound { path: String },
    /// Navigation blocked by a guard stage
    Blocked {
        reason: String,
        redirect: Option<String>,
    },
    /// A newer navigation started before this one finished; none of this
    /// transition's remaining effects were applied
    Superseded { path: String },
    /// Navigation error
    Error(NavigationError),
}

/// Detailed error variants that can occur during navigation.
///
/// Implements [`std::error::Error`] and [`Display`](std::fmt::Display) for
/// idiomatic error handling.
#[derive(Debug, Clone)]
pub enum NavigationError {
    /// Route not found
    RouteNotFound { path: String },

    /// Redirect chain exceeded the depth limit
    TooManyRedirects { path: String },

    /// The HTTP boundary reported a failure
    Transport(TransportError),

    /// Navigation failed
    NavigationFailed { message: String },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::RouteNotFound { path } => {
                write!(f, "Route not found: {}", path)
            }
            NavigationError::TooManyRedirects { path } => {
                write!(f, "Too many redirects while navigating to: {}", path)
            }
            NavigationError::Transport(err) => {
                write!(f, "Transport error: {}", err)
            }
            NavigationError::NavigationFailed { message } => {
                write!(f, "Navigation failed: {}", message)
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for NavigationError {
    fn from(err: TransportError) -> Self {
        NavigationError::Transport(err)
    }
}

impl NavigationResult {
    /// Check if navigation was successful
    pub fn is_success(&self) -> bool {
        matches!(self, NavigationResult::Success { .. })
    }

    /// Check if route was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, NavigationResult::NotFound { .. })
    }

    /// Check if navigation was blocked
    pub fn is_blocked(&self) -> bool {
        matches!(self, NavigationResult::Blocked { .. })
    }

    /// Check if a newer navigation superseded this one
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationResult::Superseded { .. })
    }

    /// Check if there was an error
    pub fn is_error(&self) -> bool {
        matches!(self, NavigationResult::Error(_))
    }

    /// Get redirect path if blocked with redirect
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            NavigationResult::Blocked {
                redirect: Some(path),
                ..
            } => Some(path),
            _ => None,
        }
    }

    /// Final committed path for `Success`, `None` otherwise
    pub fn path(&self) -> Option<&str> {
        match self {
            NavigationResult::Success { path } => Some(path),
            _ => None,
        }
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Failure reported by the HTTP boundary.
///
/// Stored as the rejection value of a cached response entry, so it is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status
    Status { code: u16, message: String },

    /// The request never produced a response
    Network { message: String },

    /// The request was cancelled before it resolved
    Cancelled,
}

impl TransportError {
    /// Check whether this is a 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { code: 404, .. })
    }

    /// Check whether the request was cancelled rather than failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { code, message } => {
                write!(f, "server responded {}: {}", code, message)
            }
            TransportError::Network { message } => {
                write!(f, "network failure: {}", message)
            }
            TransportError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// View Load Errors
// ============================================================================

/// A failed async view load.
#[derive(Debug, Clone)]
pub struct LoadError {
    /// View identifier whose load failed
    pub view: String,
    /// Underlying transport failure
    pub source: TransportError,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load view '{}': {}", self.view, self.source)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_result_success() {
        let result = NavigationResult::Success {
            path: "/account/edit".to_string(),
        };
        assert!(result.is_success());
        assert!(!result.is_not_found());
        assert!(!result.is_blocked());
        assert!(!result.is_error());
        assert_eq!(result.path(), Some("/account/edit"));
    }

    #[test]
    fn test_navigation_result_not_found() {
        let result = NavigationResult::NotFound {
            path: "/invalid".to_string(),
        };
        assert!(!result.is_success());
        assert!(result.is_not_found());
        assert_eq!(result.path(), None);
    }

    #[test]
    fn test_navigation_result_blocked_with_redirect() {
        let result = NavigationResult::Blocked {
            reason: "not authenticated".to_string(),
            redirect: Some("/login".to_string()),
        };
        assert!(result.is_blocked());
        assert_eq!(result.redirect_path(), Some("/login"));
    }

    #[test]
    fn test_navigation_result_superseded() {
        let result = NavigationResult::Superseded {
            path: "/users".to_string(),
        };
        assert!(result.is_superseded());
        assert!(!result.is_success());
    }

    #[test]
    fn test_navigation_error_display() {
        let error = NavigationError::RouteNotFound {
            path: "/test".to_string(),
        };
        assert_eq!(error.to_string(), "Route not found: /test");

        let error = NavigationError::TooManyRedirects {
            path: "/a".to_string(),
        };
        assert_eq!(error.to_string(), "Too many redirects while navigating to: /a");
    }

    #[test]
    fn test_transport_error_predicates() {
        let err = TransportError::Status {
            code: 404,
            message: "not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_cancelled());
        assert!(TransportError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_navigation_error_from_transport() {
        let err: NavigationError = TransportError::Network {
            message: "connection reset".to_string(),
        }
        .into();
        assert!(matches!(err, NavigationError::Transport(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError {
            view: "SubmissionList".to_string(),
            source: TransportError::Network {
                message: "timed out".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to load view 'SubmissionList': network failure: timed out"
        );
    }
}
