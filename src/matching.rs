//! Segment-based route matching for nested routing
//!
//! Simplified segment matching used by the nested resolver: one route pattern
//! against one path, yielding bound params and the unmatched remainder.
//!
//! # Design
//!
//! - Split paths by '/' into segments
//! - Match literal segments exactly
//! - Extract `:param` segments into RouteParams
//! - Support for empty path "" (index routes)
//! - No regex or complex patterns

use crate::params::RouteParams;
use crate::route::Route;
use std::borrow::Cow;
use std::sync::Arc;

/// Strip leading and trailing slashes from a route path segment.
#[inline]
pub(crate) fn trim_slashes(path: &str) -> &str {
    path.trim_start_matches('/').trim_end_matches('/')
}

/// Normalize a path for consistent comparison
///
/// Ensures paths have a leading slash and no trailing slash (unless root).
/// Returns `Cow<str>` to avoid allocation when path is already normalized.
///
/// # Examples
///
/// ```
/// use fieldwork_navigator::normalize_path;
///
/// assert_eq!(normalize_path("/users"), "/users");
/// assert_eq!(normalize_path("users"), "/users");
/// assert_eq!(normalize_path("/users/"), "/users");
/// assert_eq!(normalize_path("/"), "/");
/// assert_eq!(normalize_path(""), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &'_ str) -> Cow<'_, str> {
    if path.is_empty() {
        return Cow::Borrowed("/");
    }

    if path == "/" {
        return Cow::Borrowed(path);
    }

    let has_leading = path.starts_with('/');
    let has_trailing = path.ends_with('/');

    // Already normalized: has leading, no trailing
    if has_leading && !has_trailing {
        return Cow::Borrowed(path);
    }

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{trimmed}"))
    }
}

/// Result of matching a path against a route
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Arc<Route>,
    /// Extracted route parameters
    pub params: RouteParams,
    /// Remaining unmatched path segments (for nested resolution)
    pub remaining: Vec<String>,
}

/// Match a path against a route pattern, extracting parameters
///
/// # Examples
///
/// ```ignore
/// let route = Arc::new(Route::new("/projects/:projectId", "ProjectShow"));
/// let result = match_path("/projects/1/forms", &route);
///
/// assert!(result.is_some());
/// let m = result.unwrap();
/// assert_eq!(m.params.get("projectId"), Some(&"1".to_string()));
/// assert_eq!(m.remaining, vec!["forms"]);
/// ```
pub fn match_path<'a>(path: &str, route: &'a Arc<Route>) -> Option<RouteMatch<'a>> {
    // Empty path only matches an empty (index) pattern
    if path.is_empty() || path == "/" {
        let route_path = route.path.trim_matches('/');
        if !route_path.is_empty() {
            return None;
        }
    }

    let path_segments = split_path(path);
    let route_segments = split_path(&route.path);

    let path_len = path_segments.len();
    let route_len = route_segments.len();

    // A pattern longer than the path can never match
    if route_len > path_len {
        return None;
    }

    if route_len == 0 && path_len == 0 {
        return Some(RouteMatch {
            route,
            params: RouteParams::new(),
            remaining: vec![],
        });
    }

    let mut params = RouteParams::new();
    let mut matched_count = 0;

    // Match each route segment against path segments
    for (route_seg, path_seg) in route_segments.iter().zip(path_segments.iter()) {
        if let Some(param_name) = extract_param_name(route_seg) {
            params.set(param_name.to_string(), path_seg.clone());
            matched_count += 1;
        } else if route_seg == path_seg {
            matched_count += 1;
        } else {
            return None;
        }
    }

    // Calculate remaining unmatched segments
    let remaining = path_segments[matched_count..].to_vec();

    Some(RouteMatch {
        route,
        params,
        remaining,
    })
}

/// Split a path into segments, filtering empty segments
///
/// # Examples
///
/// ```ignore
/// assert_eq!(split_path("/projects/1"), vec!["projects", "1"]);
/// assert_eq!(split_path("/"), vec![]);
/// assert_eq!(split_path(""), vec![]);
/// assert_eq!(split_path("/projects/"), vec!["projects"]);
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Extract parameter name from a route segment
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_param_name(":projectId"), Some("projectId"));
/// assert_eq!(extract_param_name("projects"), None);
/// ```
pub fn extract_param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(':')
}

/// Check if a route segment is a parameter
pub fn is_param_segment(segment: &str) -> bool {
    segment.starts_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/projects/1"), vec!["projects", "1"]);
        assert_eq!(
            split_path("/projects/1/forms"),
            vec!["projects", "1", "forms"]
        );
        assert_eq!(split_path("/"), Vec::<String>::new());
        assert_eq!(split_path(""), Vec::<String>::new());
        assert_eq!(split_path("/projects/"), vec!["projects"]);
        assert_eq!(split_path("projects"), vec!["projects"]);
    }

    #[test]
    fn test_extract_param_name() {
        assert_eq!(extract_param_name(":id"), Some("id"));
        assert_eq!(extract_param_name(":projectId"), Some("projectId"));
        assert_eq!(extract_param_name("projects"), None);
        assert_eq!(extract_param_name(""), None);
    }

    #[test]
    fn test_is_param_segment() {
        assert!(is_param_segment(":id"));
        assert!(is_param_segment(":projectId"));
        assert!(!is_param_segment("projects"));
        assert!(!is_param_segment(""));
    }

    #[test]
    fn test_match_path_with_params() {
        let route = Arc::new(Route::new("/projects/:projectId", "ProjectShow"));
        let m = match_path("/projects/42/forms", &route).unwrap();
        assert_eq!(m.params.get("projectId"), Some(&"42".to_string()));
        assert_eq!(m.remaining, vec!["forms".to_string()]);
    }

    #[test]
    fn test_match_path_literal_mismatch() {
        let route = Arc::new(Route::new("/users", "UserList"));
        assert!(match_path("/projects", &route).is_none());
    }

    #[test]
    fn test_match_path_index_route() {
        let route = Arc::new(Route::new("", "Home"));
        let m = match_path("/", &route).unwrap();
        assert!(m.params.is_empty());
        assert!(m.remaining.is_empty());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/users"), "/users");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("//users//"), "/users");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_normalize_path_borrows_when_normalized() {
        assert!(matches!(normalize_path("/users"), Cow::Borrowed(_)));
        assert!(matches!(normalize_path("users"), Cow::Owned(_)));
    }
}
