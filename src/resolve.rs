//! Route resolution via Match Stack
//!
//! # Architecture
//!
//! The **entire chain of matched routes is resolved once** per navigation.
//! The result is a [`MatchStack`] — an ordered list of [`MatchEntry`] items,
//! one per nesting level. The deepest entry is the terminal descriptor: the
//! guard pipeline reads its metadata, while the async-view preloading stage
//! walks every entry in the chain.
//!
//! # Example
//!
//! Given routes:
//! ```text
//! /projects/:projectId      (layout)
//!   ""                      (index → overview)
//!   forms/:xmlFormId        (has children)
//!     submissions           (leaf)
//! ```
//!
//! For path `/projects/1/forms/f/submissions`, the match stack is:
//! ```text
//! [0] Route("/projects/:projectId")  params={projectId: "1"}
//! [1] Route("forms/:xmlFormId")      params={projectId: "1", xmlFormId: "f"}
//! [2] Route("submissions")           params={projectId: "1", xmlFormId: "f"}
//! ```
//!
//! For path `/projects/1`:
//! ```text
//! [0] Route("/projects/:projectId")  params={projectId: "1"}
//! [1] Route("")                      params={projectId: "1"}   ← index child
//! ```

use crate::matching::{normalize_path, trim_slashes};
use crate::route::{Route, RouteMeta};
use crate::RouteParams;
use std::sync::Arc;

// ============================================================================
// Match Stack
// ============================================================================

/// A single entry in the route match stack.
///
/// Represents one level of the route hierarchy that matched the current path.
#[derive(Debug, Clone)]
pub struct MatchEntry {
    /// The matched route at this level
    pub route: Arc<Route>,
    /// Accumulated params (includes all params from parent levels + this level)
    pub params: RouteParams,
    /// Depth in the hierarchy (0 = root/top-level route)
    pub depth: usize,
}

/// The full resolved route chain for the current path.
///
/// Built once per navigation; the guard pipeline reads metadata from the
/// terminal (deepest) entry and preloads async views from every entry.
#[derive(Debug, Clone, Default)]
pub struct MatchStack {
    entries: Vec<MatchEntry>,
}

impl MatchStack {
    /// Create an empty match stack
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Get entry at a specific depth
    pub fn at_depth(&self, depth: usize) -> Option<&MatchEntry> {
        self.entries.get(depth)
    }

    /// Get the root (depth 0) entry
    pub fn root(&self) -> Option<&MatchEntry> {
        self.entries.first()
    }

    /// Get the terminal (deepest) entry
    pub fn leaf(&self) -> Option<&MatchEntry> {
        self.entries.last()
    }

    /// Metadata of the terminal entry, if any route matched
    pub fn leaf_meta(&self) -> Option<&RouteMeta> {
        self.leaf().map(|entry| &entry.route.meta)
    }

    /// Total number of matched levels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty (no routes matched)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries as a slice
    pub fn entries(&self) -> &[MatchEntry] {
        &self.entries
    }

    /// Get the accumulated params at the deepest level
    pub fn params(&self) -> RouteParams {
        self.leaf().map(|e| e.params.clone()).unwrap_or_default()
    }
}

// ============================================================================
// Resolution Algorithm
// ============================================================================

/// Maximum nesting depth to prevent infinite recursion
const MAX_DEPTH: usize = 16;

/// Resolve the full match stack for a given path against the route tree.
///
/// Called once per navigation.
///
/// # Algorithm
///
/// 1. Split path into segments: `/projects/1/forms` → `["projects", "1", "forms"]`
/// 2. Try each top-level route against the first segment(s)
/// 3. On match, consume segments and recurse into children
/// 4. At each level, push a `MatchEntry` into the stack
/// 5. When segments exhausted, try index route (empty path child)
///
/// # Examples
///
/// ```ignore
/// use fieldwork_navigator::resolve::resolve_match_stack;
///
/// let stack = resolve_match_stack(table.routes(), "/projects/1/forms/f");
/// assert_eq!(stack.len(), 2); // project layout, form
/// ```
pub fn resolve_match_stack(routes: &[Arc<Route>], path: &str) -> MatchStack {
    let normalized = normalize_path(path);
    let path_str = trim_slashes(&normalized);

    let segments: Vec<&str> = if path_str.is_empty() {
        vec![]
    } else {
        path_str.split('/').collect()
    };

    let mut stack = MatchStack::new();
    resolve_recursive(routes, &segments, 0, &RouteParams::new(), &mut stack);

    #[cfg(debug_assertions)]
    {
        crate::debug_log!(
            "resolved path '{}' → {} levels: [{}]",
            path,
            stack.len(),
            stack
                .entries
                .iter()
                .map(|e| format!("\"{}\"", e.route.path))
                .collect::<Vec<_>>()
                .join(" → ")
        );
    }

    stack
}

/// Recursive route matching with backtracking.
///
/// Returns `true` if a complete match was found (all segments consumed or
/// a valid leaf/index route was reached).
fn resolve_recursive(
    routes: &[Arc<Route>],
    remaining: &[&str],
    depth: usize,
    inherited_params: &RouteParams,
    stack: &mut MatchStack,
) -> bool {
    if depth >= MAX_DEPTH {
        crate::warn_log!(
            "maximum route nesting depth ({}) exceeded, check for circular routes",
            MAX_DEPTH
        );
        return false;
    }

    for route in routes {
        let route_path = trim_slashes(&route.path);

        let route_segments: Vec<&str> = if route_path.is_empty() {
            vec![]
        } else {
            route_path.split('/').collect()
        };

        // === Try to match this route's segments ===

        // Case 1: Route has an empty path (index/layout route)
        if route_segments.is_empty() {
            let params = inherited_params.clone();

            // Empty-path route with children = layout route (matches anything)
            // Empty-path route without children = index route (matches only when no segments left)
            if remaining.is_empty() {
                stack.entries.push(MatchEntry {
                    route: Arc::clone(route),
                    params: params.clone(),
                    depth,
                });

                // If layout with children, try to resolve index child
                if !route.children.is_empty() {
                    try_index_route(&route.children, depth + 1, &params, stack);
                }
                return true;
            }

            // Segments remain and route has children → layout route wrapping children
            if !route.children.is_empty() {
                stack.entries.push(MatchEntry {
                    route: Arc::clone(route),
                    params: params.clone(),
                    depth,
                });

                if resolve_recursive(&route.children, remaining, depth + 1, &params, stack) {
                    return true;
                }

                // Children didn't match → backtrack
                stack.entries.pop();
            }

            continue;
        }

        // Case 2: Route has path segments → try to match against remaining path
        if route_segments.len() > remaining.len() {
            continue; // Not enough path segments
        }

        let mut params = inherited_params.clone();
        let mut matched = true;

        for (i, route_seg) in route_segments.iter().enumerate() {
            if let Some(param_name) = route_seg.strip_prefix(':') {
                params.insert(param_name.to_string(), remaining[i].to_string());
            } else if *route_seg == remaining[i] {
                // Static segment → exact match
            } else {
                matched = false;
                break;
            }
        }

        if !matched {
            continue;
        }

        // Segments matched! Push entry.
        let consumed = route_segments.len();
        let after = &remaining[consumed..];

        stack.entries.push(MatchEntry {
            route: Arc::clone(route),
            params: params.clone(),
            depth,
        });

        if after.is_empty() {
            // All segments consumed
            if !route.children.is_empty() {
                // Has children → try to resolve index child
                try_index_route(&route.children, depth + 1, &params, stack);
            }
            return true;
        }

        // More segments remain → recurse into children
        if !route.children.is_empty()
            && resolve_recursive(&route.children, after, depth + 1, &params, stack)
        {
            return true;
        }

        // No children matched (or no children) → backtrack
        stack.entries.pop();
    }

    false
}

/// Try to find and push an index route (empty path or "index" path child).
///
/// Called when all path segments are consumed but the current route has children.
/// This ensures navigating to `/projects/1` resolves the default child.
fn try_index_route(
    children: &[Arc<Route>],
    depth: usize,
    params: &RouteParams,
    stack: &mut MatchStack,
) {
    // Priority 1: Empty path child
    for child in children {
        let child_path = trim_slashes(&child.path);

        if child_path.is_empty() {
            stack.entries.push(MatchEntry {
                route: Arc::clone(child),
                params: params.clone(),
                depth,
            });

            // Recursively check if index route also has children with index
            if !child.children.is_empty() {
                try_index_route(&child.children, depth + 1, params, stack);
            }
            return;
        }
    }

    // Priority 2: "index" named child
    for child in children {
        let child_path = trim_slashes(&child.path);

        if child_path == "index" {
            stack.entries.push(MatchEntry {
                route: Arc::clone(child),
                params: params.clone(),
                depth,
            });
            return;
        }
    }
}

// Tests live in tests/resolve_tests.rs as a standalone suite.
