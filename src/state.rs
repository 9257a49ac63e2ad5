//! Navigator state management
//!
//! [`RouterState`] owns everything that must change atomically when a
//! transition commits: the history stack, the current match stack and params,
//! and the unsaved-changes flag. The navigator mutates it under one lock so
//! the displayed path and the committed route always agree.
//!
//! It also owns the navigation id counter. Every transition claims a fresh id
//! via [`start_navigation`](RouterState::start_navigation); a transition whose
//! id is no longer current has been superseded and must not apply further
//! effects.

use crate::resolve::MatchStack;
use crate::RouteParams;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Direction of a committed navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    Forward,
    Back,
    Replace,
}

/// Emitted when the committed route changes.
#[derive(Debug, Clone)]
pub struct RouteChangeEvent {
    /// Previous full path; `None` when this is the first committed navigation
    pub from: Option<String>,
    /// New full path
    pub to: String,
    pub direction: NavigationDirection,
}

/// Navigator state
#[derive(Debug)]
pub struct RouterState {
    /// Navigation history stack of full paths (including query strings)
    history: Vec<String>,
    /// Current position in history
    current: usize,
    /// Match stack for the committed route
    current_stack: MatchStack,
    /// Accumulated params of the committed route
    current_params: RouteParams,
    /// Whether the current page reports unsaved edits
    unsaved_changes: bool,
    /// Navigation ID counter for supersession tracking.
    /// Each transition claims a fresh id; stale ids must not apply effects.
    navigation_id: Arc<AtomicUsize>,
}

impl RouterState {
    /// Create state with no committed route (the start location).
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            current: 0,
            current_stack: MatchStack::new(),
            current_params: RouteParams::new(),
            unsaved_changes: false,
            navigation_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get current navigation ID
    pub fn navigation_id(&self) -> usize {
        self.navigation_id.load(Ordering::SeqCst)
    }

    /// Start a new navigation and return the new navigation ID
    ///
    /// This increments the navigation counter, allowing previous navigations
    /// to detect they've been superseded and should stop.
    pub fn start_navigation(&self) -> usize {
        self.navigation_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Check if a navigation is still current (not superseded by a newer one)
    pub fn is_navigation_current(&self, nav_id: usize) -> bool {
        self.navigation_id() == nav_id
    }

    /// Full path of the committed route, `None` before the first commit.
    pub fn current_full_path(&self) -> Option<&str> {
        self.history.get(self.current).map(String::as_str)
    }

    /// Get current route parameters
    pub fn current_params(&self) -> &RouteParams {
        &self.current_params
    }

    /// Match stack of the committed route
    pub fn current_stack(&self) -> &MatchStack {
        &self.current_stack
    }

    /// Store the match stack and params for the committed route.
    pub fn set_current_match(&mut self, stack: MatchStack) {
        self.current_params = stack.params();
        self.current_stack = stack;
    }

    /// Whether the current page reports unsaved edits
    pub fn unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    /// Set the unsaved-changes flag
    pub fn set_unsaved_changes(&mut self, value: bool) {
        self.unsaved_changes = value;
    }

    /// Navigate to a new path
    pub fn push(&mut self, path: String) -> RouteChangeEvent {
        let from = self.current_full_path().map(String::from);

        // Remove forward history when pushing
        if !self.history.is_empty() {
            self.history.truncate(self.current + 1);
        }

        self.history.push(path.clone());
        self.current = self.history.len() - 1;

        RouteChangeEvent {
            from,
            to: path,
            direction: NavigationDirection::Forward,
        }
    }

    /// Replace current path
    pub fn replace(&mut self, path: String) -> RouteChangeEvent {
        let from = self.current_full_path().map(String::from);

        if self.history.is_empty() {
            self.history.push(path.clone());
            self.current = 0;
        } else {
            self.history[self.current] = path.clone();
        }

        RouteChangeEvent {
            from,
            to: path,
            direction: NavigationDirection::Replace,
        }
    }

    /// Go back in history
    pub fn back(&mut self) -> Option<RouteChangeEvent> {
        if self.current > 0 {
            let from = self.current_full_path().map(String::from);
            self.current -= 1;
            let to = self.history[self.current].clone();

            Some(RouteChangeEvent {
                from,
                to,
                direction: NavigationDirection::Back,
            })
        } else {
            None
        }
    }

    /// Go forward in history
    pub fn forward(&mut self) -> Option<RouteChangeEvent> {
        if !self.history.is_empty() && self.current < self.history.len() - 1 {
            let from = self.current_full_path().map(String::from);
            self.current += 1;
            let to = self.history[self.current].clone();

            Some(RouteChangeEvent {
                from,
                to,
                direction: NavigationDirection::Forward,
            })
        } else {
            None
        }
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        !self.history.is_empty() && self.current < self.history.len() - 1
    }

    /// Peek at the path we would navigate to on `back()`, without navigating.
    pub fn peek_back_path(&self) -> Option<&str> {
        if self.current > 0 {
            Some(&self.history[self.current - 1])
        } else {
            None
        }
    }

    /// Peek at the path we would navigate to on `forward()`, without navigating.
    pub fn peek_forward_path(&self) -> Option<&str> {
        if !self.history.is_empty() && self.current < self.history.len() - 1 {
            Some(&self.history[self.current + 1])
        } else {
            None
        }
    }
}

impl Default for RouterState {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RouterState {
    fn clone(&self) -> Self {
        Self {
            history: self.history.clone(),
            current: self.current,
            current_stack: self.current_stack.clone(),
            current_params: self.current_params.clone(),
            unsaved_changes: self.unsaved_changes,
            // Clone Arc, not the AtomicUsize value - share navigation_id across clones
            navigation_id: Arc::clone(&self.navigation_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_location_has_no_path() {
        let state = RouterState::new();
        assert_eq!(state.current_full_path(), None);
        assert!(!state.can_go_back());
        assert!(!state.can_go_forward());
    }

    #[test]
    fn test_navigation() {
        let mut state = RouterState::new();

        let event = state.push("/users".to_string());
        assert_eq!(event.from, None);
        assert_eq!(state.current_full_path(), Some("/users"));

        let event = state.push("/users/123".to_string());
        assert_eq!(event.from.as_deref(), Some("/users"));
        assert_eq!(state.current_full_path(), Some("/users/123"));

        state.back();
        assert_eq!(state.current_full_path(), Some("/users"));

        state.forward();
        assert_eq!(state.current_full_path(), Some("/users/123"));
    }

    #[test]
    fn test_replace() {
        let mut state = RouterState::new();

        state.push("/users".to_string());
        let event = state.replace("/account/edit".to_string());

        assert_eq!(event.direction, NavigationDirection::Replace);
        assert_eq!(state.current_full_path(), Some("/account/edit"));
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_replace_on_start_location() {
        let mut state = RouterState::new();
        let event = state.replace("/".to_string());
        assert_eq!(event.from, None);
        assert_eq!(state.current_full_path(), Some("/"));
    }

    #[test]
    fn test_push_truncates_forward_history() {
        let mut state = RouterState::new();
        state.push("/a".to_string());
        state.push("/b".to_string());
        state.back();
        assert!(state.can_go_forward());

        state.push("/c".to_string());
        assert!(!state.can_go_forward());
        assert_eq!(state.current_full_path(), Some("/c"));
        assert_eq!(state.peek_back_path(), Some("/a"));
    }

    #[test]
    fn test_navigation_ids_supersede() {
        let state = RouterState::new();
        let first = state.start_navigation();
        assert!(state.is_navigation_current(first));

        let second = state.start_navigation();
        assert!(!state.is_navigation_current(first));
        assert!(state.is_navigation_current(second));
    }

    #[test]
    fn test_unsaved_changes_flag() {
        let mut state = RouterState::new();
        assert!(!state.unsaved_changes());
        state.set_unsaved_changes(true);
        assert!(state.unsaved_changes());
    }
}
