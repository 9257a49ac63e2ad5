//! Transient alert banner state.
//!
//! One alert is visible at a time. Raising a new alert replaces the current
//! one; the ambient-cleanup stage dismisses whatever is visible when a
//! transition commits, so alerts never outlive the page they were raised on.

use std::fmt;
use std::sync::Mutex;

/// Visual weight of an alert banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Success,
    Info,
    Warning,
    Danger,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertSeverity::Success => "success",
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Danger => "danger",
        };
        f.write_str(name)
    }
}

/// A transient notification banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
}

/// Holder of the currently visible alert, if any.
#[derive(Debug, Default)]
pub struct AlertStore {
    current: Mutex<Option<Alert>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show an alert, replacing any visible one.
    pub fn raise(&self, severity: AlertSeverity, message: impl Into<String>) {
        let alert = Alert {
            severity,
            message: message.into(),
        };
        crate::debug_log!("alert raised ({}): {}", alert.severity, alert.message);
        *self.current.lock().unwrap() = Some(alert);
    }

    /// Convenience for [`AlertSeverity::Success`].
    pub fn success(&self, message: impl Into<String>) {
        self.raise(AlertSeverity::Success, message);
    }

    /// Convenience for [`AlertSeverity::Danger`].
    pub fn danger(&self, message: impl Into<String>) {
        self.raise(AlertSeverity::Danger, message);
    }

    /// Hide the current alert, if any.
    pub fn dismiss(&self) {
        let mut current = self.current.lock().unwrap();
        if current.is_some() {
            crate::trace_log!("alert dismissed");
            *current = None;
        }
    }

    /// Snapshot of the visible alert.
    pub fn current(&self) -> Option<Alert> {
        self.current.lock().unwrap().clone()
    }

    /// Whether an alert is visible.
    pub fn is_visible(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }
}
