//! Single-slot notification channel shared by every panel.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Holds at most one toast. A new one replaces the current immediately; there
/// is no queue. Expiry is checked on every UI tick.
#[derive(Debug, Clone)]
pub struct ToastChannel {
    current: Option<Toast>,
    lifetime: Duration,
}

impl ToastChannel {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            current: None,
            lifetime,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.show_at(message, kind, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        self.current = Some(Toast {
            message: message.into(),
            kind,
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, ToastKind::Error);
    }

    /// Drops the current toast once its lifetime has elapsed.
    pub fn expire(&mut self, now: Instant) {
        if let Some(toast) = &self.current
            && now.saturating_duration_since(toast.shown_at) >= self.lifetime
        {
            self.current = None;
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

impl Default for ToastChannel {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
