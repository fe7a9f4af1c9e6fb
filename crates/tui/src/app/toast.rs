use std::time::{Duration, Instant};

use engine::{EngineError, Notifier};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    expires_at: Instant,
}

/// Last notification. A new one replaces the previous.
#[derive(Debug, Default)]
pub struct Toasts {
    current: Option<ToastState>,
}

impl Toasts {
    pub fn current(&self) -> Option<&ToastState> {
        self.current.as_ref()
    }

    pub fn info(&mut self, message: &str) {
        self.show(message.to_string(), ToastLevel::Info, Instant::now());
    }

    pub fn expire(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.current = None;
        }
    }

    fn show(&mut self, message: String, level: ToastLevel, now: Instant) {
        self.current = Some(ToastState {
            message,
            level,
            expires_at: now + TOAST_TTL,
        });
    }
}

impl Notifier for Toasts {
    fn success(&mut self, message: &str) {
        self.show(message.to_string(), ToastLevel::Success, Instant::now());
    }

    fn error(&mut self, message: &str, cause: &EngineError) {
        self.show(format!("{message}: {cause}"), ToastLevel::Error, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_toast_carries_cause() {
        let mut toasts = Toasts::default();
        toasts.error(
            "Could not load expenses",
            &EngineError::request_failed("timeout"),
        );

        let toast = toasts.current().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(
            toast.message,
            "Could not load expenses: request failed: timeout"
        );
    }

    #[test]
    fn toast_expires_after_ttl() {
        let mut toasts = Toasts::default();
        let now = Instant::now();
        toasts.show("Category saved".to_string(), ToastLevel::Success, now);

        toasts.expire(now + Duration::from_secs(1));
        assert!(toasts.current().is_some());

        toasts.expire(now + TOAST_TTL);
        assert!(toasts.current().is_none());
    }
}
