use crate::EngineError;

/// Transient user feedback (toasts in the terminal UI).
pub trait Notifier {
    fn success(&mut self, message: &str);

    /// `message` is the human-readable summary, `cause` the failure behind it.
    fn error(&mut self, message: &str, cause: &EngineError);
}
