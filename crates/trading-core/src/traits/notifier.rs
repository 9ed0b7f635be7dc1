//! Notification boundary.

/// Best-effort, fire-and-forget message delivery.
///
/// `notify` must return promptly and must never fail the caller; delivery
/// problems are the implementation's to log.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
