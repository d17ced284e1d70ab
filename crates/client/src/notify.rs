//! User-facing notifications (toasts).

/// Fire-and-forget sink for user-facing success and error messages.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that emits `tracing` events; suitable for headless clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "parley::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!(target: "parley::notify", "{}", message);
    }
}
