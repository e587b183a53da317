//! Status notifications pushed to connected clients.
//!
//! The core never talks to a transport directly. Every status line goes
//! through a [`Notifier`], which logs it and hands it to the injected
//! [`NotificationSink`].

use std::sync::Arc;

use tracing::info;

/// Receiver of free-text status messages. Delivery is best-effort.
pub trait NotificationSink: Send + Sync {
    fn broadcast(&self, message: &str);
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn broadcast(&self, _message: &str) {}
}

/// Logs a message and forwards it to the sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Notifier that only logs.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn notify(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{}", message);
        self.sink.broadcast(message);
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
