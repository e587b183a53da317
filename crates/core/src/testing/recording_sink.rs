//! Notification sink that records messages for assertions.

use std::sync::Mutex;

use crate::notify::NotificationSink;

/// Records every broadcast message in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// True if any message starts with `prefix`.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.starts_with(prefix))
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn broadcast(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
