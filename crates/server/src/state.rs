use std::sync::Arc;

use sortarr_core::{Config, DownloadQueue, Notifier};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    queue: Arc<DownloadQueue>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(config: Config, queue: Arc<DownloadQueue>, ws_broadcaster: WsBroadcaster) -> Self {
        Self {
            config,
            queue,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &Arc<DownloadQueue> {
        &self.queue
    }

    /// Notifier shared with the queue, for messages raised by handlers.
    pub fn notifier(&self) -> &Notifier {
        self.queue.runner().notifier()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
