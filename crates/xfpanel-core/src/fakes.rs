//! In-memory `CiServer` implementation.
//!
//! Used by tests and by hosts that already hold a full snapshot of the
//! server state (for example one loaded from a JSON file).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::model::QueueItemId;
use crate::server::CiServer;

/// A `CiServer` backed by a fixed queue and a claim-plugin flag.
///
/// The queue and the plugin flag can be replaced between cycles with
/// [`StaticCiServer::set_queue`] and [`StaticCiServer::set_claim_plugin`].
#[derive(Debug, Default)]
pub struct StaticCiServer {
    queue: Mutex<Vec<QueueItemId>>,
    claim_plugin: AtomicBool,
}

impl StaticCiServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, items: impl IntoIterator<Item = QueueItemId>) -> Self {
        self.queue = Mutex::new(items.into_iter().collect());
        self
    }

    pub fn with_claim_plugin(self, installed: bool) -> Self {
        self.set_claim_plugin(installed);
        self
    }

    pub fn set_claim_plugin(&self, installed: bool) {
        self.claim_plugin.store(installed, Ordering::Relaxed);
    }

    pub fn set_queue(&self, items: impl IntoIterator<Item = QueueItemId>) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        *queue = items.into_iter().collect();
    }
}

impl CiServer for StaticCiServer {
    fn queue_items(&self) -> Vec<QueueItemId> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn has_claim_plugin(&self) -> bool {
        self.claim_plugin.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_server_queue_replaced() {
        let server = StaticCiServer::new().with_queue([QueueItemId(1), QueueItemId(2)]);
        assert_eq!(server.queue_items().len(), 2);
        server.set_queue([QueueItemId(3)]);
        assert_eq!(server.queue_items(), vec![QueueItemId(3)]);
        assert!(!server.has_claim_plugin());
    }

    #[test]
    fn test_claim_plugin_toggled_in_place() {
        let server = StaticCiServer::new().with_claim_plugin(true);
        assert!(server.has_claim_plugin());
        server.set_claim_plugin(false);
        assert!(!server.has_claim_plugin());
    }
}
