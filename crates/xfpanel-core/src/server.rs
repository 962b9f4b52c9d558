//! Collaborator interface to the CI server, and the per-cycle queue snapshot.
//!
//! The engine never reaches for a process-wide server instance; every cycle
//! receives a `CiServer` explicitly. In-memory implementations live in
//! `crate::fakes`.

use crate::model::{Job, QueueItemId};
use std::collections::HashMap;

/// Read-only access to server-wide state the engine needs besides the jobs.
pub trait CiServer: Send + Sync {
    /// Pending queue items, in the server's iteration order.
    fn queue_items(&self) -> Vec<QueueItemId>;

    /// Whether the claim plugin is installed. When `false`, every claim
    /// accessor degrades to its neutral value.
    fn has_claim_plugin(&self) -> bool;
}

/// Mapping from queued item to its 1-based position, captured once per cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    positions: HashMap<QueueItemId, usize>,
}

impl QueueSnapshot {
    /// An empty snapshot: nothing is queued.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fresh snapshot from the server's current queue.
    pub fn capture(server: &dyn CiServer) -> Self {
        Self::from_items(server.queue_items())
    }

    pub fn from_items(items: impl IntoIterator<Item = QueueItemId>) -> Self {
        let mut positions = HashMap::new();
        for (i, item) in items.into_iter().enumerate() {
            positions.entry(item).or_insert(i + 1);
        }
        Self { positions }
    }

    /// Position of an item; `None` means "not queued".
    pub fn position(&self, item: QueueItemId) -> Option<usize> {
        self.positions.get(&item).copied()
    }

    /// Position of a job's queue item, if the job is queued.
    pub fn position_of(&self, job: &Job) -> Option<usize> {
        job.queue_item.and_then(|item| self.position(item))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
