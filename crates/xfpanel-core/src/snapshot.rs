//! JSON snapshot of a CI server: jobs, build queue and plugin flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fakes::StaticCiServer;
use crate::model::{Job, QueueItemId};

/// Everything one refresh cycle needs from the server, as a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerSnapshot {
    #[serde(default)]
    pub jobs: Vec<Job>,

    /// Pending queue items, front of the queue first.
    #[serde(default)]
    pub queue: Vec<QueueItemId>,

    #[serde(default)]
    pub claim_plugin: bool,
}

impl ServerSnapshot {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// A `CiServer` reflecting this snapshot's queue and plugin flag.
    pub fn server(&self) -> StaticCiServer {
        let server = StaticCiServer::new();
        self.apply_to(&server);
        server
    }

    /// Bring an existing server in line with this snapshot's queue and
    /// plugin flag.
    pub fn apply_to(&self, server: &StaticCiServer) {
        server.set_queue(self.queue.iter().copied());
        server.set_claim_plugin(self.claim_plugin);
    }
}
