//! The panel: configuration plus the per-cycle sort entry point.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::entry::{Entry, PanelContext};
use crate::error::ConfigError;
use crate::layout;
use crate::model::Job;
use crate::server::{CiServer, QueueSnapshot};
use crate::sorting;

/// An eXtreme Feedback Panel bound to one CI server.
///
/// Configuration may be replaced at any time from another thread; each
/// `sort` call works on a copy taken when the cycle starts.
pub struct Panel {
    config: RwLock<PanelConfig>,
    server: Arc<dyn CiServer>,
}

impl Panel {
    pub fn new(config: PanelConfig, server: Arc<dyn CiServer>) -> Self {
        Self {
            config: RwLock::new(config),
            server,
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> PanelConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Apply a form submission. On error the last good configuration stays
    /// in effect.
    pub fn submit(&self, form: &HashMap<String, String>) -> Result<(), ConfigError> {
        let mut candidate = self.config();
        if let Err(e) = candidate.apply_form(form) {
            warn!(
                event = "config.rejected",
                field = e.field().unwrap_or("-"),
                error = %e,
            );
            return Err(e);
        }
        self.store(candidate);
        info!(event = "config.applied");
        Ok(())
    }

    /// Replace the whole configuration after validating it.
    pub fn replace_config(&self, config: PanelConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!(event = "config.rejected", error = %e);
            return Err(e);
        }
        self.store(config);
        Ok(())
    }

    /// Set the manual priority of one job.
    pub fn set_priority(&self, job: &str, priority: i32) {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        config.priorities.set(job, priority);
    }

    fn store(&self, config: PanelConfig) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
    }

    /// Jobs in pre-sort order, as used by the configuration page when
    /// `configuration_context` is set.
    pub fn prioritized_jobs<'a>(&self, jobs: &'a [Job], configuration_context: bool) -> Vec<&'a Job> {
        sorting::sort_jobs(jobs, &self.config(), configuration_context)
    }

    /// Height in pixels of one entry under the current configuration.
    pub fn entry_height(&self) -> u32 {
        layout::compute_entry_height(&self.config())
    }

    /// Run one refresh cycle against the current time.
    pub fn sort<'a>(&self, jobs: &'a [Job]) -> Vec<Entry<'a>> {
        self.sort_at(jobs, Utc::now())
    }

    /// Run one refresh cycle: capture the queue, pre-sort the jobs, build one
    /// entry per job and apply the importance and descending orderings.
    pub fn sort_at<'a>(&self, jobs: &'a [Job], now: DateTime<Utc>) -> Vec<Entry<'a>> {
        let config = self.config();
        let queue = QueueSnapshot::capture(self.server.as_ref());

        let span = tracing::info_span!("xfpanel.cycle", jobs = jobs.len(), queued = queue.len());
        let _guard = span.enter();

        let ctx = PanelContext {
            config: &config,
            server: self.server.as_ref(),
            queue: &queue,
            now,
        };

        let mut entries: Vec<Entry<'a>> = sorting::sort_jobs(jobs, &config, false)
            .into_iter()
            .map(|job| {
                let entry = Entry::build(job, &ctx);
                debug!(
                    job = %entry.name,
                    broken = entry.broken,
                    building = entry.building,
                    queue_number = ?entry.queue_number,
                    "entry built"
                );
                entry
            })
            .collect();

        sorting::order_entries(&mut entries, &config.sort);

        info!(
            event = "cycle.sorted",
            entries = entries.len(),
            broken = entries.iter().filter(|e| e.broken).count(),
            building = entries.iter().filter(|e| e.building).count(),
        );
        entries
    }
}
