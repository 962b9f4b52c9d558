//! XFPanel Core Library
//!
//! Derives display entries for an eXtreme Feedback Panel from a CI server's
//! jobs and orders them by urgency.
//!
//! A refresh cycle goes through [`Panel::sort`]: the queue is captured once,
//! jobs are pre-sorted (alphabetically or by manual priority), every job is
//! turned into an [`Entry`] and the entries are optionally ordered by
//! importance (failing, then unstable, then the rest).

pub mod blame;
pub mod claims;
pub mod config;
pub mod entry;
pub mod error;
pub mod fakes;
pub mod layout;
pub mod model;
pub mod panel;
pub mod server;
pub mod snapshot;
pub mod sorting;
pub mod status;
pub mod telemetry;
pub mod trend;

pub use claims::ClaimView;
pub use config::{
    BlamePolicy, ClaimSettings, LayoutConfig, PanelColors, PanelConfig, PriorityTable,
    SortConfig, StatusCategory,
};
pub use entry::{time_span_string, Entry, PanelContext};
pub use error::{ConfigError, PanelError, Result};
pub use fakes::StaticCiServer;
pub use layout::compute_entry_height;
pub use model::{
    BallColor, Build, BuildResult, CaseResult, ChangeSetEntry, ClaimAction, History, Job,
    QueueItemId, RunRef, TestResultSummary, User,
};
pub use panel::Panel;
pub use server::{CiServer, QueueSnapshot};
pub use snapshot::ServerSnapshot;
pub use status::{classify, DisplayStatus};
pub use telemetry::init_tracing;

/// Version of the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
