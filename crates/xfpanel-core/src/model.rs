//! Read-only view of the CI server's jobs and build history.
//!
//! The host materializes everything in memory before a cycle runs:
//! - `Job`: a buildable unit with a chronological list of builds
//! - `Build`: one execution attempt with result, tests, authorship and claims
//! - `RunRef`: a handle to one build of a job, able to walk its neighbours
//! - `History`: a lazy backward walk over earlier builds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// The CI server's compact status + animation signal for a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BallColor {
    Blue,
    BlueAnime,
    Yellow,
    YellowAnime,
    Red,
    RedAnime,
    Grey,
    GreyAnime,
    Disabled,
    DisabledAnime,
    Aborted,
    AbortedAnime,
    NotBuilt,
    NotBuiltAnime,
}

impl BallColor {
    /// Whether the signal is an "in animation" variant (a build is running).
    pub fn is_animated(&self) -> bool {
        matches!(
            self,
            BallColor::BlueAnime
                | BallColor::YellowAnime
                | BallColor::RedAnime
                | BallColor::GreyAnime
                | BallColor::DisabledAnime
                | BallColor::AbortedAnime
                | BallColor::NotBuiltAnime
        )
    }
}

/// Result of a finished build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    fn ordinal(&self) -> u8 {
        match self {
            BuildResult::Success => 0,
            BuildResult::Unstable => 1,
            BuildResult::Failure => 2,
            BuildResult::NotBuilt => 3,
            BuildResult::Aborted => 4,
        }
    }

    /// `true` if this result is strictly worse than `other`.
    pub fn is_worse_than(&self, other: BuildResult) -> bool {
        self.ordinal() > other.ordinal()
    }

    /// `true` if this result is at least as good as `other`.
    pub fn is_better_or_equal(&self, other: BuildResult) -> bool {
        self.ordinal() <= other.ordinal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CI server user. Identity is the `id`; the full name is for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub full_name: String,
}

impl User {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
        }
    }
}

/// One change-set entry contributing to a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSetEntry {
    pub author: User,

    #[serde(default)]
    pub message: String,
}

/// A claim attached to a build or to a single failing test.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimAction {
    pub claimed: bool,

    #[serde(default)]
    pub claimed_by: Option<String>,

    #[serde(default)]
    pub reason: Option<String>,
}

impl ClaimAction {
    pub fn claimed_by(name: impl Into<String>) -> Self {
        Self {
            claimed: true,
            claimed_by: Some(name.into()),
            reason: None,
        }
    }
}

/// A failing test case and its optional claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseResult {
    pub name: String,

    #[serde(default)]
    pub claim: Option<ClaimAction>,
}

/// Test-result summary attached to a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResultSummary {
    pub total: u32,
    pub failed: u32,

    /// Individual failing cases; may be empty when the publisher only reports counts.
    #[serde(default)]
    pub failed_tests: Vec<CaseResult>,
}

impl TestResultSummary {
    pub fn new(total: u32, failed: u32) -> Self {
        Self {
            total,
            failed,
            failed_tests: Vec::new(),
        }
    }

    /// Passing test count.
    pub fn passed(&self) -> i64 {
        i64::from(self.total) - i64::from(self.failed)
    }
}

/// One execution attempt of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Build {
    pub number: u32,

    /// `None` while building or when the server never recorded one.
    #[serde(default)]
    pub result: Option<BuildResult>,

    #[serde(default)]
    pub building: bool,

    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub change_set: Vec<ChangeSetEntry>,

    /// Server-computed culprits across the failing streak.
    #[serde(default)]
    pub culprits: Vec<User>,

    #[serde(default)]
    pub test_result: Option<TestResultSummary>,

    #[serde(default)]
    pub claims: Vec<ClaimAction>,
}

impl Build {
    /// A finished build with the given result.
    pub fn finished(number: u32, result: BuildResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            number,
            result: Some(result),
            building: false,
            timestamp,
            change_set: Vec::new(),
            culprits: Vec::new(),
            test_result: None,
            claims: Vec::new(),
        }
    }

    /// A build that is still running.
    pub fn in_progress(number: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            result: None,
            building: true,
            ..Self::finished(number, BuildResult::Success, timestamp)
        }
    }

    pub fn with_tests(mut self, summary: TestResultSummary) -> Self {
        self.test_result = Some(summary);
        self
    }

    pub fn with_authors(mut self, authors: impl IntoIterator<Item = User>) -> Self {
        self.change_set.extend(authors.into_iter().map(|author| ChangeSetEntry {
            author,
            message: String::new(),
        }));
        self
    }

    pub fn with_culprits(mut self, culprits: impl IntoIterator<Item = User>) -> Self {
        self.culprits.extend(culprits);
        self
    }

    pub fn with_claim(mut self, claim: ClaimAction) -> Self {
        self.claims.push(claim);
        self
    }

    /// Authors of every change-set entry, in change-set order.
    pub fn authors(&self) -> impl Iterator<Item = &User> {
        self.change_set.iter().map(|e| &e.author)
    }
}

/// Identity of a pending item in the CI server's build queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct QueueItemId(pub u64);

impl std::fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
struct JobRecord {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
    color: BallColor,
    #[serde(default)]
    queue_item: Option<QueueItemId>,
    #[serde(default)]
    builds: Vec<Build>,
}

impl From<JobRecord> for Job {
    fn from(record: JobRecord) -> Self {
        let mut job = Job::new(record.name, record.color, record.builds);
        job.display_name = record.display_name;
        job.description = record.description;
        if let Some(url) = record.url {
            job.url = url;
        }
        job.queue_item = record.queue_item;
        job
    }
}

/// A configured buildable unit with its build history.
///
/// Builds are kept in ascending build-number order so that "previous" and
/// "next" are positional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "JobRecord")]
pub struct Job {
    pub name: String,
    pub display_name: Option<String>,
    pub description: String,
    pub url: String,
    pub color: BallColor,

    /// Queue item for this job, when it is waiting in the build queue.
    pub queue_item: Option<QueueItemId>,

    builds: Vec<Build>,
}

impl Job {
    pub fn new(name: impl Into<String>, color: BallColor, mut builds: Vec<Build>) -> Self {
        builds.sort_by_key(|b| b.number);
        let name = name.into();
        Self {
            url: format!("job/{}/", name),
            name,
            display_name: None,
            description: String::new(),
            color,
            queue_item: None,
            builds,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn queued_as(mut self, item: QueueItemId) -> Self {
        self.queue_item = Some(item);
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_in_queue(&self) -> bool {
        self.queue_item.is_some()
    }

    pub fn builds(&self) -> &[Build] {
        &self.builds
    }

    fn run(&self, index: usize) -> RunRef<'_> {
        RunRef { job: self, index }
    }

    fn latest_where(&self, pred: impl Fn(&Build) -> bool) -> Option<RunRef<'_>> {
        self.builds.iter().rposition(pred).map(|i| self.run(i))
    }

    pub fn first_build(&self) -> Option<RunRef<'_>> {
        (!self.builds.is_empty()).then(|| self.run(0))
    }

    pub fn last_build(&self) -> Option<RunRef<'_>> {
        self.builds.len().checked_sub(1).map(|i| self.run(i))
    }

    /// Latest build that is no longer running.
    pub fn last_completed_build(&self) -> Option<RunRef<'_>> {
        self.latest_where(|b| !b.building)
    }

    /// Latest finished build with a result of UNSTABLE or better.
    pub fn last_successful_build(&self) -> Option<RunRef<'_>> {
        self.latest_where(|b| {
            !b.building
                && b.result
                    .is_some_and(|r| r.is_better_or_equal(BuildResult::Unstable))
        })
    }

    /// Latest finished build with a SUCCESS result.
    pub fn last_stable_build(&self) -> Option<RunRef<'_>> {
        self.latest_where(|b| !b.building && b.result == Some(BuildResult::Success))
    }

    /// Latest finished build with a FAILURE result.
    pub fn last_failed_build(&self) -> Option<RunRef<'_>> {
        self.latest_where(|b| !b.building && b.result == Some(BuildResult::Failure))
    }
}

/// A handle to one build inside its job's history.
#[derive(Debug, Clone, Copy)]
pub struct RunRef<'a> {
    job: &'a Job,
    index: usize,
}

impl<'a> RunRef<'a> {
    pub fn job(&self) -> &'a Job {
        self.job
    }

    pub fn build(&self) -> &'a Build {
        &self.job.builds[self.index]
    }

    pub fn previous(&self) -> Option<RunRef<'a>> {
        self.index.checked_sub(1).map(|i| self.job.run(i))
    }

    pub fn next(&self) -> Option<RunRef<'a>> {
        let i = self.index + 1;
        (i < self.job.builds.len()).then(|| self.job.run(i))
    }

    /// Nearest earlier build that is still running.
    pub fn previous_in_progress(&self) -> Option<RunRef<'a>> {
        self.history().find(|r| r.building)
    }

    /// Lazy walk over every earlier build, newest first.
    pub fn history(&self) -> History<'a> {
        History {
            next: self.previous(),
        }
    }
}

impl<'a> Deref for RunRef<'a> {
    type Target = Build;

    fn deref(&self) -> &Build {
        self.build()
    }
}

/// Backward walk over a job's builds. Cloning restarts from the same point.
#[derive(Debug, Clone)]
pub struct History<'a> {
    next: Option<RunRef<'a>>,
}

impl<'a> Iterator for History<'a> {
    type Item = RunRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.previous();
        Some(current)
    }
}
