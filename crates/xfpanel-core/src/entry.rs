//! One display entry per job, assembled from the individual resolvers.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::blame;
use crate::claims::ClaimView;
use crate::config::PanelConfig;
use crate::model::{Job, RunRef};
use crate::server::{CiServer, QueueSnapshot};
use crate::status;
use crate::trend;

/// Read-only inputs shared by every entry of one cycle.
#[derive(Clone, Copy)]
pub struct PanelContext<'a> {
    pub config: &'a PanelConfig,
    pub server: &'a dyn CiServer,
    pub queue: &'a QueueSnapshot,

    /// Cycle clock used for relative timestamps.
    pub now: DateTime<Utc>,
}

/// A renderable panel row derived from a job at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<'a> {
    #[serde(skip)]
    pub job: &'a Job,

    pub name: String,
    pub label: String,
    pub url: String,

    pub background_color: String,
    pub color: String,
    pub color_fade: &'static str,
    pub broken: bool,
    pub building: bool,

    pub queued: bool,
    pub queue_number: Option<usize>,

    pub completion_timestamp: Option<DateTime<Utc>>,
    pub completion_timestamp_string: String,
    pub last_completed_build_number: Option<u32>,
    pub builds_in_progress: Vec<u32>,
    pub build_status: String,
    pub number_of_failed_builds: u32,

    pub test_count: u32,
    pub fail_count: u32,
    pub success_count: i64,
    pub success_percentage: String,
    pub diff: String,
    pub diff_color: String,

    pub show_responsibles: bool,
    pub responsibles: String,

    pub claimed: bool,
    pub claim_info: String,
    pub claimed_test_count: Option<usize>,
    pub number_of_tests: String,
}

impl<'a> Entry<'a> {
    /// Build the entry for `job`. Never fails; missing history and a missing
    /// claim plugin produce empty or neutral values.
    pub fn build(job: &'a Job, ctx: &PanelContext<'_>) -> Self {
        let config = ctx.config;
        let display = status::classify(job.color, &config.colors);
        let claims = ClaimView::new(job, ctx.server);
        let completed = job.last_completed_build();

        let diff = trend::test_diff(job);
        let diff_color = trend::diff_color(&diff, &config.colors);

        Self {
            job,
            name: job.name.clone(),
            label: label(job, config.show_description),
            url: format!("{}lastBuild", job.url),

            background_color: display.background,
            color: display.foreground,
            color_fade: display.fade_icon,
            broken: display.broken,
            building: display.building,

            queued: job.is_in_queue(),
            queue_number: ctx.queue.position_of(job),

            completion_timestamp: completed.map(|r| r.timestamp),
            completion_timestamp_string: completed
                .map(|r| time_span_string(ctx.now.signed_duration_since(r.timestamp)))
                .unwrap_or_default(),
            last_completed_build_number: completed.map(|r| r.number),
            builds_in_progress: builds_in_progress(job),
            build_status: build_status(job.last_build()),
            number_of_failed_builds: number_of_failed_builds(job),

            test_count: trend::test_count(job),
            fail_count: trend::fail_count(job),
            success_count: trend::success_count(job),
            success_percentage: trend::success_percentage(job),
            diff,
            diff_color,

            show_responsibles: config.show_responsibles(),
            responsibles: blame::resolve(job, config.blame, config.max_responsibles),

            claimed: claims.is_claimed(),
            claim_info: claims.claim_info_text(),
            claimed_test_count: claims.claimed_test_count(),
            number_of_tests: claims.failed_tests_display(
                config.show_zero_test_counts,
                config.claims.replace_number_of_test_cases,
            ),
        }
    }

    pub fn is_build_successful(&self) -> bool {
        self.build_status == "SUCCESS"
    }

    pub fn is_build_unstable(&self) -> bool {
        self.build_status == "UNSTABLE"
    }
}

fn label(job: &Job, show_description: bool) -> String {
    let mut label = job.display_name().to_string();
    if show_description && !job.description.is_empty() {
        label.push_str(": ");
        label.push_str(&job.description);
    }
    label
}

/// Numbers of the running builds, newest first.
fn builds_in_progress(job: &Job) -> Vec<u32> {
    let Some(last) = job.last_build() else {
        return Vec::new();
    };
    let mut runs = Vec::new();
    if last.building {
        runs.push(last.number);
    }
    let mut prev = last.previous_in_progress();
    while let Some(run) = prev {
        runs.push(run.number);
        prev = run.previous_in_progress();
    }
    runs
}

/// Result name of the newest finished build, skipping running ones.
fn build_status(run: Option<RunRef<'_>>) -> String {
    let Some(run) = run else {
        return "UNBUILT".to_string();
    };
    if run.building {
        return build_status(run.previous());
    }
    run.result
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Builds completed since the last successful one.
fn number_of_failed_builds(job: &Job) -> u32 {
    match (job.last_successful_build(), job.last_completed_build()) {
        (Some(success), Some(completed)) => completed.number.saturating_sub(success.number),
        _ => 0,
    }
}

/// Human-readable age: the most significant unit, plus the next one while
/// the first is a single digit ("3 min 12 sec", "14 hr", "8.5 sec").
pub fn time_span_string(span: Duration) -> String {
    let millis = span.num_milliseconds().max(0);
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = days / 365;

    let pair = |big: i64, big_unit: &str, small: i64, small_unit: &str| {
        if big < 10 {
            format!("{} {} {} {}", big, big_unit, small, small_unit)
        } else {
            format!("{} {}", big, big_unit)
        }
    };

    if years > 0 {
        pair(years, "yr", months % 12, "mo")
    } else if months > 0 {
        pair(months, "mo", days % 30, "days")
    } else if days > 0 {
        pair(days, "days", hours % 24, "hr")
    } else if hours > 0 {
        pair(hours, "hr", minutes % 60, "min")
    } else if minutes > 0 {
        pair(minutes, "min", seconds % 60, "sec")
    } else if seconds >= 10 {
        format!("{} sec", seconds)
    } else if seconds >= 1 {
        format!("{}.{} sec", seconds, (millis % 1000) / 100)
    } else {
        format!("{} ms", millis)
    }
}
