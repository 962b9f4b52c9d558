//! Test counts and the passing-test delta between successful builds.

use crate::config::PanelColors;
use crate::model::{BuildResult, Job, RunRef, TestResultSummary};

const DIFF_NEGATIVE: &str = "#FF0000";
const DIFF_POSITIVE: &str = "#00FF00";

fn latest_summary(job: &Job) -> Option<&TestResultSummary> {
    job.last_successful_build()
        .and_then(|run| run.build().test_result.as_ref())
}

/// Total tests of the last successful build, 0 when unknown.
pub fn test_count(job: &Job) -> u32 {
    latest_summary(job).map(|s| s.total).unwrap_or(0)
}

/// Failed tests of the last successful build, 0 when unknown.
pub fn fail_count(job: &Job) -> u32 {
    latest_summary(job).map(|s| s.failed).unwrap_or(0)
}

pub fn success_count(job: &Job) -> i64 {
    i64::from(test_count(job)) - i64::from(fail_count(job))
}

/// Passing share as a whole percent ("97%"), or "" with no tests. Exact
/// halves round to even, so 5 of 8 is "62%" and 7 of 8 is "88%".
pub fn success_percentage(job: &Job) -> String {
    let total = test_count(job);
    if total == 0 {
        return String::new();
    }
    format!("{}%", percent_half_even(success_count(job).max(0), i64::from(total)))
}

/// `part / whole` as a whole percent, ties rounded to the even neighbour.
fn percent_half_even(part: i64, whole: i64) -> i64 {
    let scaled = part * 100;
    let (quotient, remainder) = (scaled / whole, scaled % whole);
    match (2 * remainder).cmp(&whole) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal if quotient % 2 == 1 => quotient + 1,
        _ => quotient,
    }
}

/// Nearest earlier build that finished with UNSTABLE or better.
fn previous_qualifying(run: RunRef<'_>) -> Option<RunRef<'_>> {
    run.history().find(|r| {
        !r.building
            && r.result
                .is_some_and(|result| !result.is_worse_than(BuildResult::Unstable))
    })
}

/// Change in passing tests between the last successful build and the one
/// before it, e.g. "+3", "-2" or "±0". Empty when either build or either
/// test summary is missing.
pub fn test_diff(job: &Job) -> String {
    let Some(latest) = job.last_successful_build() else {
        return String::new();
    };
    let Some(previous) = previous_qualifying(latest) else {
        return String::new();
    };
    match (&latest.build().test_result, &previous.build().test_result) {
        (Some(now), Some(before)) => diff_string(now.passed() - before.passed()),
        _ => String::new(),
    }
}

/// Render a signed delta with an explicit sign.
pub fn diff_string(delta: i64) -> String {
    match delta {
        0 => "±0".to_string(),
        d if d > 0 => format!("+{}", d),
        d => d.to_string(),
    }
}

/// Red for a negative diff, green for any other non-empty diff, else the
/// palette's font color.
pub fn diff_color(diff: &str, colors: &PanelColors) -> String {
    let diff = diff.trim();
    if diff.is_empty() {
        colors.font().to_string()
    } else if diff.starts_with('-') {
        DIFF_NEGATIVE.to_string()
    } else {
        DIFF_POSITIVE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BallColor, Build};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, minute, 0).unwrap()
    }

    fn tested(number: u32, result: BuildResult, total: u32, failed: u32) -> Build {
        Build::finished(number, result, ts(number)).with_tests(TestResultSummary::new(total, failed))
    }

    #[test]
    fn test_no_successful_build_gives_empty_diff() {
        let job = Job::new(
            "never-green",
            BallColor::Red,
            vec![
                tested(1, BuildResult::Failure, 10, 5),
                tested(2, BuildResult::Failure, 10, 4),
            ],
        );
        assert_eq!(test_diff(&job), "");
        assert_eq!(test_count(&job), 0);
        assert_eq!(success_percentage(&job), "");
    }

    #[test]
    fn test_diff_skips_failed_and_building_predecessors() {
        let job = Job::new(
            "api",
            BallColor::Blue,
            vec![
                tested(1, BuildResult::Success, 20, 0),
                tested(2, BuildResult::Failure, 5, 5),
                Build::in_progress(3, ts(3)),
                tested(4, BuildResult::Success, 24, 1),
            ],
        );
        // 23 passing now, 20 passing in build 1.
        assert_eq!(test_diff(&job), "+3");
    }

    #[test]
    fn test_diff_accepts_unstable_predecessor() {
        let job = Job::new(
            "api",
            BallColor::Yellow,
            vec![
                tested(1, BuildResult::Unstable, 30, 2),
                tested(2, BuildResult::Unstable, 30, 4),
            ],
        );
        assert_eq!(test_diff(&job), "-2");
    }

    #[test]
    fn test_diff_zero_and_missing_summary() {
        let same = Job::new(
            "same",
            BallColor::Blue,
            vec![
                tested(1, BuildResult::Success, 8, 0),
                tested(2, BuildResult::Success, 8, 0),
            ],
        );
        assert_eq!(test_diff(&same), "±0");

        let untested = Job::new(
            "untested",
            BallColor::Blue,
            vec![
                Build::finished(1, BuildResult::Success, ts(1)),
                tested(2, BuildResult::Success, 8, 0),
            ],
        );
        assert_eq!(test_diff(&untested), "");
    }

    #[test]
    fn test_diff_requires_prior_build() {
        let job = Job::new("single", BallColor::Blue, vec![tested(1, BuildResult::Success, 8, 0)]);
        assert_eq!(test_diff(&job), "");
    }

    #[test]
    fn test_counts_and_percentage() {
        let job = Job::new("api", BallColor::Yellow, vec![tested(1, BuildResult::Unstable, 3, 1)]);
        assert_eq!(test_count(&job), 3);
        assert_eq!(fail_count(&job), 1);
        assert_eq!(success_count(&job), 2);
        assert_eq!(success_percentage(&job), "67%");
    }

    #[test]
    fn test_percentage_ties_round_to_even() {
        let five_of_eight = Job::new("a", BallColor::Yellow, vec![tested(1, BuildResult::Unstable, 8, 3)]);
        assert_eq!(success_percentage(&five_of_eight), "62%");

        let seven_of_eight = Job::new("b", BallColor::Yellow, vec![tested(1, BuildResult::Unstable, 8, 1)]);
        assert_eq!(success_percentage(&seven_of_eight), "88%");

        let one_of_two_hundred = Job::new("c", BallColor::Yellow, vec![tested(1, BuildResult::Unstable, 200, 199)]);
        assert_eq!(success_percentage(&one_of_two_hundred), "0%");

        let all_failing = Job::new("d", BallColor::Yellow, vec![tested(1, BuildResult::Unstable, 4, 4)]);
        assert_eq!(success_percentage(&all_failing), "0%");
    }

    #[test]
    fn test_diff_color() {
        let colors = PanelColors::default();
        assert_eq!(diff_color("-4", &colors), "#FF0000");
        assert_eq!(diff_color("+1", &colors), "#00FF00");
        assert_eq!(diff_color("±0", &colors), "#00FF00");
        assert_eq!(diff_color("", &colors), "#FFFFFF");
    }
}
