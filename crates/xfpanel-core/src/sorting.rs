//! Job pre-sort (alphabetical or manual priority) and the automatic
//! importance ordering of entries.

use std::cmp::Ordering;

use crate::config::{PanelConfig, SortConfig};
use crate::entry::Entry;
use crate::model::{BuildResult, Job, RunRef};

/// Priority given to jobs missing from the manual table.
pub const UNPRIORITIZED: i32 = i32::MAX;

/// Pre-sort the raw job list.
///
/// In manual mode jobs are ordered by their table priority, with unknown
/// jobs last. Otherwise, and for ties, jobs are ordered by case-insensitive
/// name. In a configuration context, jobs selected for the panel come before
/// unselected ones.
pub fn sort_jobs<'a>(
    jobs: &'a [Job],
    config: &PanelConfig,
    configuration_context: bool,
) -> Vec<&'a Job> {
    let mut sorted: Vec<&Job> = jobs.iter().collect();
    if config.sort.manual {
        sorted.sort_by(|a, b| {
            manual_priority(a, config, configuration_context)
                .cmp(&manual_priority(b, config, configuration_context))
                .then_with(|| compare_alphabetical(a, b, config, configuration_context))
        });
    } else {
        sorted.sort_by(|a, b| compare_alphabetical(a, b, config, configuration_context));
    }
    sorted
}

fn manual_priority(job: &Job, config: &PanelConfig, configuration_context: bool) -> i32 {
    if configuration_context && !config.is_selected(&job.name) {
        return UNPRIORITIZED;
    }
    config.priorities.get(&job.name).unwrap_or(UNPRIORITIZED)
}

fn compare_alphabetical(
    a: &Job,
    b: &Job,
    config: &PanelConfig,
    configuration_context: bool,
) -> Ordering {
    let by_membership = if configuration_context {
        config
            .is_selected(&b.name)
            .cmp(&config.is_selected(&a.name))
    } else {
        Ordering::Equal
    };
    by_membership.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Severity of a job's state; higher means more urgent.
///
/// A running build takes the severity of the build before it. No build at
/// all counts like an aborted one.
pub fn build_priority(run: Option<RunRef<'_>>) -> u8 {
    let Some(run) = run else {
        return 1;
    };
    if run.building {
        return build_priority(run.previous());
    }
    match run.result {
        Some(BuildResult::Success) => 0,
        Some(BuildResult::Aborted) | Some(BuildResult::NotBuilt) => 1,
        Some(BuildResult::Unstable) => 2,
        Some(BuildResult::Failure) => 3,
        None => 1,
    }
}

/// Most severe first; then existing builds before none, running before
/// finished, and newer before older.
pub fn compare_importance(a: &Entry<'_>, b: &Entry<'_>) -> Ordering {
    let (run_a, run_b) = (a.job.last_build(), b.job.last_build());
    build_priority(run_b)
        .cmp(&build_priority(run_a))
        .then_with(|| tie_break(run_a, run_b))
}

fn tie_break(a: Option<RunRef<'_>>, b: Option<RunRef<'_>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.building, b.building) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.timestamp.cmp(&a.timestamp),
        },
    }
}

/// Apply the automatic importance sort (when enabled) and then the
/// descending flag.
pub fn order_entries(entries: &mut [Entry<'_>], sort: &SortConfig) {
    if sort.automatic {
        entries.sort_by(compare_importance);
    }
    if sort.descending {
        entries.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriorityTable;
    use crate::model::{BallColor, Build};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 3, 16, minute, 0).unwrap()
    }

    fn names(jobs: &[&Job]) -> Vec<String> {
        jobs.iter().map(|j| j.name.clone()).collect()
    }

    fn bare(name: &str) -> Job {
        Job::new(name, BallColor::Blue, vec![])
    }

    #[test]
    fn test_alphabetical_is_case_insensitive() {
        let jobs: Vec<Job> = ["name4", "Name3", "name2", "Name1", "name0"]
            .into_iter()
            .map(bare)
            .collect();
        let sorted = sort_jobs(&jobs, &PanelConfig::default(), false);
        assert_eq!(names(&sorted), vec!["name0", "Name1", "name2", "Name3", "name4"]);
    }

    #[test]
    fn test_selected_jobs_first_in_configuration_context() {
        let jobs: Vec<Job> = ["alpha", "beta", "gamma"].into_iter().map(bare).collect();
        let config = PanelConfig {
            selected_jobs: vec!["gamma".to_string()],
            ..PanelConfig::default()
        };
        assert_eq!(
            names(&sort_jobs(&jobs, &config, true)),
            vec!["gamma", "alpha", "beta"]
        );
        assert_eq!(
            names(&sort_jobs(&jobs, &config, false)),
            vec!["alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn test_manual_priority_with_missing_job_last() {
        let jobs: Vec<Job> = ["C", "B", "A"].into_iter().map(bare).collect();
        let mut config = PanelConfig::default();
        config.sort.manual = true;
        config.priorities = PriorityTable::from_iter([("A", 1), ("B", 3)]);
        assert_eq!(names(&sort_jobs(&jobs, &config, false)), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_manual_priority_permutation_for_selected_jobs() {
        let order = ["name4", "Name3", "name2", "Name1", "name0"];
        let jobs: Vec<Job> = order.into_iter().map(bare).collect();
        let priorities = [1, 3, 2, 0, 4];
        let mut config = PanelConfig::default();
        config.sort.manual = true;
        config.selected_jobs = order.iter().map(|n| n.to_string()).collect();
        config.priorities = order.into_iter().zip(priorities).collect();

        let sorted = sort_jobs(&jobs, &config, true);
        for (name, priority) in order.iter().zip(priorities) {
            assert_eq!(sorted[priority as usize].name, *name);
        }
    }

    #[test]
    fn test_manual_unknown_job_sorts_after_named_ones() {
        let jobs: Vec<Job> = ["aaa", "zzz"].into_iter().map(bare).collect();
        let mut config = PanelConfig::default();
        config.sort.manual = true;
        config.priorities = PriorityTable::from_iter([("zzz", 100)]);
        assert_eq!(names(&sort_jobs(&jobs, &config, false)), vec!["zzz", "aaa"]);
    }

    #[test]
    fn test_manual_ties_break_alphabetically() {
        let jobs: Vec<Job> = ["delta", "Charlie", "bravo"].into_iter().map(bare).collect();
        let mut config = PanelConfig::default();
        config.sort.manual = true;
        config.priorities = PriorityTable::from_iter([("delta", 2), ("Charlie", 2), ("bravo", 2)]);
        assert_eq!(
            names(&sort_jobs(&jobs, &config, false)),
            vec!["bravo", "Charlie", "delta"]
        );
    }

    #[test]
    fn test_manual_unselected_job_last_in_configuration_context() {
        let jobs: Vec<Job> = ["one", "two"].into_iter().map(bare).collect();
        let mut config = PanelConfig::default();
        config.sort.manual = true;
        config.selected_jobs = vec!["two".to_string()];
        config.priorities = PriorityTable::from_iter([("one", 0), ("two", 5)]);
        assert_eq!(names(&sort_jobs(&jobs, &config, true)), vec!["two", "one"]);
        assert_eq!(names(&sort_jobs(&jobs, &config, false)), vec!["one", "two"]);
    }

    #[test]
    fn test_build_priority_scores() {
        let job = Job::new(
            "j",
            BallColor::Blue,
            vec![
                Build::finished(1, BuildResult::Success, ts(1)),
                Build::finished(2, BuildResult::Aborted, ts(2)),
                Build::finished(3, BuildResult::Unstable, ts(3)),
                Build::finished(4, BuildResult::Failure, ts(4)),
                Build::in_progress(5, ts(5)),
            ],
        );
        let runs: Vec<u8> = std::iter::successors(job.last_build(), |r| r.previous())
            .map(|r| build_priority(Some(r)))
            .collect();
        assert_eq!(runs, vec![3, 3, 2, 1, 0]);
        assert_eq!(build_priority(None), 1);
    }
}
