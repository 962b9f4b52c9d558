//! Responsible users for a broken job under the configured blame policy.

use crate::config::BlamePolicy;
use crate::model::{Job, User};

/// Shown when the policy has no build to inspect.
pub const NO_APPLICABLE_BUILD: &str = " -";

/// Shown when a build was inspected but had no authors.
pub const NO_AUTHORS: &str = " - ";

/// Resolve and format the responsibles for `job`.
pub fn resolve(job: &Job, policy: BlamePolicy, max_names: usize) -> String {
    match responsibles(job, policy) {
        Some(users) => format_names(&users, max_names),
        None => NO_APPLICABLE_BUILD.to_string(),
    }
}

/// Users responsible under `policy`, deduplicated by identity in first-seen
/// order. `None` when the policy does not apply or has no build to look at.
pub fn responsibles(job: &Job, policy: BlamePolicy) -> Option<Vec<&User>> {
    match policy {
        BlamePolicy::NotAtAll => None,
        BlamePolicy::OnlyFirstFailedBuild => {
            let run = match job.last_stable_build() {
                Some(stable) => stable.next(),
                None => job.first_build(),
            }?;
            Some(dedup(run.build().authors()))
        }
        BlamePolicy::OnlyLastFailedBuild => {
            let run = job.last_failed_build()?;
            Some(dedup(run.build().authors()))
        }
        BlamePolicy::EveryInvolved => {
            let run = job.last_build()?;
            Some(dedup(run.build().culprits.iter()))
        }
    }
}

fn dedup<'a>(users: impl Iterator<Item = &'a User>) -> Vec<&'a User> {
    let mut seen: Vec<&User> = Vec::new();
    for user in users {
        if !seen.iter().any(|u| u.id == user.id) {
            seen.push(user);
        }
    }
    seen
}

/// Join up to `max_names` full names with ", ", appending "... <K more>"
/// for the overflow. Returns `" - "` when there are no users.
///
/// When names overflow, the separator after the last listed name is kept:
/// `"Ann, Bob, ... <1 more>"`.
pub fn format_names(users: &[&User], max_names: usize) -> String {
    let mut output = String::new();
    for (i, user) in users.iter().take(max_names).enumerate() {
        output.push_str(&user.full_name);
        if i + 1 < users.len() {
            output.push_str(", ");
        }
    }
    if users.len() > max_names {
        output.push_str(&format!("... <{} more>", users.len() - max_names));
    }
    if output.is_empty() {
        return NO_AUTHORS.to_string();
    }
    output
}
