//! Claim ownership of broken builds and failing tests.
//!
//! Claims only exist when the server has the claim plugin. Without it every
//! accessor here returns its neutral value (`false`, `None` or `""`).

use crate::model::{CaseResult, ClaimAction, Job, RunRef};
use crate::server::CiServer;
use crate::trend;

/// Claim-related accessors for one job.
#[derive(Debug, Clone, Copy)]
pub struct ClaimView<'a> {
    job: &'a Job,
    enabled: bool,
}

impl<'a> ClaimView<'a> {
    pub fn new(job: &'a Job, server: &dyn CiServer) -> Self {
        Self {
            job,
            enabled: server.has_claim_plugin(),
        }
    }

    /// A view for servers without the claim plugin.
    pub fn disabled(job: &'a Job) -> Self {
        Self {
            job,
            enabled: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Claims can only be made once a build has finished, so a running last
    /// build defers to its predecessor.
    fn last_finished_build(&self) -> Option<RunRef<'a>> {
        if !self.enabled {
            return None;
        }
        let last = self.job.last_build()?;
        if last.building {
            last.previous()
        } else {
            Some(last)
        }
    }

    /// The build-level claim, present only when exactly one is attached.
    pub fn build_claim(&self) -> Option<&'a ClaimAction> {
        match self.last_finished_build()?.build().claims.as_slice() {
            [claim] => Some(claim),
            _ => None,
        }
    }

    /// Failing test cases of the last finished build.
    pub fn failed_cases(&self) -> Option<&'a [CaseResult]> {
        self.last_finished_build()?
            .build()
            .test_result
            .as_ref()
            .map(|t| t.failed_tests.as_slice())
    }

    /// Number of failing tests individually claimed; `None` when no claim
    /// data is available.
    pub fn claimed_test_count(&self) -> Option<usize> {
        self.failed_cases()
            .map(|cases| cases.iter().filter(|c| is_claimed_case(c)).count())
    }

    /// Whether the build is claimed, either explicitly or because every
    /// failing test carries a claim.
    pub fn is_claimed(&self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.build_claim().is_some_and(|c| c.claimed) {
            return true;
        }
        let total = trend::fail_count(self.job) as usize;
        total > 0 && self.claimed_test_count() == Some(total)
    }

    /// Name on the build-level claim, when claimed.
    pub fn build_claimant(&self) -> Option<&'a str> {
        self.build_claim()
            .filter(|c| c.claimed)
            .and_then(|c| c.claimed_by.as_deref())
    }

    /// Distinct claimants across claimed failing tests, in first-seen order.
    pub fn test_claimants(&self) -> Vec<&'a str> {
        let mut names: Vec<&str> = Vec::new();
        for case in self.failed_cases().unwrap_or_default() {
            let Some(claim) = case.claim.as_ref().filter(|c| c.claimed) else {
                continue;
            };
            match claim.claimed_by.as_deref() {
                Some(name) if !name.is_empty() && !names.contains(&name) => names.push(name),
                _ => {}
            }
        }
        names
    }

    /// "Claimed by: a, b" from test claims, else "Build claimed by: x" from
    /// the build claim, else "".
    pub fn claim_info_text(&self) -> String {
        let claimants = self.test_claimants();
        if !claimants.is_empty() {
            return format!("Claimed by: {}", claimants.join(", "));
        }
        match self.build_claimant() {
            Some(name) if !name.is_empty() => format!("Build claimed by: {}", name),
            _ => String::new(),
        }
    }

    /// Failure count for display.
    ///
    /// Empty when there are no failures and zero counts are hidden. With
    /// `replace_with_unclaimed`, shows only the failures nobody has claimed.
    pub fn failed_tests_display(&self, show_zero: bool, replace_with_unclaimed: bool) -> String {
        let failed = i64::from(trend::fail_count(self.job));
        if failed == 0 && !show_zero {
            return String::new();
        }
        if replace_with_unclaimed {
            if let Some(claimed) = self.claimed_test_count() {
                return (failed - claimed as i64).to_string();
            }
        }
        failed.to_string()
    }
}

fn is_claimed_case(case: &CaseResult) -> bool {
    case.claim.as_ref().is_some_and(|c| c.claimed)
}
