//! Run reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use regsweep_core::{Decision, Reason};

use crate::resolver::SkippedTag;

/// Per-reason decision counts for one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCounts {
    /// Tags kept by the keep-count floor.
    pub within_keep_count: usize,

    /// Tags kept because their age is within the threshold.
    pub within_age: usize,

    /// Tags kept because their digest is shared with a kept tag.
    pub shared_digest: usize,

    /// Tags whose digest was requested for deletion.
    pub aged_out: usize,

    /// Tags whose deletion failed after exhausting retries.
    pub errors: usize,
}

impl ReasonCounts {
    fn record(&mut self, decision: &Decision) {
        match decision.reason {
            Reason::WithinKeepCount => self.within_keep_count += 1,
            Reason::WithinAge => self.within_age += 1,
            Reason::DigestSharedWithKeptTag => self.shared_digest += 1,
            Reason::AgedOut => self.aged_out += 1,
            Reason::Error => self.errors += 1,
        }
    }
}

/// What happened to one repository during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoReport {
    /// Repository name.
    pub repository: String,

    /// Decision counts by reason.
    pub counts: ReasonCounts,

    /// Tags left out of policy evaluation because resolution failed.
    pub skipped: Vec<SkippedTag>,

    /// Number of digests actually deleted (always zero in a dry run).
    pub deleted_digests: usize,

    /// Set when the repository could not be processed at all, e.g. its
    /// tag list could not be fetched.
    pub failed: Option<String>,
}

impl RepoReport {
    /// Builds a report from a repository's final decisions.
    #[must_use]
    pub fn from_decisions(
        repository: impl Into<String>,
        decisions: &[Decision],
        skipped: Vec<SkippedTag>,
        deleted_digests: usize,
    ) -> Self {
        let mut counts = ReasonCounts::default();
        for decision in decisions {
            counts.record(decision);
        }
        Self {
            repository: repository.into(),
            counts,
            skipped,
            deleted_digests,
            failed: None,
        }
    }

    /// Builds a report for a repository with no tags to evaluate.
    #[must_use]
    pub fn empty(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            counts: ReasonCounts::default(),
            skipped: Vec::new(),
            deleted_digests: 0,
            failed: None,
        }
    }

    /// Builds a report for a repository that could not be processed.
    #[must_use]
    pub fn failed(repository: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            counts: ReasonCounts::default(),
            skipped: Vec::new(),
            deleted_digests: 0,
            failed: Some(error.into()),
        }
    }

    /// Returns true if anything in this repository went wrong: a deletion
    /// failure, an unresolvable tag, or a repository-level failure.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.counts.errors > 0 || !self.skipped.is_empty() || self.failed.is_some()
    }
}

/// The outcome of a full run across all selected repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Per-repository outcomes, in completion order.
    pub repos: Vec<RepoReport>,
}

impl RunReport {
    /// Creates a report over the given repository outcomes.
    #[must_use]
    pub fn new(dry_run: bool, repos: Vec<RepoReport>) -> Self {
        Self { dry_run, repos }
    }

    /// Aggregated decision counts across all repositories.
    #[must_use]
    pub fn totals(&self) -> ReasonCounts {
        let mut totals = ReasonCounts::default();
        for repo in &self.repos {
            totals.within_keep_count += repo.counts.within_keep_count;
            totals.within_age += repo.counts.within_age;
            totals.shared_digest += repo.counts.shared_digest;
            totals.aged_out += repo.counts.aged_out;
            totals.errors += repo.counts.errors;
        }
        totals
    }

    /// Total digests deleted across all repositories.
    #[must_use]
    pub fn deleted_digests(&self) -> usize {
        self.repos.iter().map(|repo| repo.deleted_digests).sum()
    }

    /// Returns true if any repository reported an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.repos.iter().any(RepoReport::has_errors)
    }

    /// The process exit code for this run: 0 on a clean run, 1 when any
    /// tag, digest, or repository failed.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_errors())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = self.totals();
        let mode = if self.dry_run { " (dry run)" } else { "" };

        writeln!(f, "run summary{mode}: {} repositories", self.repos.len())?;
        for repo in &self.repos {
            if let Some(error) = &repo.failed {
                writeln!(f, "  {}: failed: {error}", repo.repository)?;
                continue;
            }
            writeln!(
                f,
                "  {}: kept {} (floor {}, age {}, shared {}), delete {}, errors {}, skipped {}, deleted {} digests",
                repo.repository,
                repo.counts.within_keep_count + repo.counts.within_age + repo.counts.shared_digest,
                repo.counts.within_keep_count,
                repo.counts.within_age,
                repo.counts.shared_digest,
                repo.counts.aged_out,
                repo.counts.errors,
                repo.skipped.len(),
                repo.deleted_digests,
            )?;
        }
        write!(
            f,
            "totals: kept {}, delete {}, errors {}, deleted {} digests",
            totals.within_keep_count + totals.within_age + totals.shared_digest,
            totals.aged_out,
            totals.errors,
            self.deleted_digests(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use regsweep_core::{Decision, ManifestKind, Reason, Tag};

    fn tag(name: &str, digest: &str) -> Tag {
        Tag::new(
            name,
            digest,
            ManifestKind::Single,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_counts_from_decisions() {
        let decisions = vec![
            Decision::keep(tag("v3", "sha256:c"), Reason::WithinKeepCount),
            Decision::keep(tag("v2", "sha256:b"), Reason::WithinAge),
            Decision::delete(tag("v1", "sha256:a"), Reason::AgedOut),
        ];
        let report = RepoReport::from_decisions("app", &decisions, Vec::new(), 1);

        assert_eq!(report.counts.within_keep_count, 1);
        assert_eq!(report.counts.within_age, 1);
        assert_eq!(report.counts.aged_out, 1);
        assert_eq!(report.deleted_digests, 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_skipped_tags_count_as_errors() {
        let report = RepoReport::from_decisions(
            "app",
            &[],
            vec![SkippedTag {
                name: "v1".to_string(),
                error: "boom".to_string(),
            }],
            0,
        );
        assert!(report.has_errors());
    }

    #[test]
    fn test_exit_code() {
        let clean = RunReport::new(false, vec![RepoReport::empty("app")]);
        assert_eq!(clean.exit_code(), 0);

        let failed = RunReport::new(false, vec![RepoReport::failed("app", "tags unavailable")]);
        assert_eq!(failed.exit_code(), 1);
    }

    #[test]
    fn test_display_mentions_dry_run() {
        let report = RunReport::new(true, vec![RepoReport::empty("app")]);
        assert!(report.to_string().contains("(dry run)"));
    }

    #[test]
    fn test_totals_aggregate() {
        let decisions_a = vec![Decision::delete(tag("v1", "sha256:a"), Reason::AgedOut)];
        let decisions_b = vec![Decision::delete(tag("v1", "sha256:b"), Reason::Error)];
        let report = RunReport::new(
            false,
            vec![
                RepoReport::from_decisions("a", &decisions_a, Vec::new(), 1),
                RepoReport::from_decisions("b", &decisions_b, Vec::new(), 0),
            ],
        );

        let totals = report.totals();
        assert_eq!(totals.aged_out, 1);
        assert_eq!(totals.errors, 1);
        assert_eq!(report.deleted_digests(), 1);
        assert!(report.has_errors());
    }
}
