//! Retention policy evaluation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, Reason};
use crate::tag::Tag;

/// Retention parameters for one repository.
///
/// Evaluation is pure and strictly per-repository: the current time is
/// injected, and tags from other repositories never interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Number of most recently created tags kept unconditionally,
    /// regardless of age. Zero disables the rank floor.
    pub keep_count: usize,

    /// Maximum tag age in days. Tags ranked beyond the keep-count floor
    /// are deleted once their age strictly exceeds this threshold.
    pub max_age_days: u32,
}

impl RetentionPolicy {
    /// Creates a new retention policy.
    #[must_use]
    pub const fn new(keep_count: usize, max_age_days: u32) -> Self {
        Self {
            keep_count,
            max_age_days,
        }
    }

    /// Evaluates the policy against one repository's resolved tags.
    ///
    /// Tags are ordered newest-first, ties broken by name ascending so the
    /// result is deterministic for equal timestamps. The first `keep_count`
    /// tags are kept regardless of age; each remaining tag is kept while
    /// `now - created_at <= max_age_days` and deleted once strictly older.
    ///
    /// The returned decisions partition the input exactly: one decision per
    /// tag, no tag twice.
    #[must_use]
    pub fn evaluate(&self, now: DateTime<Utc>, tags: &[Tag]) -> Vec<Decision> {
        let mut sorted: Vec<Tag> = tags.to_vec();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        let threshold = Duration::days(i64::from(self.max_age_days));

        sorted
            .into_iter()
            .enumerate()
            .map(|(rank, tag)| {
                if rank < self.keep_count {
                    Decision::keep(tag, Reason::WithinKeepCount)
                } else if now.signed_duration_since(tag.created_at) <= threshold {
                    Decision::keep(tag, Reason::WithinAge)
                } else {
                    Decision::delete(tag, Reason::AgedOut)
                }
            })
            .collect()
    }
}
