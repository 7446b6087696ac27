//! Digest-level deletion planning.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::decision::{Action, Decision, Reason};

/// A safe digest-level deletion plan derived from per-tag decisions.
///
/// Registry deletion operates on digests: deleting a digest removes every
/// tag pointing at it. The per-tag output of the evaluator is therefore
/// advisory; this group-aware pass is authoritative. Any delete-decided tag
/// whose digest is also referenced by a kept tag is promoted to keep, and
/// one deletion is emitted per digest whose entire group is delete-decided.
///
/// Building a plan is pure, so a dry run derives exactly the same decision
/// set as a real run given identical registry state and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPlan {
    /// Final decisions after the shared-digest override. These partition
    /// the repository's tag set exactly.
    pub decisions: Vec<Decision>,

    /// Digests whose entire tag group is marked for deletion, each listed
    /// once, in the order its first member appears in `decisions`.
    pub digests: Vec<String>,
}

impl DeletionPlan {
    /// Builds a plan from the evaluator's per-tag decisions.
    #[must_use]
    pub fn build(decisions: Vec<Decision>) -> Self {
        let kept_digests: HashSet<String> = decisions
            .iter()
            .filter(|d| d.action == Action::Keep)
            .map(|d| d.tag.digest.clone())
            .collect();

        let decisions: Vec<Decision> = decisions
            .into_iter()
            .map(|decision| {
                if decision.action == Action::Delete && kept_digests.contains(&decision.tag.digest)
                {
                    Decision::keep(decision.tag, Reason::DigestSharedWithKeptTag)
                } else {
                    decision
                }
            })
            .collect();

        let mut seen = HashSet::new();
        let mut digests = Vec::new();
        for decision in &decisions {
            if decision.action == Action::Delete && seen.insert(decision.tag.digest.clone()) {
                digests.push(decision.tag.digest.clone());
            }
        }

        Self { decisions, digests }
    }

    /// Marks every delete-decided tag of a digest as errored, after its
    /// deletion exhausted all retries.
    pub fn mark_digest_failed(&mut self, digest: &str) {
        for decision in &mut self.decisions {
            if decision.tag.digest == digest && decision.action == Action::Delete {
                decision.reason = Reason::Error;
            }
        }
    }

    /// Returns true if nothing would be deleted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
