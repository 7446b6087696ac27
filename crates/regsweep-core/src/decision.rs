//! Per-tag retention decisions.

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// What happens to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The tag survives this run.
    Keep,

    /// The tag's digest is requested for deletion.
    Delete,
}

/// Why a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Ranked within the `keep_count` most recently created tags.
    WithinKeepCount,

    /// Ranked beyond the keep-count floor, but age within the threshold.
    WithinAge,

    /// Age strictly exceeds the threshold.
    AgedOut,

    /// Shares a digest with a kept tag; deleting the digest would delete
    /// that tag too, so the evaluator's delete verdict is overridden.
    DigestSharedWithKeptTag,

    /// Deletion was attempted and failed after exhausting retries.
    Error,
}

/// A per-tag verdict produced once per run.
///
/// Decisions are never persisted; they are recomputed from live registry
/// state on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The tag the decision applies to.
    pub tag: Tag,

    /// Keep or delete.
    pub action: Action,

    /// Why.
    pub reason: Reason,
}

impl Decision {
    /// Creates a keep decision.
    #[must_use]
    pub const fn keep(tag: Tag, reason: Reason) -> Self {
        Self {
            tag,
            action: Action::Keep,
            reason,
        }
    }

    /// Creates a delete decision.
    #[must_use]
    pub const fn delete(tag: Tag, reason: Reason) -> Self {
        Self {
            tag,
            action: Action::Delete,
            reason,
        }
    }

    /// Returns true if the tag survives.
    #[must_use]
    pub fn is_keep(&self) -> bool {
        self.action == Action::Keep
    }
}
