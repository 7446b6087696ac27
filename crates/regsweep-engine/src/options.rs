//! Run configuration threaded through the engine.

use std::collections::HashMap;

use regsweep_core::RetentionPolicy;

/// The immutable configuration value for one run.
///
/// Every component receives its parameters from here; there is no
/// process-wide mutable state.
#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Default number of most recent tags kept per repository.
    pub keep_count: usize,

    /// Default maximum tag age in days per repository.
    pub max_age_days: u32,

    /// Compute and report decisions without issuing deletions.
    pub dry_run: bool,

    /// Bound on concurrent registry connections; also sizes the
    /// repository worker pool.
    pub concurrency: usize,

    /// When non-empty, restrict the run to these repositories.
    pub only: Vec<String>,

    /// Repositories excluded from the run.
    pub excludes: Vec<String>,

    /// Per-repository keep-count overrides.
    pub keep_overrides: HashMap<String, usize>,

    /// Per-repository age overrides, in days.
    pub age_overrides: HashMap<String, u32>,
}

impl PruneOptions {
    /// Creates options with the given global keep-count and age.
    #[must_use]
    pub fn new(keep_count: usize, max_age_days: u32) -> Self {
        Self {
            keep_count,
            max_age_days,
            dry_run: false,
            concurrency: 4,
            only: Vec::new(),
            excludes: Vec::new(),
            keep_overrides: HashMap::new(),
            age_overrides: HashMap::new(),
        }
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the connection/worker bound (clamped to at least 1).
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Restricts the run to the given repositories.
    #[must_use]
    pub fn only(mut self, repositories: Vec<String>) -> Self {
        self.only = repositories;
        self
    }

    /// Excludes the given repositories from the run.
    #[must_use]
    pub fn excludes(mut self, repositories: Vec<String>) -> Self {
        self.excludes = repositories;
        self
    }

    /// Sets per-repository keep-count overrides.
    #[must_use]
    pub fn keep_overrides(mut self, overrides: HashMap<String, usize>) -> Self {
        self.keep_overrides = overrides;
        self
    }

    /// Sets per-repository age overrides.
    #[must_use]
    pub fn age_overrides(mut self, overrides: HashMap<String, u32>) -> Self {
        self.age_overrides = overrides;
        self
    }

    /// Returns the retention policy for a repository, applying any
    /// per-repository overrides.
    #[must_use]
    pub fn policy_for(&self, repository: &str) -> RetentionPolicy {
        RetentionPolicy::new(
            self.keep_overrides
                .get(repository)
                .copied()
                .unwrap_or(self.keep_count),
            self.age_overrides
                .get(repository)
                .copied()
                .unwrap_or(self.max_age_days),
        )
    }

    /// Returns true if the repository is part of this run.
    #[must_use]
    pub fn selects(&self, repository: &str) -> bool {
        let included =
            self.only.is_empty() || self.only.iter().any(|candidate| candidate == repository);
        included && !self.excludes.iter().any(|candidate| candidate == repository)
    }
}
