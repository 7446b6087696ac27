//! Repository walk and run coordination.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

use regsweep_core::DeletionPlan;
use regsweep_registry::{RegistryClient, RetryPolicy};

use crate::error::EngineError;
use crate::options::PruneOptions;
use crate::orchestrator::Orchestrator;
use crate::report::{RepoReport, RunReport};
use crate::resolver::TagResolver;

/// Walks the registry catalog and prunes each selected repository.
///
/// Failures below the catalog fetch are isolated: a repository whose tag
/// list is unavailable, a tag that cannot be resolved, or a digest whose
/// deletion fails each degrade the report without stopping the run.
#[derive(Debug)]
pub struct Pruner {
    client: Arc<RegistryClient>,
    options: PruneOptions,
    retry: RetryPolicy,
}

impl Pruner {
    /// Creates a pruner with the default retry schedule.
    #[must_use]
    pub fn new(client: RegistryClient, options: PruneOptions) -> Self {
        Self {
            client: Arc::new(client),
            options,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry schedule.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs one prune pass over every selected repository.
    ///
    /// Cancellation stops the run at the next safe point: no new
    /// repository, resolution, or deletion is started once the token
    /// fires. Work already reported stays in the returned report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] when the repository catalog cannot
    /// be fetched, in which case nothing was processed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport, EngineError> {
        let repositories = self
            .retry
            .run(|| self.client.list_repositories())
            .await
            .map_err(EngineError::Catalog)?;

        let selected: Vec<String> = repositories
            .into_iter()
            .filter(|repo| self.options.selects(repo))
            .collect();
        tracing::info!(
            repositories = selected.len(),
            dry_run = self.options.dry_run,
            "starting prune run"
        );

        let connections = Arc::new(Semaphore::new(self.options.concurrency));
        let resolver = TagResolver::new(
            Arc::clone(&self.client),
            self.retry.clone(),
            Arc::clone(&connections),
            self.options.concurrency,
        );
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.client),
            self.retry.clone(),
            Arc::clone(&connections),
            self.options.dry_run,
        );

        let reports = Mutex::new(Vec::with_capacity(selected.len()));
        futures::stream::iter(selected)
            .for_each_concurrent(self.options.concurrency, |repository| {
                let resolver = &resolver;
                let orchestrator = &orchestrator;
                let reports = &reports;
                let cancel = &cancel;
                async move {
                    if cancel.is_cancelled() {
                        return;
                    }
                    if let Some(report) = self
                        .process_repository(&repository, resolver, orchestrator, cancel)
                        .await
                    {
                        reports.lock().await.push(report);
                    }
                }
            })
            .await;

        Ok(RunReport::new(
            self.options.dry_run,
            reports.into_inner(),
        ))
    }

    /// Prunes one repository: enumerate, resolve, evaluate, plan, delete.
    ///
    /// Returns `None` only for repositories that vanished mid-run; an
    /// untagged repository still appears in the report with zero counts.
    async fn process_repository(
        &self,
        repository: &str,
        resolver: &TagResolver,
        orchestrator: &Orchestrator,
        cancel: &CancellationToken,
    ) -> Option<RepoReport> {
        let tag_names = match self.retry.run(|| self.client.list_tags(repository)).await {
            Ok(names) => names,
            Err(err) if err.is_not_found() => {
                tracing::debug!(repository, "repository vanished mid-run, skipping");
                return None;
            }
            Err(err) => {
                tracing::warn!(repository, error = %err, "failed to list tags");
                return Some(RepoReport::failed(repository, err.to_string()));
            }
        };

        if tag_names.is_empty() {
            tracing::debug!(repository, "no tags to evaluate");
            return Some(RepoReport::empty(repository));
        }

        let resolved = resolver
            .resolve_repository(repository, &tag_names, cancel)
            .await;

        let policy = self.options.policy_for(repository);
        let decisions = policy.evaluate(Utc::now(), &resolved.tags);
        let mut plan = DeletionPlan::build(decisions);
        tracing::info!(
            repository,
            tags = resolved.tags.len(),
            skipped = resolved.skipped.len(),
            digests = plan.digests.len(),
            keep_count = policy.keep_count,
            max_age_days = policy.max_age_days,
            "evaluated retention policy"
        );

        let deleted = orchestrator.execute(repository, &mut plan, cancel).await;

        Some(RepoReport::from_decisions(
            repository,
            &plan.decisions,
            resolved.skipped,
            deleted,
        ))
    }
}
