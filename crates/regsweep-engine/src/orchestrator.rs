//! Deletion orchestration.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use regsweep_core::DeletionPlan;
use regsweep_registry::{RegistryClient, RetryPolicy};

/// Executes digest-level deletion plans against the registry.
///
/// Deletions within one repository are issued sequentially to avoid bursty
/// DELETE traffic; across repositories they proceed concurrently up to the
/// shared connection cap. A failing digest never aborts the run: its tags
/// are flipped to the error reason and the rest of the plan continues.
#[derive(Debug)]
pub struct Orchestrator {
    client: Arc<RegistryClient>,
    retry: RetryPolicy,
    connections: Arc<Semaphore>,
    dry_run: bool,
}

impl Orchestrator {
    /// Creates an orchestrator over the given client, retry schedule, and
    /// connection cap.
    #[must_use]
    pub fn new(
        client: Arc<RegistryClient>,
        retry: RetryPolicy,
        connections: Arc<Semaphore>,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            retry,
            connections,
            dry_run,
        }
    }

    /// Executes a plan for one repository, returning the number of digests
    /// actually deleted.
    ///
    /// In dry-run mode no DELETE calls are issued and the plan's decisions
    /// are left untouched, so the reported decision set is identical to a
    /// real run's given the same registry state.
    pub async fn execute(
        &self,
        repository: &str,
        plan: &mut DeletionPlan,
        cancel: &CancellationToken,
    ) -> usize {
        if self.dry_run {
            tracing::info!(
                repository,
                digests = plan.digests.len(),
                "dry run: no deletions issued"
            );
            return 0;
        }

        let digests = plan.digests.clone();
        let mut deleted = 0;

        for digest in &digests {
            // Never start a new deletion after cancellation; in-flight
            // deletions are idempotent and safe to re-issue next run.
            if cancel.is_cancelled() {
                tracing::info!(repository, "cancelled, stopping deletions");
                break;
            }

            let Ok(_permit) = self.connections.acquire().await else {
                break;
            };

            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = self
                    .retry
                    .run(|| self.client.delete_manifest(repository, digest)) => result,
            };

            match result {
                Ok(()) => {
                    deleted += 1;
                    tracing::info!(repository, digest = %digest, "deleted manifest");
                }
                Err(err) => {
                    tracing::warn!(
                        repository,
                        digest = %digest,
                        error = %err,
                        "deletion failed after retries"
                    );
                    plan.mark_digest_failed(digest);
                }
            }
        }

        deleted
    }
}
