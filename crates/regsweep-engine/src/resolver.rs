//! Manifest metadata resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use regsweep_core::Tag;
use regsweep_registry::manifest::Manifest;
use regsweep_registry::{RegistryClient, RegistryError, RetryPolicy};

/// A tag that could not be resolved and was left out of policy
/// evaluation. Surfaced in the report; never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTag {
    /// Tag name.
    pub name: String,

    /// Why resolution failed.
    pub error: String,
}

/// Result of resolving one repository's tags.
#[derive(Debug, Default)]
pub struct ResolvedTags {
    /// Tags with digest, kind, and creation timestamp.
    pub tags: Vec<Tag>,

    /// Tags that failed resolution.
    pub skipped: Vec<SkippedTag>,
}

enum Resolution {
    Resolved(Tag),
    /// Tag deleted between enumeration and resolution; dropped silently.
    Vanished,
    Skipped(SkippedTag),
    Cancelled,
}

/// Resolves tag names to [`Tag`] metadata, bounded by the shared
/// connection cap.
#[derive(Debug)]
pub struct TagResolver {
    client: Arc<RegistryClient>,
    retry: RetryPolicy,
    connections: Arc<Semaphore>,
    workers: usize,
}

impl TagResolver {
    /// Creates a resolver over the given client, retry schedule, and
    /// connection cap.
    #[must_use]
    pub fn new(
        client: Arc<RegistryClient>,
        retry: RetryPolicy,
        connections: Arc<Semaphore>,
        workers: usize,
    ) -> Self {
        Self {
            client,
            retry,
            connections,
            workers: workers.max(1),
        }
    }

    /// Resolves every tag of a repository against a fixed-size worker
    /// pool. Resolution failures are collected per tag; they never abort
    /// the repository.
    pub async fn resolve_repository(
        &self,
        repository: &str,
        tag_names: &[String],
        cancel: &CancellationToken,
    ) -> ResolvedTags {
        let outcomes: Vec<Resolution> = futures::stream::iter(tag_names.iter().cloned())
            .map(|name| async move { self.resolve_one(repository, name, cancel).await })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut resolved = ResolvedTags::default();
        for outcome in outcomes {
            match outcome {
                Resolution::Resolved(tag) => resolved.tags.push(tag),
                Resolution::Skipped(skip) => resolved.skipped.push(skip),
                Resolution::Vanished | Resolution::Cancelled => {}
            }
        }
        resolved
    }

    async fn resolve_one(
        &self,
        repository: &str,
        name: String,
        cancel: &CancellationToken,
    ) -> Resolution {
        if cancel.is_cancelled() {
            return Resolution::Cancelled;
        }

        let Ok(_permit) = self.connections.acquire().await else {
            return Resolution::Cancelled;
        };

        let result = tokio::select! {
            () = cancel.cancelled() => return Resolution::Cancelled,
            result = self.resolve_tag(repository, &name) => result,
        };

        match result {
            Ok(tag) => Resolution::Resolved(tag),
            Err(err) if err.is_not_found() => {
                tracing::debug!(repository, tag = %name, "tag vanished mid-run, skipping");
                Resolution::Vanished
            }
            Err(err) => {
                tracing::warn!(repository, tag = %name, error = %err, "failed to resolve tag");
                Resolution::Skipped(SkippedTag {
                    name,
                    error: err.to_string(),
                })
            }
        }
    }

    /// Resolves one tag: manifest, digest, kind, creation timestamp.
    async fn resolve_tag(&self, repository: &str, name: &str) -> Result<Tag, RegistryError> {
        let manifest_ref = self
            .retry
            .run(|| self.client.manifest(repository, name))
            .await?;

        let kind = manifest_ref.manifest.kind();
        let created_at = self
            .created_for(repository, name, &manifest_ref.manifest)
            .await?;

        Ok(Tag::new(name, manifest_ref.digest, kind, created_at))
    }

    /// Derives the creation timestamp for a manifest. A manifest list
    /// carries no build date itself, so one representative child (the
    /// first descriptor) is resolved instead.
    async fn created_for(
        &self,
        repository: &str,
        reference: &str,
        manifest: &Manifest,
    ) -> Result<DateTime<Utc>, RegistryError> {
        let resource = || format!("{repository}:{reference}");

        match manifest {
            Manifest::Schema2(image) | Manifest::Oci(image) => {
                self.retry
                    .run(|| self.client.config_created(repository, &image.config.digest))
                    .await
            }
            Manifest::Schema1(v1) => schema1_created(v1, &resource()),
            Manifest::List(index) => {
                let child = index
                    .manifests
                    .first()
                    .ok_or_else(|| RegistryError::MissingCreated {
                        resource: resource(),
                    })?;

                let child_ref = self
                    .retry
                    .run(|| self.client.manifest(repository, &child.digest))
                    .await?;

                match &child_ref.manifest {
                    Manifest::Schema2(image) | Manifest::Oci(image) => {
                        self.retry
                            .run(|| self.client.config_created(repository, &image.config.digest))
                            .await
                    }
                    Manifest::Schema1(v1) => schema1_created(v1, &resource()),
                    // A nested index never carries a build date.
                    Manifest::List(_) => Err(RegistryError::MissingCreated {
                        resource: resource(),
                    }),
                }
            }
        }
    }
}

/// Pulls the creation timestamp out of a schema 1 manifest's history.
fn schema1_created(
    v1: &regsweep_registry::manifest::ManifestV1,
    resource: &str,
) -> Result<DateTime<Utc>, RegistryError> {
    let created = v1.created().ok_or_else(|| RegistryError::MissingCreated {
        resource: resource.to_string(),
    })?;
    DateTime::parse_from_rfc3339(&created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RegistryError::InvalidTimestamp { value: created })
}
