//! Tag metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of manifest a tag points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// A single-image manifest (Docker schema 1/2 or OCI image manifest).
    Single,

    /// A multi-architecture manifest list or OCI image index.
    List,
}

/// A tag resolved against live registry state.
///
/// Many tags may point at the same digest (aliasing). Registry deletion
/// operates on digests, so aliases are reconciled by
/// [`DeletionPlan`](crate::DeletionPlan) before anything is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name (e.g., "v1.2.3").
    pub name: String,

    /// Content digest of the manifest the tag points at.
    pub digest: String,

    /// Kind of the tagged manifest.
    pub kind: ManifestKind,

    /// Creation timestamp, taken from the underlying image config.
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Creates a new resolved tag.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        digest: impl Into<String>,
        kind: ManifestKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
            kind,
            created_at,
        }
    }
}
