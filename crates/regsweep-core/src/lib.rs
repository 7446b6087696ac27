//! # Regsweep Core
//!
//! Core data model and retention policy for the regsweep registry pruner.
//!
//! This crate provides the pure, I/O-free heart of the pruner:
//!
//! - [`Tag`] - A resolved tag: name, content digest, manifest kind, creation time
//! - [`Decision`] - Per-tag keep/delete verdict with its [`Reason`]
//! - [`RetentionPolicy`] - Pure evaluator mapping tags to decisions
//! - [`DeletionPlan`] - Digest-level plan that enforces the shared-digest
//!   safety invariant before any network call is made
//!
//! All entities are rebuilt from live registry state on each run; nothing
//! here is persisted between runs.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use regsweep_core::{DeletionPlan, ManifestKind, RetentionPolicy, Tag};
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
//! let tags = vec![
//!     Tag::new("v1", "sha256:aaa", ManifestKind::Single,
//!              Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
//!     Tag::new("v2", "sha256:bbb", ManifestKind::Single,
//!              Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 0).unwrap()),
//! ];
//!
//! let policy = RetentionPolicy::new(1, 30);
//! let plan = DeletionPlan::build(policy.evaluate(now, &tags));
//! assert_eq!(plan.digests, vec!["sha256:aaa".to_string()]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision;
pub mod plan;
pub mod policy;
pub mod tag;

#[cfg(test)]
mod proptest_tests;

pub use decision::{Action, Decision, Reason};
pub use plan::DeletionPlan;
pub use policy::RetentionPolicy;
pub use tag::{ManifestKind, Tag};
