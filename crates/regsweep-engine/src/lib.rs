//! # Regsweep Engine
//!
//! The run engine for the regsweep pruner. It wires the pure retention
//! policy from `regsweep-core` to the registry client from
//! `regsweep-registry`:
//!
//! - [`TagResolver`] - resolves tag names to digest, manifest kind, and
//!   creation timestamp, bounded by a shared connection cap
//! - [`Orchestrator`] - executes digest-level deletion plans with retry,
//!   backoff, and dry-run support
//! - [`Pruner`] - walks repositories concurrently and produces a
//!   [`RunReport`]
//!
//! Per repository the sequence is strict: enumerate, resolve, evaluate,
//! plan, delete. No deletion ever runs against stale metadata. Across
//! repositories there is no ordering guarantee.
//!
//! ## Example
//!
//! ```rust,no_run
//! use regsweep_engine::{PruneOptions, Pruner};
//! use regsweep_registry::{RegistryClient, RegistryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new(RegistryConfig::new("https://registry.example.com"))?;
//! let options = PruneOptions::new(10, 30).dry_run(true);
//!
//! let report = Pruner::new(client, options)
//!     .run(CancellationToken::new())
//!     .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod options;
mod orchestrator;
mod pruner;
mod report;
mod resolver;

pub use error::EngineError;
pub use options::PruneOptions;
pub use orchestrator::Orchestrator;
pub use pruner::Pruner;
pub use report::{ReasonCounts, RepoReport, RunReport};
pub use resolver::{ResolvedTags, SkippedTag, TagResolver};
