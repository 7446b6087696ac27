//! # Regsweep Registry
//!
//! Docker Registry HTTP API v2 client for the regsweep pruner.
//!
//! This crate provides the network-facing half of the pruner:
//!
//! - **Catalog & tag enumeration**: paginated `/v2/_catalog` and
//!   `/v2/<repo>/tags/list` walks that transparently follow `Link`
//!   continuation headers
//! - **Manifest retrieval**: `GET /v2/<repo>/manifests/<ref>` parsed into a
//!   tagged union over the Docker schema 1/2 and OCI manifest media types,
//!   plus the content digest from the `Docker-Content-Digest` header
//! - **Config blob retrieval**: image creation timestamps from
//!   `/v2/<repo>/blobs/<digest>`
//! - **Digest deletion**: idempotent `DELETE /v2/<repo>/manifests/<digest>`
//! - **Retry policy**: the explicit backoff schedule shared by metadata
//!   resolution and deletion
//!
//! ## Example
//!
//! ```rust,no_run
//! use regsweep_registry::{RegistryClient, RegistryConfig};
//!
//! # async fn example() -> Result<(), regsweep_registry::RegistryError> {
//! let config = RegistryConfig::new("https://registry.example.com");
//! let client = RegistryClient::new(config)?;
//!
//! let repositories = client.list_repositories().await?;
//! for repository in &repositories {
//!     let tags = client.list_tags(repository).await?;
//!     println!("{repository}: {} tags", tags.len());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
pub mod manifest;
mod retry;

pub use client::{ManifestRef, RegistryClient};
pub use config::{RegistryAuth, RegistryConfig};
pub use error::RegistryError;
pub use retry::RetryPolicy;
