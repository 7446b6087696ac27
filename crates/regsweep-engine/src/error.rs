//! Error types for the run engine.

use thiserror::Error;

use regsweep_registry::RegistryError;

/// Fatal run failures. Everything else (a failing tag, digest, or
/// repository) is isolated and surfaced through the report instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The catalog could not be fetched, so no repositories were
    /// processed. The CLI maps this to exit code 2.
    #[error("failed to fetch registry catalog: {0}")]
    Catalog(#[source] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = EngineError::Catalog(RegistryError::Timeout {
            url: "https://example.com/v2/_catalog".to_string(),
        });
        assert!(err.to_string().starts_with("failed to fetch registry catalog"));
    }
}
