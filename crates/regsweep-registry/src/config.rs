//! Configuration types for the registry client.

use std::time::Duration;

/// Configuration for the registry client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL (e.g., "<https://registry.example.com>"), without
    /// a trailing slash.
    pub url: String,

    /// Authentication configuration.
    pub auth: RegistryAuth,

    /// Request timeout applied to every registry call.
    pub timeout: Duration,

    /// Whether to skip TLS certificate verification (self-signed
    /// registries; NOT recommended outside lab setups).
    pub insecure: bool,

    /// Page size requested from paginated endpoints.
    pub page_size: usize,

    /// User agent string.
    pub user_agent: String,
}

impl RegistryConfig {
    /// Creates a new registry configuration with the given URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsweep_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("https://registry.example.com/");
    /// assert_eq!(config.url, "https://registry.example.com");
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            auth: RegistryAuth::None,
            timeout: Duration::from_secs(30),
            insecure: false,
            page_size: 100,
            user_agent: format!("regsweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the pagination page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enables insecure mode (skips certificate verification).
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }
}

/// Authentication methods for registry access.
#[derive(Debug, Clone)]
pub enum RegistryAuth {
    /// No authentication (open registries, local development).
    None,

    /// Basic authentication (username/password, e.g. htpasswd registries).
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },

    /// Bearer token authentication.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl RegistryAuth {
    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_defaults() {
        let config = RegistryConfig::new("https://example.com");
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 100);
        assert!(!config.insecure);
        assert!(matches!(config.auth, RegistryAuth::None));
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = RegistryConfig::new("https://example.com/");
        assert_eq!(config.url, "https://example.com");
    }

    #[test]
    fn test_config_builders() {
        let config = RegistryConfig::new("https://example.com")
            .with_auth(RegistryAuth::basic("user", "pass"))
            .with_timeout(Duration::from_secs(5))
            .with_page_size(10)
            .insecure();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 10);
        assert!(config.insecure);
        assert!(matches!(
            config.auth,
            RegistryAuth::Basic { username, password }
            if username == "user" && password == "pass"
        ));
    }
}
