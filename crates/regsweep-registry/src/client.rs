//! Docker Registry HTTP API v2 client.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;

use crate::config::{RegistryAuth, RegistryConfig};
use crate::error::RegistryError;
use crate::manifest::{Catalog, ImageConfig, Manifest, TagList, ACCEPT_MANIFESTS};

/// A manifest response: the content digest the registry assigned, plus the
/// parsed body.
#[derive(Debug, Clone)]
pub struct ManifestRef {
    /// Digest from the `Docker-Content-Digest` header. Deletion operates
    /// on this value.
    pub digest: String,

    /// Parsed manifest.
    pub manifest: Manifest,
}

/// Client for the Docker Registry HTTP API v2.
///
/// The client is stateless: each call hits the live registry, and nothing
/// is cached between calls. It owns auth and TLS; retries are layered on
/// top by [`RetryPolicy`](crate::RetryPolicy).
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidUrl`] if the configured base URL
    /// does not parse, or an error if the HTTP client cannot be created.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        url::Url::parse(&config.url).map_err(|_| RegistryError::InvalidUrl {
            url: config.url.clone(),
        })?;
        let http = Self::build_http_client(&config)?;
        Ok(Self { config, http })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lists every repository in the catalog, transparently following
    /// `Link` continuation headers.
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog page cannot be fetched.
    pub async fn list_repositories(&self) -> Result<Vec<String>, RegistryError> {
        let mut url = format!(
            "{}/v2/_catalog?n={}",
            self.config.url, self.config.page_size
        );
        let mut repositories = Vec::new();

        loop {
            let response = self
                .http
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .map_err(|e| RegistryError::from_request(&url, e))?;

            let response = Self::check_status(response, &url, "_catalog").await?;
            let next = next_link(response.headers());

            let page: Catalog = response
                .json()
                .await
                .map_err(|e| RegistryError::from_request(&url, e))?;
            repositories.extend(page.repositories);

            match next {
                Some(link) => url = self.absolutize(&link),
                None => break,
            }
        }

        tracing::debug!(count = repositories.len(), "catalog enumerated");
        Ok(repositories)
    }

    /// Lists every tag of a repository, following pagination the same way.
    ///
    /// A repository whose tags were all deleted reports `tags: null`; that
    /// maps to an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the repository disappeared
    /// mid-run (callers skip it), or another error for a failed page.
    pub async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        let mut url = format!(
            "{}/v2/{repository}/tags/list?n={}",
            self.config.url, self.config.page_size
        );
        let mut tags = Vec::new();

        loop {
            let response = self
                .http
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .map_err(|e| RegistryError::from_request(&url, e))?;

            let response = Self::check_status(response, &url, repository).await?;
            let next = next_link(response.headers());

            let page: TagList = response
                .json()
                .await
                .map_err(|e| RegistryError::from_request(&url, e))?;
            tags.extend(page.tags.unwrap_or_default());

            match next {
                Some(link) => url = self.absolutize(&link),
                None => break,
            }
        }

        Ok(tags)
    }

    /// Fetches a manifest by tag or digest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnsupportedMediaType`] for media types the
    /// client does not understand, [`RegistryError::MissingDigestHeader`]
    /// if the registry omits `Docker-Content-Digest`, or a transport/status
    /// error.
    pub async fn manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<ManifestRef, RegistryError> {
        let url = format!("{}/v2/{repository}/manifests/{reference}", self.config.url);
        let resource = format!("{repository}:{reference}");

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .header(ACCEPT, ACCEPT_MANIFESTS)
            .send()
            .await
            .map_err(|e| RegistryError::from_request(&url, e))?;

        let response = Self::check_status(response, &url, &resource).await?;

        let digest = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
            .ok_or_else(|| RegistryError::MissingDigestHeader {
                resource: resource.clone(),
            })?;

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_owned())
            .unwrap_or_default();

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::from_request(&url, e))?;

        let manifest = Manifest::parse(&media_type, &body)?;
        Ok(ManifestRef { digest, manifest })
    }

    /// Fetches an image config blob and returns its creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingCreated`] if the config carries no
    /// `created` field, or [`RegistryError::InvalidTimestamp`] if it does
    /// not parse as RFC 3339.
    pub async fn config_created(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<DateTime<Utc>, RegistryError> {
        let url = format!("{}/v2/{repository}/blobs/{digest}", self.config.url);
        let resource = format!("{repository}@{digest}");

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| RegistryError::from_request(&url, e))?;

        let response = Self::check_status(response, &url, &resource).await?;
        let config: ImageConfig = response
            .json()
            .await
            .map_err(|e| RegistryError::from_request(&url, e))?;

        let created = config
            .created
            .ok_or(RegistryError::MissingCreated { resource })?;

        parse_created(&created)
    }

    /// Deletes a manifest by digest, removing every tag pointing at it.
    ///
    /// Deletion is idempotent: a 404 (digest already gone) counts as
    /// success, so re-running after a cancelled run is safe.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error for anything other than
    /// success/404.
    pub async fn delete_manifest(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<(), RegistryError> {
        let url = format!("{}/v2/{repository}/manifests/{digest}", self.config.url);
        let resource = format!("{repository}@{digest}");

        let response = self
            .http
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| RegistryError::from_request(&url, e))?;

        match Self::check_status(response, &url, &resource).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                tracing::debug!(repository, digest, "digest already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Maps a non-success response to the error taxonomy.
    async fn check_status(
        response: reqwest::Response,
        url: &str,
        resource: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::Unauthorized {
                resource: resource.to_string(),
            },
            StatusCode::NOT_FOUND => RegistryError::NotFound {
                resource: resource.to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => RegistryError::RateLimited {
                url: url.to_string(),
            },
            s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
                RegistryError::Server {
                    status: s.as_u16(),
                    resource: resource.to_string(),
                    message,
                }
            }
            s => RegistryError::Http {
                status: s.as_u16(),
                message,
            },
        })
    }

    /// Resolves a `Link` continuation target against the registry base.
    fn absolutize(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else if link.starts_with('/') {
            format!("{}{link}", self.config.url)
        } else {
            format!("{}/{link}", self.config.url)
        }
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|e| RegistryError::Http {
            status: 0,
            message: format!("failed to build HTTP client: {e}"),
        })
    }

    /// Creates authentication headers based on configuration.
    fn auth_headers(&self) -> Result<HeaderMap, RegistryError> {
        let mut headers = HeaderMap::new();

        match &self.config.auth {
            RegistryAuth::None => {}
            RegistryAuth::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|_| {
                        RegistryError::Unauthorized {
                            resource: "credentials".to_string(),
                        }
                    })?,
                );
            }
            RegistryAuth::Bearer { token } => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                        RegistryError::Unauthorized {
                            resource: "credentials".to_string(),
                        }
                    })?,
                );
            }
        }

        Ok(headers)
    }
}

/// Extracts the `rel="next"` target from a `Link` header, if present.
fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(reqwest::header::LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            Some(part[start..end].to_string())
        })
}

/// Parses an image-config creation timestamp.
fn parse_created(value: &str) -> Result<DateTime<Utc>, RegistryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RegistryError::InvalidTimestamp {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = RegistryConfig::new("https://registry.example.com");
        assert!(RegistryClient::new(config).is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let err = RegistryClient::new(RegistryConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl { .. }));
    }

    #[test]
    fn test_auth_headers_none() {
        let client = RegistryClient::new(RegistryConfig::new("https://example.com")).unwrap();
        assert!(client.auth_headers().unwrap().is_empty());
    }

    #[test]
    fn test_auth_headers_basic() {
        let config = RegistryConfig::new("https://example.com")
            .with_auth(RegistryAuth::basic("user", "pass"));
        let client = RegistryClient::new(config).unwrap();

        let headers = client.auth_headers().unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert_eq!(auth, "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_auth_headers_bearer() {
        let config =
            RegistryConfig::new("https://example.com").with_auth(RegistryAuth::bearer("my-token"));
        let client = RegistryClient::new(config).unwrap();

        let headers = client.auth_headers().unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert_eq!(auth, "Bearer my-token");
    }

    #[test]
    fn test_next_link_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            HeaderValue::from_static("</v2/_catalog?last=app&n=100>; rel=\"next\""),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("/v2/_catalog?last=app&n=100")
        );
    }

    #[test]
    fn test_next_link_absent() {
        assert!(next_link(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_absolutize_relative_link() {
        let client = RegistryClient::new(RegistryConfig::new("https://example.com")).unwrap();
        assert_eq!(
            client.absolutize("/v2/_catalog?last=app"),
            "https://example.com/v2/_catalog?last=app"
        );
        assert_eq!(
            client.absolutize("https://other.example.com/v2/_catalog"),
            "https://other.example.com/v2/_catalog"
        );
    }

    #[test]
    fn test_parse_created() {
        use chrono::TimeZone;

        let parsed = parse_created("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

        // Offset timestamps normalize to UTC.
        let parsed = parse_created("2024-03-01T13:00:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

        let err = parse_created("not-a-date").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTimestamp { .. }));
    }
}
