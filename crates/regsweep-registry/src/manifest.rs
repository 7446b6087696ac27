//! Registry wire types: manifests as a tagged union over the supported
//! media types, plus catalog and tag-list pages.

use regsweep_core::ManifestKind;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Docker image manifest, schema 1.
pub const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// Docker image manifest, schema 1, signed ("pretty JWS") variant.
pub const MANIFEST_V1_SIGNED: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws";

/// Docker image manifest, schema 2.
pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Docker manifest list (multi-arch index).
pub const MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// OCI image manifest.
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index.
pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// `Accept` header value offering every media type the client understands,
/// list types first so multi-arch tags come back as their index.
pub const ACCEPT_MANIFESTS: &str = "application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v1+prettyjws, \
     application/vnd.docker.distribution.manifest.v1+json";

/// Catalog page from `GET /v2/_catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Repository names in this page.
    pub repositories: Vec<String>,
}

/// Tag page from `GET /v2/<name>/tags/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagList {
    /// Repository name.
    pub name: String,

    /// Tags in this page; the registry returns `null` for repositories
    /// whose tags were all deleted.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Content descriptor referencing a manifest, config, or layer blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: String,

    /// Digest of the referenced content.
    pub digest: String,

    /// Size in bytes, when advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Target platform (present on index/list entries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Platform selector on an index entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// CPU architecture (e.g., "amd64").
    pub architecture: String,

    /// Operating system (e.g., "linux").
    pub os: String,
}

/// Docker schema 2 / OCI image manifest body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Descriptor of the image config blob, which carries the creation
    /// timestamp.
    pub config: Descriptor,

    /// Layer descriptors.
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// Docker manifest list / OCI image index body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestIndex {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Per-platform child manifest descriptors.
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

/// Legacy Docker schema 1 manifest body. The creation timestamp is buried
/// in the `v1Compatibility` JSON of the first history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV1 {
    /// Repository name.
    pub name: String,

    /// Tag the manifest was pushed under.
    pub tag: String,

    /// Layer history, newest first.
    #[serde(default)]
    pub history: Vec<V1History>,
}

/// One schema 1 history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V1History {
    /// Embedded v1 image JSON, as a string.
    #[serde(rename = "v1Compatibility")]
    pub v1_compatibility: String,
}

#[derive(Debug, Deserialize)]
struct V1Compatibility {
    created: Option<String>,
}

impl ManifestV1 {
    /// Extracts the raw creation timestamp from the newest history entry.
    #[must_use]
    pub fn created(&self) -> Option<String> {
        let entry = self.history.first()?;
        let compat: V1Compatibility = serde_json::from_str(&entry.v1_compatibility).ok()?;
        compat.created
    }
}

/// Image config blob (the `created` field is all the pruner needs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Creation timestamp, RFC 3339.
    #[serde(default)]
    pub created: Option<String>,
}

/// A manifest response, discriminated by the `Content-Type` the registry
/// returned. Exhaustive handling of this union replaces field-probing on
/// loosely typed JSON.
#[derive(Debug, Clone)]
pub enum Manifest {
    /// Docker image manifest schema 1 (legacy).
    Schema1(ManifestV1),

    /// Docker image manifest schema 2.
    Schema2(ImageManifest),

    /// OCI image manifest.
    Oci(ImageManifest),

    /// Docker manifest list or OCI image index.
    List(ManifestIndex),
}

impl Manifest {
    /// Parses a manifest body according to its media type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnsupportedMediaType`] for media types the
    /// client does not understand, or [`RegistryError::Json`] when the body
    /// does not match the advertised type.
    pub fn parse(media_type: &str, body: &[u8]) -> Result<Self, RegistryError> {
        match media_type {
            MANIFEST_V1 | MANIFEST_V1_SIGNED => Ok(Self::Schema1(serde_json::from_slice(body)?)),
            MANIFEST_V2 => Ok(Self::Schema2(serde_json::from_slice(body)?)),
            OCI_MANIFEST => Ok(Self::Oci(serde_json::from_slice(body)?)),
            MANIFEST_LIST | OCI_INDEX => Ok(Self::List(serde_json::from_slice(body)?)),
            other => Err(RegistryError::UnsupportedMediaType {
                media_type: other.to_string(),
            }),
        }
    }

    /// Returns the manifest kind a tag pointing at this manifest has.
    #[must_use]
    pub const fn kind(&self) -> ManifestKind {
        match self {
            Self::Schema1(_) | Self::Schema2(_) | Self::Oci(_) => ManifestKind::Single,
            Self::List(_) => ManifestKind::List,
        }
    }

    /// Descriptor of the image config blob, for single-image manifests
    /// that carry one.
    #[must_use]
    pub const fn config(&self) -> Option<&Descriptor> {
        match self {
            Self::Schema2(manifest) | Self::Oci(manifest) => Some(&manifest.config),
            Self::Schema1(_) | Self::List(_) => None,
        }
    }

    /// First child descriptor of a list/index, used as the representative
    /// image for timestamp resolution.
    #[must_use]
    pub fn first_child(&self) -> Option<&Descriptor> {
        match self {
            Self::List(index) => index.manifests.first(),
            Self::Schema1(_) | Self::Schema2(_) | Self::Oci(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA2_BODY: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "digest": "sha256:cfg",
            "size": 7023
        },
        "layers": [
            {
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "digest": "sha256:layer1",
                "size": 32654
            }
        ]
    }"#;

    const LIST_BODY: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.list.v2+json",
        "manifests": [
            {
                "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                "digest": "sha256:amd64",
                "size": 7143,
                "platform": { "architecture": "amd64", "os": "linux" }
            },
            {
                "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                "digest": "sha256:arm64",
                "size": 7143,
                "platform": { "architecture": "arm64", "os": "linux" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_schema2() {
        let manifest = Manifest::parse(MANIFEST_V2, SCHEMA2_BODY.as_bytes()).unwrap();
        assert_eq!(manifest.kind(), ManifestKind::Single);
        assert_eq!(manifest.config().unwrap().digest, "sha256:cfg");
        assert!(manifest.first_child().is_none());
    }

    #[test]
    fn test_parse_oci_manifest() {
        let manifest = Manifest::parse(OCI_MANIFEST, SCHEMA2_BODY.as_bytes()).unwrap();
        assert!(matches!(manifest, Manifest::Oci(_)));
        assert_eq!(manifest.kind(), ManifestKind::Single);
    }

    #[test]
    fn test_parse_manifest_list() {
        let manifest = Manifest::parse(MANIFEST_LIST, LIST_BODY.as_bytes()).unwrap();
        assert_eq!(manifest.kind(), ManifestKind::List);
        assert_eq!(manifest.first_child().unwrap().digest, "sha256:amd64");
        assert!(manifest.config().is_none());
    }

    #[test]
    fn test_parse_oci_index() {
        let manifest = Manifest::parse(OCI_INDEX, LIST_BODY.as_bytes()).unwrap();
        assert_eq!(manifest.kind(), ManifestKind::List);
    }

    #[test]
    fn test_parse_schema1_created() {
        let body = r#"{
            "schemaVersion": 1,
            "name": "app",
            "tag": "v1",
            "history": [
                { "v1Compatibility": "{\"created\":\"2024-03-01T12:00:00Z\"}" },
                { "v1Compatibility": "{\"created\":\"2024-02-01T12:00:00Z\"}" }
            ]
        }"#;

        let manifest = Manifest::parse(MANIFEST_V1, body.as_bytes()).unwrap();
        assert_eq!(manifest.kind(), ManifestKind::Single);

        let Manifest::Schema1(v1) = manifest else {
            panic!("expected schema 1 manifest");
        };
        assert_eq!(v1.created().as_deref(), Some("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn test_parse_unsupported_media_type() {
        let err = Manifest::parse("application/octet-stream", b"{}").unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn test_tag_list_null_tags() {
        let page: TagList = serde_json::from_str(r#"{"name":"app","tags":null}"#).unwrap();
        assert!(page.tags.is_none());
    }
}
