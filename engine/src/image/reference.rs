//! Image URI parsing.
//!
//! Splits references like `quay.io/example/operator:v1.2.0` into structured
//! components so the registry source and the report can use a canonical form.

use certo_core::error::{CertoError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when neither tag nor digest is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed image URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUri {
    /// Registry hostname (e.g., "quay.io", "docker.io")
    pub registry: String,
    /// Repository path (e.g., "example/operator")
    pub repository: String,
    /// Tag (e.g., "latest", "v1.2.0")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageUri {
    /// Parse an image URI string.
    ///
    /// Supports:
    /// - `example/operator` → docker.io/example/operator:latest
    /// - `quay.io/example/operator:v1` → quay.io/example/operator:v1
    /// - `quay.io/example/operator@sha256:...` → digest-pinned reference
    /// - `registry.local:5000/app:v1` → registry with port
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(CertoError::ImageError("empty image URI".to_string()));
        }

        // Split off digest first (@ separator)
        let (name_tag, digest) = match uri.rfind('@') {
            Some(at_pos) => {
                let digest_part = &uri[at_pos + 1..];
                if !digest_part.contains(':') {
                    return Err(CertoError::ImageError(format!(
                        "invalid digest in '{}': expected algorithm:hex",
                        uri
                    )));
                }
                (&uri[..at_pos], Some(digest_part.to_string()))
            }
            None => (uri, None),
        };

        // Split tag: the last colon after the last slash
        let (name, tag) = if let Some(slash_pos) = name_tag.rfind('/') {
            let after_slash = &name_tag[slash_pos + 1..];
            match after_slash.rfind(':') {
                Some(colon_pos) => {
                    let tag = &after_slash[colon_pos + 1..];
                    let name = &name_tag[..slash_pos + 1 + colon_pos];
                    (name.to_string(), Some(tag.to_string()))
                }
                None => (name_tag.to_string(), None),
            }
        } else if let Some(colon_pos) = name_tag.rfind(':') {
            // Could be registry:port or name:tag; a purely numeric suffix is a port
            let after_colon = &name_tag[colon_pos + 1..];
            if after_colon.chars().all(|c| c.is_ascii_digit()) {
                (name_tag.to_string(), None)
            } else {
                (
                    name_tag[..colon_pos].to_string(),
                    Some(after_colon.to_string()),
                )
            }
        } else {
            (name_tag.to_string(), None)
        };

        let (registry, repository) = Self::split_registry_repository(&name)?;

        // Apply default tag only when the reference is not digest-pinned
        let tag = match (&tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            _ => tag,
        };

        Ok(ImageUri {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Split a name into registry and repository components.
    fn split_registry_repository(name: &str) -> Result<(String, String)> {
        // The first path component is a registry hostname if it contains a
        // dot or colon, or is "localhost".
        if let Some(slash_pos) = name.find('/') {
            let first = &name[..slash_pos];
            if first.contains('.') || first.contains(':') || first == "localhost" {
                let repo = &name[slash_pos + 1..];
                if repo.is_empty() {
                    return Err(CertoError::ImageError(format!(
                        "empty repository in '{}'",
                        name
                    )));
                }
                return Ok((first.to_string(), repo.to_string()));
            }
        }

        if name.is_empty() {
            return Err(CertoError::ImageError("empty repository".to_string()));
        }

        Ok((DEFAULT_REGISTRY.to_string(), name.to_string()))
    }

    /// Get the full canonical reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}
