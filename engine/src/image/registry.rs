//! Registry-backed image source.
//!
//! Uses the `oci-distribution` crate to pull manifest, config, and layer
//! blobs from a container registry, and exports the layers as one flattened
//! tar stream with later-layer overwrites and whiteouts applied.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use certo_core::check::ImageMetadata;
use certo_core::error::{CertoError, Result};
use flate2::read::GzDecoder;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference};
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::reference::ImageUri;
use super::source::{ImageHandle, ImageSource, LayerBlob};
use crate::extract::normalize_path;

/// Authentication credentials for a container registry.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Create authentication from environment variables.
    ///
    /// Reads `REGISTRY_USERNAME` and `REGISTRY_PASSWORD`.
    /// Falls back to anonymous if not set.
    pub fn from_env() -> Self {
        let username = std::env::var("REGISTRY_USERNAME").ok();
        let password = std::env::var("REGISTRY_PASSWORD").ok();

        if username.is_some() && password.is_some() {
            Self { username, password }
        } else {
            Self::anonymous()
        }
    }

    /// Convert to oci-distribution auth type.
    fn to_oci_auth(&self) -> OciRegistryAuth {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => OciRegistryAuth::Basic(u.clone(), p.clone()),
            _ => OciRegistryAuth::Anonymous,
        }
    }
}

/// Image source backed by a container registry.
pub struct RegistrySource {
    client: Client,
    auth: RegistryAuth,
}

impl RegistrySource {
    /// Create a new registry source with anonymous authentication.
    pub fn new() -> Self {
        Self::with_auth(RegistryAuth::anonymous())
    }

    /// Create a new registry source with the given authentication.
    pub fn with_auth(auth: RegistryAuth) -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            ..Default::default()
        };
        let client = Client::new(config);

        Self { client, auth }
    }

    fn registry_error(registry: &str, message: impl std::fmt::Display) -> CertoError {
        CertoError::RegistryError {
            registry: registry.to_string(),
            message: message.to_string(),
        }
    }
}

impl Default for RegistrySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSource for RegistrySource {
    async fn pull(&self, uri: &str) -> Result<ImageHandle> {
        let parsed = ImageUri::parse(uri)?;
        let full_ref = parsed.full_reference();
        let oci_ref = full_ref
            .parse::<Reference>()
            .map_err(|e| CertoError::ImageError(format!("invalid reference '{}': {}", full_ref, e)))?;
        let auth = self.auth.to_oci_auth();

        tracing::info!(reference = %full_ref, "Pulling image from registry");

        let (manifest, digest) = self
            .client
            .pull_image_manifest(&oci_ref, &auth)
            .await
            .map_err(|e| {
                Self::registry_error(&parsed.registry, format!("failed to pull manifest: {}", e))
            })?;

        // Staging directory for pulled blobs; lives as long as the handle.
        let workdir = tempfile::Builder::new()
            .prefix("certo-blobs-")
            .tempdir()
            .map_err(|e| {
                Self::registry_error(&parsed.registry, format!("failed to stage blobs: {}", e))
            })?;

        let mut config_data: Vec<u8> = Vec::new();
        self.client
            .pull_blob(&oci_ref, &manifest.config, &mut config_data)
            .await
            .map_err(|e| {
                Self::registry_error(&parsed.registry, format!("failed to pull config blob: {}", e))
            })?;

        let mut metadata = parse_image_config(&config_data)?;
        metadata.layer_digests = manifest.layers.iter().map(|l| l.digest.clone()).collect();

        let mut layers = Vec::with_capacity(manifest.layers.len());
        for layer in &manifest.layers {
            tracing::debug!(digest = %layer.digest, size = layer.size, "Pulling layer");

            let mut layer_data: Vec<u8> = Vec::new();
            self.client
                .pull_blob(&oci_ref, layer, &mut layer_data)
                .await
                .map_err(|e| {
                    Self::registry_error(
                        &parsed.registry,
                        format!("failed to pull layer {}: {}", layer.digest, e),
                    )
                })?;

            let digest_hex = layer.digest.strip_prefix("sha256:").unwrap_or(&layer.digest);
            let path = workdir.path().join(digest_hex);
            std::fs::write(&path, &layer_data).map_err(|e| {
                Self::registry_error(
                    &parsed.registry,
                    format!("failed to write layer blob {}: {}", layer.digest, e),
                )
            })?;

            layers.push(LayerBlob {
                path,
                media_type: layer.media_type.clone(),
            });
        }

        tracing::info!(
            reference = %full_ref,
            digest = %digest,
            layers = layers.len(),
            "Image pulled"
        );

        Ok(ImageHandle {
            reference: full_ref,
            digest,
            metadata,
            layers,
            workdir: Some(Arc::new(workdir)),
        })
    }

    async fn export(
        &self,
        handle: &ImageHandle,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        // Flattening walks the staged layer blobs with blocking io; spool
        // the result to disk, then stream it into the async sink so the
        // image is never held in memory.
        let layers = handle.layers.clone();
        let spool = tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
            let mut spool = tempfile::NamedTempFile::new()?;
            flatten_layers(&layers, &mut spool)?;
            Ok(spool)
        })
        .await
        .map_err(|e| CertoError::ImageError(format!("export task failed: {}", e)))??;

        let mut file = tokio::fs::File::open(spool.path()).await?;
        tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(())
    }
}

/// Runtime config section of an OCI image configuration.
#[derive(Debug, Default, Deserialize)]
struct RuntimeConfig {
    #[serde(rename = "Entrypoint")]
    entrypoint: Option<Vec<String>>,
    #[serde(rename = "Cmd")]
    cmd: Option<Vec<String>>,
    #[serde(rename = "Env")]
    env: Option<Vec<String>>,
    #[serde(rename = "WorkingDir")]
    working_dir: Option<String>,
    #[serde(rename = "User")]
    user: Option<String>,
    #[serde(rename = "Labels")]
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: RuntimeConfig,
}

/// Parse an OCI image configuration blob into [`ImageMetadata`].
pub(crate) fn parse_image_config(data: &[u8]) -> Result<ImageMetadata> {
    let file: ConfigFile = serde_json::from_slice(data)
        .map_err(|e| CertoError::ImageError(format!("invalid image config: {}", e)))?;

    Ok(ImageMetadata {
        labels: file.config.labels.unwrap_or_default(),
        env: file.config.env.unwrap_or_default(),
        entrypoint: file.config.entrypoint.unwrap_or_default(),
        cmd: file.config.cmd.unwrap_or_default(),
        working_dir: file.config.working_dir,
        user: file.config.user,
        layer_digests: Vec::new(),
    })
}

/// Prefix marking an OCI whiteout entry.
const WHITEOUT_PREFIX: &str = ".wh.";

/// Name of an opaque-directory whiteout entry.
const OPAQUE_WHITEOUT: &str = ".wh..wh..opq";

/// Write the layers, bottom to top, as one flattened tar stream.
///
/// Two passes over the staged blobs: the first records, per path, which
/// layer entry wins (applying whiteouts against lower layers); the second
/// re-reads the layers and copies only the winning entries into the output.
/// Memory stays bounded by the path map, not the image size.
pub(crate) fn flatten_layers(layers: &[LayerBlob], out: &mut dyn Write) -> Result<()> {
    let mut winners: HashMap<PathBuf, (usize, usize)> = HashMap::new();

    for (layer_idx, layer) in layers.iter().enumerate() {
        let mut archive = open_layer(layer)?;
        let entries = archive
            .entries()
            .map_err(|e| flatten_error(&layer.path, e))?;

        for (entry_idx, entry) in entries.enumerate() {
            let entry = entry.map_err(|e| flatten_error(&layer.path, e))?;
            let raw = entry.path().map_err(|e| flatten_error(&layer.path, e))?;
            let Some(path) = normalize_path(&raw) else {
                continue;
            };

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            if name == OPAQUE_WHITEOUT {
                // Opaque whiteout: lower layers contribute nothing under
                // this entry's parent directory.
                let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
                winners.retain(|p, (l, _)| !(*l < layer_idx && p.starts_with(&parent)));
                continue;
            }
            if let Some(hidden) = name.strip_prefix(WHITEOUT_PREFIX) {
                let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
                let target = parent.join(hidden);
                winners.retain(|p, (l, _)| {
                    !(*l < layer_idx && (p == &target || p.starts_with(&target)))
                });
                continue;
            }

            if entry.header().entry_type().is_dir() {
                continue;
            }

            winners.insert(path, (layer_idx, entry_idx));
        }
    }

    let mut builder = tar::Builder::new(out);
    for (layer_idx, layer) in layers.iter().enumerate() {
        let mut archive = open_layer(layer)?;
        let entries = archive
            .entries()
            .map_err(|e| flatten_error(&layer.path, e))?;

        for (entry_idx, entry) in entries.enumerate() {
            let mut entry = entry.map_err(|e| flatten_error(&layer.path, e))?;
            let raw = entry.path().map_err(|e| flatten_error(&layer.path, e))?;
            let Some(path) = normalize_path(&raw) else {
                continue;
            };
            if winners.get(&path) != Some(&(layer_idx, entry_idx)) {
                continue;
            }

            let mut header = entry.header().clone();
            let entry_type = header.entry_type();
            if entry_type.is_symlink() || entry_type.is_hard_link() {
                let target = entry
                    .link_name()
                    .map_err(|e| flatten_error(&layer.path, e))?
                    .ok_or_else(|| {
                        CertoError::ImageError(format!(
                            "link entry {} has no target",
                            path.display()
                        ))
                    })?;
                builder
                    .append_link(&mut header, &path, &target)
                    .map_err(|e| flatten_error(&layer.path, e))?;
            } else {
                builder
                    .append_data(&mut header, &path, &mut entry)
                    .map_err(|e| flatten_error(&layer.path, e))?;
            }
        }
    }

    builder
        .finish()
        .map_err(|e| CertoError::ImageError(format!("failed to finish flattened tar: {}", e)))?;
    Ok(())
}

fn flatten_error(layer: &Path, err: impl std::fmt::Display) -> CertoError {
    CertoError::ImageError(format!("failed to flatten layer {}: {}", layer.display(), err))
}

/// Open a staged layer blob for reading, decoding gzip when the media type
/// calls for it.
fn open_layer(layer: &LayerBlob) -> Result<tar::Archive<Box<dyn Read>>> {
    let file = std::fs::File::open(&layer.path).map_err(|e| {
        CertoError::ImageError(format!(
            "failed to open layer blob {}: {}",
            layer.path.display(),
            e
        ))
    })?;

    let reader: Box<dyn Read> = if layer.media_type.contains("gzip") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(tar::Archive::new(reader))
}
