//! Operator data derivation from bundle annotation metadata.
//!
//! An operator bundle carries a `metadata/annotations.yaml` file naming its
//! package and channels. Combined with the externally supplied catalog
//! image, that is everything the deployment check needs.

use std::collections::HashMap;

use certo_core::check::ImageReference;
use certo_core::config::OlmSettings;
use certo_core::error::{CertoError, Result};
use serde::Deserialize;

/// Annotation naming the bundle's package.
pub const PACKAGE_ANNOTATION: &str = "operators.operatorframework.io.bundle.package.v1";

/// Annotation naming the bundle's default channel.
pub const DEFAULT_CHANNEL_ANNOTATION: &str =
    "operators.operatorframework.io.bundle.channel.default.v1";

/// Annotation listing all channels the bundle belongs to.
pub const CHANNELS_ANNOTATION: &str = "operators.operatorframework.io.bundle.channels.v1";

/// Relative path of the annotations file inside a materialized bundle.
const ANNOTATIONS_PATH: &str = "metadata/annotations.yaml";

/// Everything the deployment check needs to drive one bundle deployment.
///
/// Derived once per bundle; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorData {
    /// Catalog image serving the package
    pub catalog_image: String,

    /// Channel to subscribe to
    pub channel: String,

    /// Package name within the catalog
    pub package_name: String,

    /// Application name used to derive child resource names
    pub app: String,

    /// Namespace the operator is installed into
    pub install_namespace: String,
}

#[derive(Debug, Deserialize)]
struct AnnotationsFile {
    #[serde(default)]
    annotations: HashMap<String, String>,
}

/// Derive [`OperatorData`] from the materialized bundle plus settings.
///
/// A missing annotation key or missing catalog-image configuration is
/// terminal for the check and surfaces as an error, never as a failed
/// verdict.
pub fn derive_operator_data(
    image: &ImageReference,
    settings: &OlmSettings,
) -> Result<OperatorData> {
    let catalog_image = settings.catalog_image.clone().ok_or_else(|| {
        CertoError::ConfigError("catalog image not configured for operator deployment".to_string())
    })?;

    let path = image.image_fs_path.join(ANNOTATIONS_PATH);
    let raw = std::fs::read_to_string(&path).map_err(|e| {
        CertoError::AnnotationError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let file: AnnotationsFile = serde_yaml::from_str(&raw).map_err(|e| {
        CertoError::AnnotationError(format!("cannot parse {}: {}", path.display(), e))
    })?;

    let package_name = file
        .annotations
        .get(PACKAGE_ANNOTATION)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            CertoError::AnnotationError(format!("missing annotation {}", PACKAGE_ANNOTATION))
        })?
        .clone();

    let channel = resolve_channel(&file.annotations)?;

    let install_namespace = settings
        .install_namespace
        .clone()
        .unwrap_or_else(|| format!("{}-cert", package_name));

    Ok(OperatorData {
        catalog_image,
        channel,
        app: package_name.clone(),
        package_name,
        install_namespace,
    })
}

/// Pick the channel to subscribe to: the default channel annotation when
/// present, otherwise the first entry of the channel list.
fn resolve_channel(annotations: &HashMap<String, String>) -> Result<String> {
    if let Some(default_channel) = annotations
        .get(DEFAULT_CHANNEL_ANNOTATION)
        .filter(|v| !v.is_empty())
    {
        return Ok(default_channel.clone());
    }

    annotations
        .get(CHANNELS_ANNOTATION)
        .and_then(|list| list.split(',').map(str::trim).find(|c| !c.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| {
            CertoError::AnnotationError(format!(
                "missing annotation {} (and no {} fallback)",
                DEFAULT_CHANNEL_ANNOTATION, CHANNELS_ANNOTATION
            ))
        })
}
