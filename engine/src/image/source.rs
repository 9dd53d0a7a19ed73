//! The image acquisition boundary.
//!
//! An [`ImageSource`] can pull an image by reference and export its layered
//! filesystem as one flattened tar stream. The engine consumes this trait;
//! the bundled registry-backed implementation lives in
//! [`registry`](super::registry).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use certo_core::check::ImageMetadata;
use certo_core::error::Result;
use tokio::io::AsyncWrite;

/// A pulled image, ready for export.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    /// Canonical reference the image was resolved from
    pub reference: String,

    /// Manifest digest
    pub digest: String,

    /// Parsed image configuration
    pub metadata: ImageMetadata,

    /// Layer blobs on local storage, bottom to top
    pub layers: Vec<LayerBlob>,

    /// Keeps the pulled blob staging directory alive for the handle's
    /// lifetime. `None` for sources that do not stage blobs on disk.
    pub workdir: Option<Arc<tempfile::TempDir>>,
}

/// One staged layer blob.
#[derive(Debug, Clone)]
pub struct LayerBlob {
    /// Path to the blob on local storage
    pub path: PathBuf,

    /// Layer media type (decides gzip vs. plain tar decoding)
    pub media_type: String,
}

/// Pulls images and exports their flattened filesystem.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Pull the image behind `uri`, staging whatever the export needs.
    async fn pull(&self, uri: &str) -> Result<ImageHandle>;

    /// Write the image's flattened filesystem as a single tar stream.
    ///
    /// "Flattened" means later-layer overwrites and whiteouts are already
    /// applied. The sink is closed by the caller when this returns; the
    /// stream's end is the consumer's only end-of-input signal.
    async fn export(
        &self,
        handle: &ImageHandle,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()>;
}
