//! Image filesystem materialization.
//!
//! Drains an [`ImageSource`] export stream into a run-scoped scratch
//! directory. The export side and the tar-extraction side run as
//! independent tasks joined by an in-memory pipe, so the image filesystem
//! is never buffered whole; the producer closing its end of the pipe is
//! the extraction side's only end-of-input signal.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certo_core::error::{CertoError, Result};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio_util::io::SyncIoBridge;

use crate::image::source::{ImageHandle, ImageSource};

/// Capacity of the in-memory pipe between export and extraction.
const PIPE_CAPACITY: usize = 64 * 1024;

/// A materialized image filesystem.
///
/// Holds the scratch directory guard; dropping this value removes the
/// directory, on every exit path of the run.
#[derive(Debug)]
pub struct ExtractedFilesystem {
    scratch: TempDir,
}

impl ExtractedFilesystem {
    /// Root of the materialized filesystem tree.
    pub fn root(&self) -> &Path {
        self.scratch.path()
    }
}

/// Materialize the image's flattened filesystem into a fresh scratch
/// directory.
///
/// The scratch directory is created before any data flows; failing to
/// create it is fatal to the run. Export runs as its own task writing into
/// an in-memory pipe while a blocking task extracts from the other end.
/// Any error on either side aborts the whole operation; a producer error
/// takes precedence over the consumer's secondary end-of-stream error.
pub async fn materialize(
    source: Arc<dyn ImageSource>,
    handle: &ImageHandle,
    scratch_root: Option<&Path>,
) -> Result<ExtractedFilesystem> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("certo-");
    let scratch = match scratch_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(|e| CertoError::TempDirCreateFailed(e.to_string()))?;

    tracing::debug!(
        scratch = %scratch.path().display(),
        image = %handle.reference,
        "Materializing image filesystem"
    );

    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);

    let export_handle = handle.clone();
    let producer = tokio::spawn(async move {
        let mut writer = writer;
        let result = source.export(&export_handle, &mut writer).await;
        // Dropping the writer closes the pipe either way; an explicit
        // shutdown flushes buffered bytes first on the success path.
        let _ = writer.shutdown().await;
        result
    });

    let target = scratch.path().to_path_buf();
    let consumer =
        tokio::task::spawn_blocking(move || unpack_stream(SyncIoBridge::new(reader), &target));

    let produced = producer
        .await
        .map_err(|e| CertoError::ExtractionFailed(format!("export task panicked: {}", e)))?;
    let consumed = consumer
        .await
        .map_err(|e| CertoError::ExtractionFailed(format!("extraction task panicked: {}", e)))?;

    match (produced, consumed) {
        (Ok(()), Ok(())) => Ok(ExtractedFilesystem { scratch }),
        (Err(export_err), _) => Err(CertoError::ExtractionFailed(format!(
            "image export failed: {}",
            export_err
        ))),
        (Ok(()), Err(extract_err)) => Err(extract_err),
    }
}

/// Extract a tar stream into `target`.
///
/// Directory entries are skipped (parents are created implicitly); regular
/// files and symlinks are written preserving their sanitized relative path;
/// every other entry kind is ignored.
fn unpack_stream<R: Read>(reader: R, target: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| CertoError::ExtractionFailed(format!("malformed tar stream: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| CertoError::ExtractionFailed(format!("malformed tar entry: {}", e)))?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            continue;
        }

        let raw = entry
            .path()
            .map_err(|e| CertoError::ExtractionFailed(format!("invalid entry path: {}", e)))?
            .into_owned();
        let Some(rel) = normalize_path(&raw) else {
            tracing::warn!(path = %raw.display(), "Skipping unextractable tar entry path");
            continue;
        };

        let dest = target.join(&rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CertoError::ExtractionFailed(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        if entry_type.is_symlink() {
            write_symlink(&mut entry, &dest)?;
        } else if entry_type.is_file() {
            let mut out = std::fs::File::create(&dest).map_err(|e| {
                CertoError::ExtractionFailed(format!("failed to create {}: {}", dest.display(), e))
            })?;
            std::io::copy(&mut entry, &mut out).map_err(|e| {
                CertoError::ExtractionFailed(format!("failed to write {}: {}", dest.display(), e))
            })?;
        }
        // Devices, FIFOs, and hard links are not materialized.
    }

    Ok(())
}

#[cfg(unix)]
fn write_symlink<R: Read>(entry: &mut tar::Entry<'_, R>, dest: &Path) -> Result<()> {
    let link = entry
        .link_name()
        .map_err(|e| CertoError::ExtractionFailed(format!("invalid link entry: {}", e)))?
        .ok_or_else(|| {
            CertoError::ExtractionFailed(format!("symlink {} has no target", dest.display()))
        })?
        .into_owned();

    if dest.symlink_metadata().is_ok() {
        let _ = std::fs::remove_file(dest);
    }
    std::os::unix::fs::symlink(&link, dest).map_err(|e| {
        CertoError::ExtractionFailed(format!("failed to symlink {}: {}", dest.display(), e))
    })
}

#[cfg(not(unix))]
fn write_symlink<R: Read>(entry: &mut tar::Entry<'_, R>, dest: &Path) -> Result<()> {
    let _ = entry;
    tracing::warn!(path = %dest.display(), "Skipping symlink on non-unix platform");
    Ok(())
}

/// Strip leading `./` and `/` components; `None` for paths that normalize
/// to nothing or try to climb out of the tree.
pub(crate) fn normalize_path(path: &Path) -> Option<PathBuf> {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return None,
            Component::Normal(part) => normalized.push(part),
        }
    }

    if normalized.as_os_str().is_empty() {
        None
    } else {
        Some(normalized)
    }
}
