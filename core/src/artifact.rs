//! Artifact capture — the `write(filename, bytes)` capability used by the
//! deployment check and the CLI report writer.

use std::path::{Path, PathBuf};

use crate::error::{CertoError, Result};

/// Sink for run artifacts (serialized cluster objects, the final report).
///
/// Format and location policy belong to the implementation; callers only
/// hand over a filename and bytes.
pub trait ArtifactWriter: Send + Sync {
    /// Write one artifact, returning where it landed.
    fn write(&self, filename: &str, contents: &[u8]) -> Result<PathBuf>;
}

/// Artifact writer backed by a directory on the local filesystem.
pub struct FilesystemArtifactWriter {
    root: PathBuf,
}

impl FilesystemArtifactWriter {
    /// Create a writer rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            CertoError::ArtifactError(format!(
                "failed to create artifact directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Root directory artifacts are written under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn write(&self, filename: &str, contents: &[u8]) -> Result<PathBuf> {
        // Artifact names are plain filenames; anything path-like would
        // escape the artifact root.
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
            return Err(CertoError::ArtifactError(format!(
                "invalid artifact filename '{}'",
                filename
            )));
        }

        let path = self.root.join(filename);
        std::fs::write(&path, contents).map_err(|e| {
            CertoError::ArtifactError(format!("failed to write {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file_under_root() {
        let tmp = TempDir::new().unwrap();
        let writer = FilesystemArtifactWriter::new(tmp.path().join("artifacts")).unwrap();

        let path = writer.write("subscription.json", b"{}").unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert!(path.starts_with(writer.root()));
    }

    #[test]
    fn test_new_creates_missing_root() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");
        let writer = FilesystemArtifactWriter::new(&nested).unwrap();
        assert!(nested.is_dir());
        writer.write("x.json", b"1").unwrap();
    }

    #[test]
    fn test_write_rejects_path_like_filenames() {
        let tmp = TempDir::new().unwrap();
        let writer = FilesystemArtifactWriter::new(tmp.path()).unwrap();

        assert!(writer.write("../escape.json", b"x").is_err());
        assert!(writer.write("a/b.json", b"x").is_err());
        assert!(writer.write("", b"x").is_err());
    }

    #[test]
    fn test_write_overwrites_existing_artifact() {
        let tmp = TempDir::new().unwrap();
        let writer = FilesystemArtifactWriter::new(tmp.path()).unwrap();

        writer.write("r.json", b"first").unwrap();
        let path = writer.write("r.json", b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
