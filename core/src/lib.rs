//! Certo core — shared certification types.
//!
//! This crate holds the vocabulary the engine and its callers share: the
//! [`Check`](check::Check) capability set, per-run [`Results`](result::Results),
//! the error taxonomy, run configuration, and the artifact sink.

pub mod artifact;
pub mod check;
pub mod config;
pub mod error;
pub mod result;

// Re-export common types
pub use artifact::{ArtifactWriter, FilesystemArtifactWriter};
pub use check::{Check, CheckHelp, CheckMetadata, ImageMetadata, ImageReference};
pub use config::{EngineConfig, OlmSettings};
pub use error::{CertoError, Result};
pub use result::{CheckResult, ReportEntry, Results, RunReport};

/// Certo core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
