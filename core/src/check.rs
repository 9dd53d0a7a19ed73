//! The check capability set and the image handle every check inspects.
//!
//! A check is an independent, stateless compliance rule. The engine only
//! depends on this trait; concrete rules live outside the engine and are
//! registered at construction time.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parsed image configuration carried alongside the materialized filesystem.
///
/// Opaque to the engine itself; checks interpret whichever fields their rule
/// needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image labels
    pub labels: HashMap<String, String>,

    /// Environment variables as `KEY=value` entries
    pub env: Vec<String>,

    /// Entrypoint command
    pub entrypoint: Vec<String>,

    /// Default command arguments
    pub cmd: Vec<String>,

    /// Working directory
    pub working_dir: Option<String>,

    /// User the image runs as
    pub user: Option<String>,

    /// Layer digests, bottom to top
    pub layer_digests: Vec<String>,
}

/// The resolved image a single engine run certifies.
///
/// Produced once by the acquisition pipeline, immutable afterwards, and
/// passed by shared reference to every check. The filesystem path points
/// into a run-scoped scratch directory that is removed when the run ends,
/// so checks must treat it as read-only.
#[derive(Debug, Clone)]
pub struct ImageReference {
    /// Canonical reference of the image under test
    pub image_uri: String,

    /// Root of the materialized (flattened) image filesystem
    pub image_fs_path: PathBuf,

    /// Parsed image configuration
    pub metadata: ImageMetadata,
}

/// Descriptive metadata for a check, surfaced in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckMetadata {
    /// What the check verifies
    pub description: String,

    /// Certification level (e.g., "required", "optional")
    pub level: String,

    /// Reference documentation
    pub urls: Vec<String>,
}

/// Remediation guidance shown when a check fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckHelp {
    /// What a failure of this check means
    pub message: String,

    /// How to fix it
    pub suggestion: String,
}

/// An independent compliance rule executed by the engine.
///
/// Implementations must be stateless across runs; per-instance configuration
/// (injected sub-clients, thresholds) is set at construction. `validate`
/// returns `Ok(true)` for a pass, `Ok(false)` for a policy violation, and
/// `Err` when the check could not determine a verdict at all.
#[async_trait]
pub trait Check: Send + Sync {
    /// Run the rule against the resolved image.
    async fn validate(&self, image: &ImageReference) -> Result<bool>;

    /// Stable name used in reports and logs.
    fn name(&self) -> &str;

    /// Descriptive metadata.
    fn metadata(&self) -> CheckMetadata;

    /// Remediation guidance.
    fn help(&self) -> CheckHelp;
}
