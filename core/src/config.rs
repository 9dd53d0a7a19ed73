use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Parent directory for run-scoped scratch directories.
    /// Uses the system temp directory when unset.
    pub scratch_root: Option<PathBuf>,

    /// Directory artifacts are written to
    pub artifacts_dir: PathBuf,

    /// Operator deployment settings
    #[serde(default)]
    pub olm: OlmSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scratch_root: None,
            artifacts_dir: PathBuf::from("artifacts"),
            olm: OlmSettings::default(),
        }
    }
}

/// Settings for the operator deployment check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlmSettings {
    /// Catalog image serving the operator package. Required before the
    /// deployment check can derive its operator data.
    pub catalog_image: Option<String>,

    /// Namespace to install into. Derived from the package name when unset.
    pub install_namespace: Option<String>,

    /// Budget for subscription resolution, seconds
    pub subscription_timeout_secs: u64,

    /// Budget for CSV convergence, seconds
    pub csv_timeout_secs: u64,
}

impl Default for OlmSettings {
    fn default() -> Self {
        Self {
            catalog_image: None,
            install_namespace: None,
            subscription_timeout_secs: 180,
            csv_timeout_secs: 90,
        }
    }
}

impl OlmSettings {
    /// Subscription resolution budget as a duration.
    pub fn subscription_timeout(&self) -> Duration {
        Duration::from_secs(self.subscription_timeout_secs)
    }

    /// CSV convergence budget as a duration.
    pub fn csv_timeout(&self) -> Duration {
        Duration::from_secs(self.csv_timeout_secs)
    }
}
