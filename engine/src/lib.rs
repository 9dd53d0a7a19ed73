//! Certo engine — image acquisition, check execution, and readiness
//! polling.
//!
//! The engine pulls an image through an [`ImageSource`](image::ImageSource),
//! materializes its flattened filesystem into a run-scoped scratch
//! directory, runs an ordered battery of checks against it, and aggregates
//! the outcomes. The operator deployment check in [`olm`] composes the
//! [`poll`] primitive with a sequence of cluster resource operations.

pub mod engine;
pub mod extract;
pub mod image;
pub mod olm;
pub mod poll;

// Re-export common types
pub use engine::CertificationEngine;
pub use extract::{materialize, ExtractedFilesystem};
pub use image::{ImageHandle, ImageSource, ImageUri, LayerBlob, RegistryAuth, RegistrySource};
pub use olm::{ClusterClient, OlmDeploymentCheck, OperatorData};
pub use poll::{wait_for, DEFAULT_POLL_INTERVAL};

/// Certo engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
