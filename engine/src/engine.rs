//! The certification engine — acquisition, check execution, aggregation.

use std::sync::Arc;
use std::time::Instant;

use certo_core::check::{Check, ImageReference};
use certo_core::config::EngineConfig;
use certo_core::error::{CertoError, Result};
use certo_core::result::{CheckResult, Results};
use uuid::Uuid;

use crate::extract;
use crate::image::source::ImageSource;

/// Runs an ordered battery of checks against one image.
///
/// The engine pulls and materializes the image once, hands every check the
/// same read-only [`ImageReference`], and classifies each outcome. A check
/// that errors never prevents the remaining checks from running; only
/// acquisition failures abort the run.
pub struct CertificationEngine {
    source: Arc<dyn ImageSource>,
    image_uri: String,
    config: EngineConfig,
    checks: Vec<Box<dyn Check>>,
}

impl CertificationEngine {
    /// Create an engine for one image with an empty check battery.
    pub fn new(
        source: Arc<dyn ImageSource>,
        image_uri: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            image_uri: image_uri.into(),
            config,
            checks: Vec::new(),
        }
    }

    /// Append one check to the battery.
    pub fn with_check(mut self, check: Box<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    /// Append several checks, preserving order.
    pub fn with_checks(mut self, checks: Vec<Box<dyn Check>>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Execute the run: acquire the image, materialize its filesystem, run
    /// every check in order, and aggregate the outcomes.
    ///
    /// Always returns a [`Results`] value unless acquisition itself fails.
    pub async fn run(mut self) -> Result<Results> {
        let run_id = Uuid::new_v4();
        tracing::info!(
            run = %run_id,
            image = %self.image_uri,
            checks = self.checks.len(),
            "Starting certification run"
        );

        let handle = self
            .source
            .pull(&self.image_uri)
            .await
            .map_err(|e| CertoError::PullFailed {
                uri: self.image_uri.clone(),
                message: e.to_string(),
            })?;

        let fs = extract::materialize(
            Arc::clone(&self.source),
            &handle,
            self.config.scratch_root.as_deref(),
        )
        .await?;

        let image = ImageReference {
            image_uri: handle.reference.clone(),
            image_fs_path: fs.root().to_path_buf(),
            metadata: handle.metadata.clone(),
        };

        let mut results = Results::new(&image.image_uri);
        for check in self.checks.drain(..) {
            let name = check.name().to_string();
            let started = Instant::now();
            let verdict = check.validate(&image).await;
            let elapsed = started.elapsed();
            let elapsed_ms = elapsed.as_millis() as u64;

            match verdict {
                Ok(true) => {
                    tracing::info!(
                        run = %run_id,
                        check = %name,
                        elapsed_ms,
                        outcome = "passed",
                        "Check completed"
                    );
                    results.record_pass(CheckResult { check, elapsed });
                }
                Ok(false) => {
                    tracing::info!(
                        run = %run_id,
                        check = %name,
                        elapsed_ms,
                        outcome = "failed",
                        "Check completed"
                    );
                    results.record_fail(CheckResult { check, elapsed });
                }
                Err(e) => {
                    tracing::warn!(
                        run = %run_id,
                        check = %name,
                        elapsed_ms,
                        outcome = "errored",
                        error = %e,
                        "Check could not determine a verdict"
                    );
                    results.record_error(CheckResult { check, elapsed });
                }
            }
        }

        results.finalize();
        tracing::info!(
            run = %run_id,
            image = %results.tested_image,
            passed = results.passed.len(),
            failed = results.failed.len(),
            errored = results.errored.len(),
            passed_overall = results.passed_overall,
            "Certification run finished"
        );

        // `fs` drops here, removing the scratch directory.
        Ok(results)
    }
}
