//! Per-check outcomes and the aggregated run report.

use std::time::Duration;

use serde::Serialize;

use crate::check::Check;

/// Outcome record for one executed check.
///
/// Owns the check so the report can still reach its metadata and help text
/// after the run. Immutable once appended to a [`Results`] list.
pub struct CheckResult {
    /// The executed check
    pub check: Box<dyn Check>,

    /// Wall-clock time spent in `validate`
    pub elapsed: Duration,
}

impl CheckResult {
    /// Name of the underlying check.
    pub fn name(&self) -> &str {
        self.check.name()
    }
}

impl std::fmt::Debug for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckResult")
            .field("check", &self.check.name())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// Aggregated outcomes of a single engine run.
///
/// The three outcome lists are disjoint and together contain exactly one
/// entry per invoked check. Mutated only by the engine, in check order;
/// `passed_overall` is computed once by [`Results::finalize`] after all
/// checks finish.
#[derive(Debug)]
pub struct Results {
    /// Canonical reference of the tested image
    pub tested_image: String,

    /// Checks that returned a positive verdict
    pub passed: Vec<CheckResult>,

    /// Checks that returned a negative verdict
    pub failed: Vec<CheckResult>,

    /// Checks that could not determine a verdict
    pub errored: Vec<CheckResult>,

    /// Overall verdict: true iff `failed` and `errored` are both empty
    pub passed_overall: bool,
}

impl Results {
    /// Create an empty report for the given image.
    pub fn new(tested_image: impl Into<String>) -> Self {
        Self {
            tested_image: tested_image.into(),
            passed: Vec::new(),
            failed: Vec::new(),
            errored: Vec::new(),
            passed_overall: false,
        }
    }

    /// Record a passing check.
    pub fn record_pass(&mut self, result: CheckResult) {
        self.passed.push(result);
    }

    /// Record a failing check.
    pub fn record_fail(&mut self, result: CheckResult) {
        self.failed.push(result);
    }

    /// Record a check that errored out.
    pub fn record_error(&mut self, result: CheckResult) {
        self.errored.push(result);
    }

    /// Total number of checks recorded across all three lists.
    pub fn check_count(&self) -> usize {
        self.passed.len() + self.failed.len() + self.errored.len()
    }

    /// Compute the overall verdict. Call once, after the last check.
    pub fn finalize(&mut self) {
        self.passed_overall = self.failed.is_empty() && self.errored.is_empty();
    }

    /// Build the serializable report written to `results.json`.
    pub fn report(&self) -> RunReport {
        RunReport {
            image: self.tested_image.clone(),
            passed_overall: self.passed_overall,
            generated_at: chrono::Utc::now(),
            passed: self.passed.iter().map(ReportEntry::passing).collect(),
            failed: self.failed.iter().map(ReportEntry::failing).collect(),
            errored: self.errored.iter().map(ReportEntry::failing).collect(),
        }
    }
}

/// Serializable form of [`Results`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Canonical reference of the tested image
    pub image: String,

    /// Overall verdict
    pub passed_overall: bool,

    /// Report generation time
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// Passing checks
    pub passed: Vec<ReportEntry>,

    /// Failing checks, with remediation guidance
    pub failed: Vec<ReportEntry>,

    /// Errored checks, with remediation guidance
    pub errored: Vec<ReportEntry>,
}

/// One check entry within a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// Check name
    pub name: String,

    /// Time spent in `validate`, milliseconds
    pub elapsed_ms: u64,

    /// What the check verifies
    pub description: String,

    /// Remediation guidance; present for failed and errored checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ReportEntry {
    fn passing(result: &CheckResult) -> Self {
        Self {
            name: result.name().to_string(),
            elapsed_ms: result.elapsed.as_millis() as u64,
            description: result.check.metadata().description,
            suggestion: None,
        }
    }

    fn failing(result: &CheckResult) -> Self {
        Self {
            name: result.name().to_string(),
            elapsed_ms: result.elapsed.as_millis() as u64,
            description: result.check.metadata().description,
            suggestion: Some(result.check.help().suggestion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckHelp, CheckMetadata, ImageReference};
    use crate::error::Result as CertoResult;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Check for Named {
        async fn validate(&self, _image: &ImageReference) -> CertoResult<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            self.0
        }

        fn metadata(&self) -> CheckMetadata {
            CheckMetadata {
                description: format!("{} description", self.0),
                level: "required".to_string(),
                urls: vec![],
            }
        }

        fn help(&self) -> CheckHelp {
            CheckHelp {
                message: "failed".to_string(),
                suggestion: format!("fix {}", self.0),
            }
        }
    }

    fn result_for(name: &'static str, millis: u64) -> CheckResult {
        CheckResult {
            check: Box::new(Named(name)),
            elapsed: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_empty_results_finalize_passes() {
        let mut results = Results::new("quay.io/example/app:v1");
        results.finalize();
        assert!(results.passed_overall);
        assert_eq!(results.check_count(), 0);
    }

    #[test]
    fn test_finalize_fails_with_failed_checks() {
        let mut results = Results::new("quay.io/example/app:v1");
        results.record_pass(result_for("a", 5));
        results.record_fail(result_for("b", 5));
        results.finalize();
        assert!(!results.passed_overall);
    }

    #[test]
    fn test_finalize_fails_with_errored_checks() {
        let mut results = Results::new("quay.io/example/app:v1");
        results.record_pass(result_for("a", 5));
        results.record_error(result_for("b", 5));
        results.finalize();
        assert!(!results.passed_overall);
    }

    #[test]
    fn test_overall_verdict_over_category_combinations() {
        // passed_overall iff failed and errored are both empty, for 0-5
        // checks in each category.
        for passed in 0..=5usize {
            for failed in 0..=5usize {
                for errored in 0..=5usize {
                    let mut results = Results::new("img");
                    for _ in 0..passed {
                        results.record_pass(result_for("p", 1));
                    }
                    for _ in 0..failed {
                        results.record_fail(result_for("f", 1));
                    }
                    for _ in 0..errored {
                        results.record_error(result_for("e", 1));
                    }
                    results.finalize();
                    assert_eq!(results.passed_overall, failed == 0 && errored == 0);
                    assert_eq!(results.check_count(), passed + failed + errored);
                }
            }
        }
    }

    #[test]
    fn test_report_carries_suggestions_for_failures_only() {
        let mut results = Results::new("quay.io/example/app:v1");
        results.record_pass(result_for("good", 10));
        results.record_fail(result_for("bad", 20));
        results.finalize();

        let report = results.report();
        assert_eq!(report.image, "quay.io/example/app:v1");
        assert!(!report.passed_overall);
        assert_eq!(report.passed[0].suggestion, None);
        assert_eq!(report.failed[0].suggestion, Some("fix bad".to_string()));
        assert_eq!(report.failed[0].elapsed_ms, 20);
    }

    #[test]
    fn test_report_serializes() {
        let mut results = Results::new("img");
        results.record_pass(result_for("a", 1));
        results.finalize();
        let json = serde_json::to_string_pretty(&results.report()).unwrap();
        assert!(json.contains("\"passed_overall\": true"));
        assert!(json.contains("\"a\""));
    }
}
