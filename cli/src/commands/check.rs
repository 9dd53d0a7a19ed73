//! `certo check` command — run the certification engine against an image.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use certo_core::artifact::{ArtifactWriter, FilesystemArtifactWriter};
use certo_core::config::EngineConfig;
use certo_core::result::Results;
use certo_engine::{CertificationEngine, RegistryAuth, RegistrySource};

use crate::output::results_table;

#[derive(Args)]
pub struct CheckArgs {
    /// Image reference to certify
    pub image: String,

    /// Directory run artifacts (including results.json) are written to
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Parent directory for the run's scratch filesystem
    #[arg(long)]
    pub scratch_root: Option<PathBuf>,
}

pub async fn execute(args: CheckArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = EngineConfig {
        scratch_root: args.scratch_root,
        artifacts_dir: args.artifacts_dir.clone(),
        ..EngineConfig::default()
    };

    let source = Arc::new(RegistrySource::with_auth(RegistryAuth::from_env()));
    let engine = CertificationEngine::new(source, &args.image, config);

    // Acquisition failures propagate; the caller reports them and exits 2.
    let results = engine.run().await?;

    let writer = FilesystemArtifactWriter::new(&args.artifacts_dir)?;
    let report_path = writer.write(
        "results.json",
        &serde_json::to_vec_pretty(&results.report())?,
    )?;

    print_results(&results);
    println!("\nReport written to {}", report_path.display());

    Ok(if results.passed_overall { 0 } else { 1 })
}

fn print_results(results: &Results) {
    println!("Image: {}", results.tested_image);
    if results.check_count() == 0 {
        println!("No checks registered.");
    } else {
        println!("{}", results_table(results));
    }
    let verdict = if results.passed_overall {
        "PASSED"
    } else {
        "FAILED"
    };
    println!(
        "Verdict: {} ({} passed, {} failed, {} errored)",
        verdict,
        results.passed.len(),
        results.failed.len(),
        results.errored.len()
    );
}
