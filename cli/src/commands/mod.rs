//! CLI command definitions and dispatch.

mod check;
mod inspect;

use clap::{Parser, Subcommand};

/// Certo — container image certification.
#[derive(Parser)]
#[command(name = "certo", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Pull an image, materialize its filesystem, and run the check battery
    Check(check::CheckArgs),
    /// Display image metadata as JSON without running checks
    Inspect(inspect::InspectArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
///
/// Returns the process exit code: 0 for an overall pass, 1 for an overall
/// fail; engine-level errors propagate and exit with 2.
pub async fn dispatch(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Check(args) => check::execute(args).await,
        Command::Inspect(args) => {
            inspect::execute(args).await?;
            Ok(0)
        }
    }
}
