//! `certo inspect` command — display image metadata as JSON.

use clap::Args;

use certo_engine::{ImageSource, RegistryAuth, RegistrySource};

#[derive(Args)]
pub struct InspectArgs {
    /// Image reference to inspect
    pub image: String,
}

pub async fn execute(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = RegistrySource::with_auth(RegistryAuth::from_env());
    let handle = source.pull(&args.image).await?;

    let output = serde_json::json!({
        "Reference": handle.reference,
        "Digest": handle.digest,
        "LayerCount": handle.layers.len(),
        "Config": {
            "Entrypoint": handle.metadata.entrypoint,
            "Cmd": handle.metadata.cmd,
            "Env": handle.metadata.env,
            "WorkingDir": handle.metadata.working_dir,
            "User": handle.metadata.user,
            "Labels": handle.metadata.labels,
        },
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
