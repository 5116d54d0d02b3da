use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use shipnote::DeployContext;

use super::{build_context, CmdResult, DeployFlags, GlobalArgs};

#[derive(Args)]
pub struct PrepareArgs {
    /// Server ID (servers/<id>.json)
    pub server_id: String,

    #[command(flatten)]
    pub flags: DeployFlags,

    /// Write the resolved context to this file for a later `notify --context`
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct PrepareOutput {
    pub command: String,
    pub context: DeployContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

pub fn run(args: PrepareArgs, global: &GlobalArgs) -> CmdResult<PrepareOutput> {
    let config = global.configuration()?;
    let context = build_context(global, &config, &args.server_id, &args.flags)?;

    if let Some(path) = &args.save {
        context.save(path)?;
    }

    Ok((
        PrepareOutput {
            command: "deploy.prepare".to_string(),
            context,
            saved_to: args.save.map(|p| p.display().to_string()),
        },
        0,
    ))
}
