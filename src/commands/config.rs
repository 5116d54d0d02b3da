use clap::{Args, Subcommand};
use serde::Serialize;

use shipnote::config::Configuration;
use shipnote::{paths, server};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration (secrets masked)
    Show,
    /// Show where configuration is read from
    Path,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ConfigOutput {
    Show {
        command: String,
        config: Configuration,
        servers: Vec<String>,
    },
    Path {
        command: String,
        root: String,
        config_file: String,
        servers_dir: String,
    },
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let root = global.root()?;

    let output = match args.command {
        ConfigCommand::Show => ConfigOutput::Show {
            command: "config.show".to_string(),
            config: Configuration::load(&root)?.redacted(),
            servers: server::list_ids(&root)?,
        },
        ConfigCommand::Path => ConfigOutput::Path {
            command: "config.path".to_string(),
            root: root.display().to_string(),
            config_file: paths::shipnote_json(&root).display().to_string(),
            servers_dir: paths::servers(&root).display().to_string(),
        },
    };

    Ok((output, 0))
}
