use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, notify, prepare, refs, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipnote")]
#[command(version = VERSION)]
#[command(about = "Pick the branch or tag to deploy and tell Slack about it")]
struct Cli {
    /// Config directory (defaults to $SHIPNOTE_CONFIG_DIR or ~/.config/shipnote)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Git checkout to read refs and identity from (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recent branches or tags from the local repository
    Refs(refs::RefsArgs),
    /// Resolve the ref, environment and operator for a deploy
    Prepare(prepare::PrepareArgs),
    /// Send a start or success notification for a prepared deploy
    Notify(notify::NotifyArgs),
    /// Prepare, notify, run the external deploy command, notify again
    Run(run::RunArgs),
    /// Inspect configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config_dir: cli.config_dir,
        repo: cli.repo,
    };

    tty::status("shipnote is working...");

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
