use clap::Args;
use std::path::PathBuf;

use shipnote::config::Configuration;
use shipnote::context::ContextBuilder;
use shipnote::git::GitCli;
use shipnote::prompt::TerminalPrompter;
use shipnote::server::{self, Server};
use shipnote::{paths, DeployContext, DeployOptions, RefKind};

pub type CmdResult<T> = shipnote::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config_dir: Option<PathBuf>,
    pub repo: Option<PathBuf>,
}

impl GlobalArgs {
    /// Config root: `--config-dir`, then `SHIPNOTE_CONFIG_DIR`, then the platform default.
    pub fn root(&self) -> shipnote::Result<PathBuf> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::shipnote(),
        }
    }

    pub fn configuration(&self) -> shipnote::Result<Configuration> {
        Configuration::load(&self.root()?)
    }

    pub fn git(&self, config: &Configuration) -> GitCli {
        let git = GitCli::new(config.git_binary());
        match &self.repo {
            Some(dir) => git.in_dir(dir.clone()),
            None => git,
        }
    }

    pub fn server(&self, id: &str) -> shipnote::Result<Server> {
        let root = self.root()?;
        server::load(&root, id).map_err(|e| {
            let known = server::list_ids(&root).unwrap_or_default();
            if known.is_empty() {
                e
            } else {
                e.with_hint(format!("Configured servers: {}", known.join(", ")))
            }
        })
    }
}

/// Ref and environment selection flags shared by `prepare` and `run`.
#[derive(Args, Debug, Default)]
pub struct DeployFlags {
    /// Branch to deploy (skips the prompt)
    #[arg(long)]
    pub branch: Option<String>,

    /// Tag to deploy (skips the prompt)
    #[arg(long)]
    pub tag: Option<String>,

    /// Ask which branch (b) or tag (t) to deploy
    #[arg(short = 'a', long = "deploy-ask", value_parser = ["b", "t"])]
    pub deploy_ask: Option<String>,

    /// Environment to deploy to (overrides the server config)
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
}

impl DeployFlags {
    pub fn to_options(&self) -> DeployOptions {
        DeployOptions {
            branch: self.branch.clone(),
            tag: self.tag.clone(),
            deploy_ask: self.deploy_ask.as_deref().and_then(RefKind::from_ask_flag),
            environment: self.environment.clone(),
        }
    }
}

/// Resolve a deploy context against the local git checkout and the terminal.
pub(crate) fn build_context(
    global: &GlobalArgs,
    config: &Configuration,
    server_id: &str,
    flags: &DeployFlags,
) -> shipnote::Result<DeployContext> {
    let server = global.server(server_id)?;
    let git = global.git(config);
    let prompter = TerminalPrompter::new();

    ContextBuilder::new(&git, &prompter)
        .with_limits(config.ref_limits)
        .build(&flags.to_options(), &server)
}

pub mod config;
pub mod notify;
pub mod prepare;
pub mod refs;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (shipnote::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Refs(args) => dispatch!(args, global, refs),
        crate::Commands::Prepare(args) => dispatch!(args, global, prepare),
        crate::Commands::Notify(args) => dispatch!(args, global, notify),
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
