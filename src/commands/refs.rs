use clap::{Args, ValueEnum};
use serde::Serialize;

use shipnote::git::Vcs;
use shipnote::{RefCandidate, RefKind};

use super::{CmdResult, GlobalArgs};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RefsKind {
    Branches,
    Tags,
}

impl From<RefsKind> for RefKind {
    fn from(kind: RefsKind) -> Self {
        match kind {
            RefsKind::Branches => RefKind::Branch,
            RefsKind::Tags => RefKind::Tag,
        }
    }
}

#[derive(Args)]
pub struct RefsArgs {
    /// Which refs to list
    #[arg(value_enum)]
    pub kind: RefsKind,

    /// Maximum number of refs (defaults to the configured ref_limits)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RefsOutput {
    pub command: String,
    pub kind: RefKind,
    pub refs: Vec<RefCandidate>,
}

pub fn run(args: RefsArgs, global: &GlobalArgs) -> CmdResult<RefsOutput> {
    let config = global.configuration()?;
    let kind = RefKind::from(args.kind);
    let limit = args.limit.filter(|l| *l > 0).unwrap_or(match kind {
        RefKind::Branch => config.ref_limits.branches,
        RefKind::Tag => config.ref_limits.tags,
    });

    let git = global.git(&config);
    let refs = git.list_refs(kind, limit)?;

    Ok((
        RefsOutput {
            command: "refs.list".to_string(),
            kind,
            refs,
        },
        0,
    ))
}
