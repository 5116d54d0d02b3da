//! Local git queries: recent refs, operator identity and the current revision.

use crate::error::{Error, Result};
use crate::utils::command;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Whether a deploy targets a branch or a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    /// Parse the short `--deploy-ask` value (`b` or `t`).
    pub fn from_ask_flag(value: &str) -> Option<Self> {
        match value.trim() {
            "b" => Some(RefKind::Branch),
            "t" => Some(RefKind::Tag),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        }
    }

    /// Ref namespace queried by `for-each-ref`.
    pub fn namespace(&self) -> &'static str {
        match self {
            RefKind::Branch => "refs/heads/",
            RefKind::Tag => "refs/tags/",
        }
    }

    /// Date field used for both sorting and display.
    fn date_field(&self) -> &'static str {
        match self {
            RefKind::Branch => "committerdate",
            RefKind::Tag => "creatordate",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One branch or tag offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefCandidate {
    pub name: String,
    /// Relative date as reported by the backend ("3 days ago").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub subject: String,
}

/// The version-control queries a deploy run needs.
pub trait Vcs {
    /// Most recent refs of a kind, newest first, at most `limit` entries.
    fn list_refs(&self, kind: RefKind, limit: usize) -> Result<Vec<RefCandidate>>;

    /// Short hash of the currently checked out commit.
    fn short_revision(&self) -> Result<String>;

    fn user_name(&self) -> Result<String>;

    fn user_email(&self) -> Result<String>;

    fn list_branches(&self, limit: usize) -> Result<Vec<RefCandidate>> {
        self.list_refs(RefKind::Branch, limit)
    }

    fn list_tags(&self, limit: usize) -> Result<Vec<RefCandidate>> {
        self.list_refs(RefKind::Tag, limit)
    }
}

/// `Vcs` backed by the local git executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    repo_dir: Option<PathBuf>,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            repo_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = Some(dir.into());
        self
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = command::capture(&self.program, args, self.repo_dir.as_deref())
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    Error::git_backend_unavailable(&self.program, e.to_string())
                }
                _ => Error::internal_io(e.to_string(), Some(format!("run {}", self.program))),
            })?;

        if !output.status.success() {
            return Err(Error::git_command_failed(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                command::error_text(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn config_value(&self, key: &str) -> Result<String> {
        Ok(self.git(&["config", "--get", key])?.trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Vcs for GitCli {
    fn list_refs(&self, kind: RefKind, limit: usize) -> Result<Vec<RefCandidate>> {
        let sort = format!("--sort=-{}", kind.date_field());
        let format = format!(
            "--format=%(refname)\t%({}:relative)\t%(subject)",
            kind.date_field()
        );
        let count = format!("--count={}", limit);

        let output = self.git(&["for-each-ref", kind.namespace(), &sort, &format, &count])?;
        Ok(parse_ref_listing(&output, kind))
    }

    fn short_revision(&self) -> Result<String> {
        Ok(self.git(&["log", "-n", "1", "--format=%h"])?.trim().to_string())
    }

    fn user_name(&self) -> Result<String> {
        self.config_value("user.name")
    }

    fn user_email(&self) -> Result<String> {
        self.config_value("user.email")
    }
}

/// Parse tab-separated `name\tdate\tsubject` records.
///
/// Blank records are skipped, namespace prefixes stripped, and names kept unique
/// (the first, most recent record wins). Missing trailing columns are tolerated.
pub fn parse_ref_listing(output: &str, kind: RefKind) -> Vec<RefCandidate> {
    let mut candidates: Vec<RefCandidate> = Vec::new();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut columns = line.splitn(3, '\t');
        let refname = columns.next().unwrap_or_default().trim();
        let name = refname
            .strip_prefix(kind.namespace())
            .unwrap_or(refname)
            .to_string();
        if name.is_empty() || candidates.iter().any(|c| c.name == name) {
            continue;
        }

        let date = columns
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        let subject = columns.next().unwrap_or_default().trim().to_string();

        candidates.push(RefCandidate {
            name,
            date,
            subject,
        });
    }

    candidates
}
