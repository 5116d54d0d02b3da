//! Resolve everything a deploy run needs to know before the deployment starts.
//!
//! Environment and ref are resolved from CLI options first, then from the server
//! config. Operator identity and the revision come from the local git checkout and
//! are best-effort: a failed lookup leaves the field empty.

use crate::defaults::RefLimits;
use crate::error::{Error, Result};
use crate::git::{RefKind, Vcs};
use crate::prompt::Prompter;
use crate::select;
use crate::server::Server;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// CLI options that influence context resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub branch: Option<String>,
    pub tag: Option<String>,
    /// Forced interactive selection (`--deploy-ask b|t`).
    pub deploy_ask: Option<RefKind>,
    pub environment: Option<String>,
}

/// How the ref to deploy will be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefRequest {
    Explicit { kind: RefKind, name: String },
    Ask(RefKind),
}

/// Immutable facts about one deploy run, shared by every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployContext {
    pub selected_ref: String,
    pub ref_kind: RefKind,
    pub summary: String,
    pub environment: String,
    pub operator_name: String,
    pub operator_email: String,
    pub revision_hash: String,
    pub server_id: String,
    pub host: String,
    /// Remote user on the target, shown as the "stage" in messages.
    pub deploy_user: String,
}

impl DeployContext {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize deploy context".to_string()))
        })?;
        fs::write(path, json).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Precedence: `--branch`, `--tag`, `--deploy-ask`, server `type`, then tag selection.
pub fn resolve_ref_request(options: &DeployOptions, server: &Server) -> RefRequest {
    if let Some(branch) = non_empty(&options.branch) {
        return RefRequest::Explicit {
            kind: RefKind::Branch,
            name: branch.to_string(),
        };
    }

    if let Some(tag) = non_empty(&options.tag) {
        return RefRequest::Explicit {
            kind: RefKind::Tag,
            name: tag.to_string(),
        };
    }

    RefRequest::Ask(options.deploy_ask.or(server.ref_type).unwrap_or(RefKind::Tag))
}

/// `--environment` overrides the server's configured environment.
pub fn resolve_environment(options: &DeployOptions, server: &Server) -> Result<String> {
    non_empty(&options.environment)
        .or_else(|| non_empty(&server.environment))
        .map(String::from)
        .ok_or_else(|| Error::environment_missing(&server.id))
}

pub struct ContextBuilder<'a> {
    vcs: &'a dyn Vcs,
    prompter: &'a dyn Prompter,
    limits: RefLimits,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(vcs: &'a dyn Vcs, prompter: &'a dyn Prompter) -> Self {
        Self {
            vcs,
            prompter,
            limits: RefLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RefLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(&self, options: &DeployOptions, server: &Server) -> Result<DeployContext> {
        // Checked before prompting so a misconfigured server fails fast.
        let environment = resolve_environment(options, server)?;

        let (ref_kind, selected_ref, summary) = match resolve_ref_request(options, server) {
            RefRequest::Explicit { kind, name } => {
                let summary = match kind {
                    RefKind::Branch => format!("Branch {}", name),
                    RefKind::Tag => format!("Tag {}", name),
                };
                (kind, name, summary)
            }
            RefRequest::Ask(kind) => {
                let limit = match kind {
                    RefKind::Branch => self.limits.branches,
                    RefKind::Tag => self.limits.tags,
                };
                let candidate = select::choose(self.vcs, self.prompter, kind, limit)?;
                let summary = select::summary_for(&candidate, kind);
                (kind, candidate.name, summary)
            }
        };

        log_status!("select", "Will deploy git {} {}", ref_kind, selected_ref);

        Ok(DeployContext {
            selected_ref,
            ref_kind,
            summary,
            environment,
            operator_name: best_effort("user.name", self.vcs.user_name()),
            operator_email: best_effort("user.email", self.vcs.user_email()),
            revision_hash: best_effort("revision", self.vcs.short_revision()),
            server_id: server.id.clone(),
            host: server.display_host().to_string(),
            deploy_user: server.stage().to_string(),
        })
    }
}

fn best_effort(field: &str, result: Result<String>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => {
            log_status!("context", "Could not resolve {}: {}", field, err.message);
            String::new()
        }
    }
}
