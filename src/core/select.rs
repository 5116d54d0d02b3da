//! Turning a ref listing plus a raw answer into the ref to deploy.

use crate::error::{Error, ErrorCode, Result};
use crate::git::{RefCandidate, RefKind, Vcs};
use crate::prompt::{Choice, Prompter};

/// Answers accepted before giving up on an interactive selection.
pub const MAX_ATTEMPTS: usize = 3;

/// Normalize an answer against the listing.
///
/// An exact name wins over an index, so a branch literally named "2" stays
/// selectable by name. Indexes are 1-based in display order.
pub fn select(candidates: &[RefCandidate], raw_answer: &str) -> Result<String> {
    select_kind(candidates, raw_answer, RefKind::Tag)
}

/// `select` with the ref kind used to word the error.
pub fn select_kind(candidates: &[RefCandidate], raw_answer: &str, kind: RefKind) -> Result<String> {
    let answer = raw_answer.trim();

    if let Some(candidate) = candidates.iter().find(|c| c.name == answer) {
        return Ok(candidate.name.clone());
    }

    if let Some(index) = parse_index(answer) {
        if let Some(candidate) = index.checked_sub(1).and_then(|i| candidates.get(i)) {
            return Ok(candidate.name.clone());
        }
    }

    Err(Error::selection_invalid(
        kind.as_str(),
        answer,
        candidates.iter().map(|c| c.name.clone()).collect(),
    ))
}

/// Plain decimal without sign or leading zeros; "+2" and "02" are not indexes.
fn parse_index(answer: &str) -> Option<usize> {
    let canonical = !answer.is_empty()
        && answer.bytes().all(|b| b.is_ascii_digit())
        && !answer.starts_with('0');
    if canonical {
        answer.parse().ok()
    } else {
        None
    }
}

/// Text shown next to a ref, which also becomes the release summary.
pub fn summary_for(candidate: &RefCandidate, kind: RefKind) -> String {
    match (kind, candidate.date.as_deref()) {
        (RefKind::Branch, Some(date)) => format!("{} - {}", candidate.subject, date),
        _ => candidate.subject.clone(),
    }
}

pub fn choices(candidates: &[RefCandidate], kind: RefKind) -> Vec<Choice> {
    candidates
        .iter()
        .map(|c| Choice {
            key: c.name.clone(),
            label: summary_for(c, kind),
        })
        .collect()
}

pub fn question(kind: RefKind) -> String {
    format!("You must select a {} to deploy.", kind)
}

/// List refs, prompt, and re-prompt on unmatched answers.
///
/// The returned candidate always comes from the single listing made here.
pub fn choose(
    vcs: &dyn Vcs,
    prompter: &dyn Prompter,
    kind: RefKind,
    limit: usize,
) -> Result<RefCandidate> {
    let candidates = vcs.list_refs(kind, limit)?;
    if candidates.is_empty() {
        return Err(Error::selection_invalid(kind.as_str(), "", Vec::new())
            .with_hint(format!("No {} found in the local repository", kind)));
    }

    let question = question(kind);
    let choices = choices(&candidates, kind);

    let mut last_error = None;
    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.ask(&question, &choices)?;
        match select_kind(&candidates, &answer, kind) {
            Ok(name) => {
                let selected = candidates.iter().find(|c| c.name == name).cloned();
                return selected.ok_or_else(|| Error::internal_unexpected("selected ref vanished"));
            }
            Err(err) if err.code == ErrorCode::SelectionInvalid => {
                log_status!("select", "{}", err.message);
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_error.unwrap_or_else(|| Error::selection_invalid(kind.as_str(), "", Vec::new())))
}
