#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;
use shipnote::git::Vcs;
use shipnote::notify::transport::{HttpResponse, Transport, TransportError, TransportResult};
use shipnote::prompt::{Choice, Prompter};
use shipnote::{DeployContext, Error, RefCandidate, RefKind, Result};

pub fn candidate(name: &str, date: Option<&str>, subject: &str) -> RefCandidate {
    RefCandidate {
        name: name.to_string(),
        date: date.map(String::from),
        subject: subject.to_string(),
    }
}

pub fn context() -> DeployContext {
    DeployContext {
        selected_ref: "release-1.2".to_string(),
        ref_kind: RefKind::Tag,
        summary: "fix bug".to_string(),
        environment: "prod".to_string(),
        operator_name: "Ada Lovelace".to_string(),
        operator_email: "ada@example.com".to_string(),
        revision_hash: "9f8e7d6c".to_string(),
        server_id: "web".to_string(),
        host: "web1.example.com".to_string(),
        deploy_user: "deploy".to_string(),
    }
}

/// In-memory VCS that records which listings were requested.
#[derive(Default)]
pub struct FakeVcs {
    pub branches: Vec<RefCandidate>,
    pub tags: Vec<RefCandidate>,
    pub identity_fails: bool,
    pub listed: RefCell<Vec<(RefKind, usize)>>,
}

impl Vcs for FakeVcs {
    fn list_refs(&self, kind: RefKind, limit: usize) -> Result<Vec<RefCandidate>> {
        self.listed.borrow_mut().push((kind, limit));
        let refs = match kind {
            RefKind::Branch => &self.branches,
            RefKind::Tag => &self.tags,
        };
        Ok(refs.iter().take(limit).cloned().collect())
    }

    fn short_revision(&self) -> Result<String> {
        if self.identity_fails {
            return Err(Error::git_command_failed("git log failed"));
        }
        Ok("abc1234".to_string())
    }

    fn user_name(&self) -> Result<String> {
        if self.identity_fails {
            return Err(Error::git_command_failed("git config failed"));
        }
        Ok("Ada Lovelace".to_string())
    }

    fn user_email(&self) -> Result<String> {
        if self.identity_fails {
            return Err(Error::git_command_failed("git config failed"));
        }
        Ok("ada@example.com".to_string())
    }
}

/// Replays canned answers and records every question asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub answers: RefCell<VecDeque<String>>,
    pub asked: RefCell<Vec<(String, Vec<Choice>)>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.borrow().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str, choices: &[Choice]) -> Result<String> {
        self.asked
            .borrow_mut()
            .push((question.to_string(), choices.to_vec()));
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::internal_unexpected("prompter ran out of answers"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    Post {
        url: String,
        body: Value,
    },
}

/// Records requests and answers each with the next canned response.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: RefCell<Vec<Request>>,
    pub responses: RefCell<VecDeque<TransportResult>>,
}

impl RecordingTransport {
    pub fn replying(responses: Vec<TransportResult>) -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(responses.into_iter().collect()),
        }
    }

    pub fn ok(status: u16, body: &str) -> TransportResult {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    pub fn unreachable() -> TransportResult {
        Err(TransportError("connection refused".to_string()))
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn next(&self) -> TransportResult {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Self::ok(200, r#"{"ok":true}"#))
    }
}

impl Transport for RecordingTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> TransportResult {
        self.requests.borrow_mut().push(Request::Get {
            url: url.to_string(),
            query: query.to_vec(),
        });
        self.next()
    }

    fn post_json(&self, url: &str, body: &Value) -> TransportResult {
        self.requests.borrow_mut().push(Request::Post {
            url: url.to_string(),
            body: body.clone(),
        });
        self.next()
    }
}

pub fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
