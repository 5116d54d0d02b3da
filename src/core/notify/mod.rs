//! Deployment notifications.
//!
//! `Dispatcher::notify` renders the message for an event from the `DeployContext`
//! and sends it to every configured Slack backend (token first, then webhook).
//! A backend failure is an error only when no backend delivered; otherwise it is
//! listed in `DeliveryResult::failures`. Callers treat errors as non-fatal.
//! Nothing is retried and nothing is deduplicated.

pub mod desktop;
pub mod slack;
pub mod transport;

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::Configuration;
use crate::context::DeployContext;
use crate::defaults::{self, SlackDefaults};
use crate::error::{Error, Result};
use crate::utils::{command, template};
use slack::SlackSettings;
use transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyEvent {
    Start,
    Success,
}

impl NotifyEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyEvent::Start => "start",
            NotifyEvent::Success => "success",
        }
    }
}

impl fmt::Display for NotifyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an attachment color comes from. Resolved before a payload is built.
#[derive(Clone)]
pub enum ColorSource {
    Literal(String),
    Computed(fn(&DeployContext) -> String),
}

impl ColorSource {
    pub fn resolve(&self, context: &DeployContext) -> String {
        match self {
            ColorSource::Literal(color) => color.clone(),
            ColorSource::Computed(compute) => compute(context),
        }
    }
}

impl fmt::Debug for ColorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSource::Literal(color) => f.debug_tuple("Literal").field(color).finish(),
            ColorSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Green for production, blue for everything else.
pub fn environment_color(context: &DeployContext) -> String {
    if context.environment == defaults::PROD_ENVIRONMENT {
        defaults::PROD_COLOR.to_string()
    } else {
        defaults::DEFAULT_COLOR.to_string()
    }
}

pub fn start_color(config: &Configuration) -> ColorSource {
    match config.slack_color.as_deref() {
        Some(color) if !color.trim().is_empty() => ColorSource::Literal(color.to_string()),
        _ => ColorSource::Computed(environment_color),
    }
}

/// Falls back to the start color when no success color is configured.
pub fn success_color(config: &Configuration) -> ColorSource {
    match config.slack_success_color.as_deref() {
        Some(color) if !color.trim().is_empty() => ColorSource::Literal(color.to_string()),
        _ => start_color(config),
    }
}

/// Every key `Placeholders::new` fills.
pub const PLACEHOLDER_KEYS: &[&str] = &[
    "host",
    "stage",
    "environment",
    "user",
    "branch",
    "target",
    "ref_kind",
    "summary",
    "release",
    "revision",
    "user.name",
    "user.email",
    "app_name",
    "server",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placeholders(BTreeMap<String, String>);

impl Placeholders {
    pub fn new(context: &DeployContext, os_user: &str, app_name: &str) -> Self {
        let values = [
            ("host", context.host.as_str()),
            ("stage", context.deploy_user.as_str()),
            ("environment", context.environment.as_str()),
            ("user", os_user),
            ("branch", context.selected_ref.as_str()),
            ("target", context.selected_ref.as_str()),
            ("ref_kind", context.ref_kind.as_str()),
            ("summary", context.summary.as_str()),
            ("release", context.summary.as_str()),
            ("revision", context.revision_hash.as_str()),
            ("user.name", context.operator_name.as_str()),
            ("user.email", context.operator_email.as_str()),
            ("app_name", app_name),
            ("server", context.server_id.as_str()),
        ];

        Self(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Substitute known keys; unknown `{{tokens}}` stay and are logged.
    pub fn render(&self, template_text: &str) -> String {
        let rendered = template::render_map(template_text, &self.0);
        let unresolved = template::unresolved(&rendered);
        if !unresolved.is_empty() {
            log_status!(
                "notify",
                "Unresolved placeholders left in message: {}",
                unresolved.join(", ")
            );
        }
        rendered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: &str) -> Self {
        Self {
            title: title.to_string(),
            value: value.to_string(),
            short: true,
        }
    }
}

/// One event's message for the token backend, built per send and then dropped.
///
/// `text` is final: the start text is rendered on construction and the success
/// text is assembled from context values, which are never re-templated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub channel: String,
    pub message_template: String,
    pub placeholders: Placeholders,
    pub title: String,
    pub fallback: String,
    pub text: String,
    pub fields: Vec<AttachmentField>,
    pub color: String,
}

impl NotificationPayload {
    pub fn for_event(
        event: NotifyEvent,
        context: &DeployContext,
        settings: &SlackSettings,
        placeholders: Placeholders,
        color: String,
    ) -> Self {
        match event {
            NotifyEvent::Start => Self {
                channel: settings.channel.clone(),
                message_template: settings.message.clone(),
                text: placeholders.render(defaults::START_TEXT),
                placeholders,
                title: defaults::START_TITLE.to_string(),
                fallback: defaults::START_TITLE.to_string(),
                fields: Vec::new(),
                color,
            },
            NotifyEvent::Success => {
                let revision: String = context.revision_hash.chars().take(6).collect();
                let text = format!(
                    "Revision {} deployed to {} by {}",
                    revision, context.deploy_user, context.operator_name
                );
                let fields = vec![
                    AttachmentField::short("User", &context.operator_name),
                    AttachmentField::short("Email", &context.operator_email),
                    AttachmentField::short("Host", &context.host),
                    AttachmentField::short("Environment", &context.environment),
                    AttachmentField::short("Tag / Branch", &context.selected_ref),
                    AttachmentField::short("Release", &context.summary),
                ];

                Self {
                    channel: settings.channel.clone(),
                    message_template: settings.message.clone(),
                    placeholders,
                    title: defaults::SUCCESS_TITLE.to_string(),
                    fallback: format!("Deployment to {} complete.", context.deploy_user),
                    text,
                    fields,
                    color,
                }
            }
        }
    }

    pub fn message(&self) -> String {
        self.placeholders.render(&self.message_template)
    }

    /// Slack attachment object; fields are omitted when empty.
    pub fn attachment(&self) -> Value {
        let mut attachment = json!({
            "title": self.title,
            "fallback": self.fallback,
            "text": self.text,
            "color": self.color,
        });
        if !self.fields.is_empty() {
            attachment["fields"] = json!(self.fields);
        }
        attachment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Token,
    Webhook,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Token => "token",
            Backend::Webhook => "webhook",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend that failed while another one delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendFailure {
    pub backend: Backend,
    pub error_code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl BackendFailure {
    fn from_error(backend: Backend, err: &Error) -> Self {
        Self {
            backend,
            error_code: err.code.as_str().to_string(),
            error: err.message.clone(),
            retryable: err.retryable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Skipped,
}

/// `backends` lists where the message landed; `failures` lists the rest.
/// Retrying only the failed backends avoids duplicate messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub event: NotifyEvent,
    pub status: DeliveryStatus,
    pub backends: Vec<Backend>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BackendFailure>,
}

impl DeliveryResult {
    pub fn skipped(event: NotifyEvent) -> Self {
        Self {
            event,
            status: DeliveryStatus::Skipped,
            backends: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered && !self.backends.is_empty()
    }
}

/// Name of the local OS user running the dispatcher.
pub fn local_os_user() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .or_else(|| command::run_optional("whoami", &[], None))
        .unwrap_or_default()
}

pub struct Dispatcher<'a> {
    transport: &'a dyn Transport,
    os_user: String,
}

impl<'a> Dispatcher<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            os_user: local_os_user(),
        }
    }

    pub fn with_os_user(mut self, os_user: impl Into<String>) -> Self {
        self.os_user = os_user.into();
        self
    }

    pub fn notify(
        &self,
        event: NotifyEvent,
        context: &DeployContext,
        config: &Configuration,
    ) -> Result<DeliveryResult> {
        if config.slack_skip_notification {
            return Ok(DeliveryResult::skipped(event));
        }

        let token = config.slack.as_ref();
        let webhook = config.webhook_url();
        if token.is_none() && webhook.is_none() {
            return Err(Error::notify_not_configured(Vec::new()));
        }

        let placeholders = Placeholders::new(context, &self.os_user, config.app_name());
        let color = match event {
            NotifyEvent::Start => start_color(config),
            NotifyEvent::Success => success_color(config),
        }
        .resolve(context);

        let mut outcomes: Vec<(Backend, Result<()>)> = Vec::new();

        if let Some(overrides) = token {
            let sent = SlackSettings::resolve(&SlackDefaults::default(), overrides).and_then(
                |settings| {
                    let payload = NotificationPayload::for_event(
                        event,
                        context,
                        &settings,
                        placeholders.clone(),
                        color.clone(),
                    );
                    slack::send_token(self.transport, &settings, &payload)
                },
            );
            outcomes.push((Backend::Token, sent));
        }

        if let Some(url) = webhook {
            let (title, text) = webhook_templates(event, config);
            let body = slack::webhook_body(
                &placeholders.render(title),
                &placeholders.render(text),
                &color,
            );
            outcomes.push((
                Backend::Webhook,
                slack::send_webhook(self.transport, url, &body),
            ));
        }

        let mut backends = Vec::new();
        let mut failures = Vec::new();
        let mut first_error = None;
        for (backend, outcome) in outcomes {
            match outcome {
                Ok(()) => backends.push(backend),
                Err(err) => {
                    log_status!("notify", "Slack {} failed: {}", backend, err.message);
                    failures.push(BackendFailure::from_error(backend, &err));
                    first_error.get_or_insert(err);
                }
            }
        }

        // Only an all-backends failure is an error; a partial delivery still counts.
        if backends.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        log_status!("notify", "Sent {} notification via {:?}", event, backends);

        Ok(DeliveryResult {
            event,
            status: DeliveryStatus::Delivered,
            backends,
            failures,
        })
    }
}

fn webhook_templates(event: NotifyEvent, config: &Configuration) -> (&str, &str) {
    let title = config
        .slack_title
        .as_deref()
        .unwrap_or(defaults::WEBHOOK_TITLE);
    let text = match event {
        NotifyEvent::Start => config
            .slack_text
            .as_deref()
            .unwrap_or(defaults::WEBHOOK_START_TEXT),
        NotifyEvent::Success => config
            .slack_success_text
            .as_deref()
            .unwrap_or(defaults::WEBHOOK_SUCCESS_TEXT),
    };
    (title, text)
}
