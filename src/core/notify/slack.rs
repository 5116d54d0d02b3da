//! Slack backends: the chat API (token) and incoming webhooks.

use serde_json::{json, Value};

use super::transport::{HttpResponse, Transport};
use super::NotificationPayload;
use crate::config::SlackOverrides;
use crate::defaults::{SlackDefaults, SLACK_POST_MESSAGE_URL};
use crate::error::{Error, Result};

/// Token backend settings after merging user overrides over the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackSettings {
    pub token: String,
    pub team: String,
    pub channel: String,
    pub icon: String,
    pub username: String,
    pub message: String,
    pub app: String,
    pub unset_text: bool,
    pub icon_url: Option<String>,
    pub parse: Option<String>,
    pub link_names: Option<bool>,
    pub unfurl_links: Option<bool>,
    pub unfurl_media: Option<bool>,
    pub as_user: Option<bool>,
}

fn pick(value: &Option<String>, fallback: &str) -> String {
    value.clone().unwrap_or_else(|| fallback.to_string())
}

fn required(value: &Option<String>, key: &str, missing: &mut Vec<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            missing.push(key.to_string());
            String::new()
        }
    }
}

impl SlackSettings {
    /// Overrides win field by field; `token`, `team` and `channel` must end up non-empty.
    pub fn resolve(defaults: &SlackDefaults, overrides: &SlackOverrides) -> Result<Self> {
        let mut missing = Vec::new();
        let token = required(&overrides.token, "token", &mut missing);
        let team = required(&overrides.team, "team", &mut missing);
        let channel = required(
            &Some(pick(&overrides.channel, &defaults.channel)),
            "channel",
            &mut missing,
        );

        if !missing.is_empty() {
            return Err(Error::notify_not_configured(missing));
        }

        Ok(Self {
            token,
            team,
            channel,
            icon: pick(&overrides.icon, &defaults.icon),
            username: pick(&overrides.username, &defaults.username),
            message: pick(&overrides.message, &defaults.message),
            app: pick(&overrides.app, &defaults.app),
            unset_text: overrides.unset_text.unwrap_or(defaults.unset_text),
            icon_url: overrides.icon_url.clone(),
            parse: overrides.parse.clone(),
            link_names: overrides.link_names,
            unfurl_links: overrides.unfurl_links,
            unfurl_media: overrides.unfurl_media,
            as_user: overrides.as_user,
        })
    }
}

/// Query parameters for `chat.postMessage`.
pub fn token_query(settings: &SlackSettings, payload: &NotificationPayload) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("channel".to_string(), payload.channel.clone()),
        ("token".to_string(), settings.token.clone()),
    ];

    if !settings.unset_text {
        params.push(("text".to_string(), payload.message()));
    }
    params.push(("username".to_string(), settings.username.clone()));
    if settings.icon_url.is_none() {
        params.push(("icon_emoji".to_string(), settings.icon.clone()));
    }
    params.push(("pretty".to_string(), "1".to_string()));

    let optional = [
        ("parse", settings.parse.clone()),
        ("link_names", settings.link_names.map(|b| b.to_string())),
        ("icon_url", settings.icon_url.clone()),
        ("unfurl_links", settings.unfurl_links.map(|b| b.to_string())),
        ("unfurl_media", settings.unfurl_media.map(|b| b.to_string())),
        ("as_user", settings.as_user.map(|b| b.to_string())),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            params.push((key.to_string(), value));
        }
    }

    params.push((
        "attachments".to_string(),
        Value::Array(vec![payload.attachment()]).to_string(),
    ));

    params
}

/// Slack answers HTTP 200 with `{"ok": false, "error": "..."}` for API errors.
pub fn interpret_token_response(response: &HttpResponse) -> Result<()> {
    let parsed: Value = match serde_json::from_str(&response.body) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            return Err(Error::notify_backend_rejected(
                "token",
                format!("bad response: {}", response.body.trim()),
                Some(response.status),
            ))
        }
    };

    if let Some(error) = parsed.get("error") {
        let reason = error
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(Error::notify_backend_rejected(
            "token",
            reason,
            Some(response.status),
        ));
    }

    if !response.is_success() {
        return Err(Error::notify_backend_rejected(
            "token",
            format!("HTTP {}", response.status),
            Some(response.status),
        ));
    }

    Ok(())
}

pub fn send_token(
    transport: &dyn Transport,
    settings: &SlackSettings,
    payload: &NotificationPayload,
) -> Result<()> {
    let query = token_query(settings, payload);
    let response = transport
        .get(SLACK_POST_MESSAGE_URL, &query)
        .map_err(|e| Error::notify_transport_failed("token", e.to_string()))?;
    interpret_token_response(&response)
}

/// Incoming-webhook body with a single markdown attachment.
pub fn webhook_body(title: &str, text: &str, color: &str) -> Value {
    json!({
        "attachments": [{
            "title": title,
            "text": text,
            "color": color,
            "mrkdwn_in": ["text"],
        }]
    })
}

pub fn send_webhook(transport: &dyn Transport, url: &str, body: &Value) -> Result<()> {
    let response = transport
        .post_json(url, body)
        .map_err(|e| Error::notify_transport_failed("webhook", e.to_string()))?;

    if !response.is_success() {
        let reason = if response.body.trim().is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.body.trim().to_string()
        };
        return Err(Error::notify_backend_rejected(
            "webhook",
            reason,
            Some(response.status),
        ));
    }

    Ok(())
}
