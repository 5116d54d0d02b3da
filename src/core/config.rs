//! Read-only configuration resolved once at startup from `shipnote.json`.

use crate::defaults::{self, RefLimits};
use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// User overrides for the Slack token backend (the `slack` table).
///
/// Every field is optional; unset fields fall back to `SlackDefaults`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlackOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unset_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_user: Option<bool>,
}

/// Root configuration structure for shipnote.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Configuration {
    /// Enables the token backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackOverrides>,

    /// Enables the webhook backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,

    /// Suppresses every Slack send.
    #[serde(default)]
    pub slack_skip_notification: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_success_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_success_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    #[serde(default)]
    pub disable_system_notification: bool,

    #[serde(default)]
    pub ref_limits: RefLimits,

    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_binary: Option<String>,
}

fn default_notify_timeout_secs() -> u64 {
    defaults::DEFAULT_NOTIFY_TIMEOUT_SECS
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            slack: None,
            slack_webhook: None,
            slack_skip_notification: false,
            slack_color: None,
            slack_success_color: None,
            slack_text: None,
            slack_success_text: None,
            slack_title: None,
            application: None,
            disable_system_notification: false,
            ref_limits: RefLimits::default(),
            notify_timeout_secs: default_notify_timeout_secs(),
            git_binary: None,
        }
    }
}

impl Configuration {
    /// Load `shipnote.json` from the config root. A missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::shipnote_json(root);
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content, &path.display().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::internal_io(
                e.to_string(),
                Some(format!("read {}", path.display())),
            )),
        }
    }

    pub fn from_json(content: &str, source: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| Error::config_invalid_json(source, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ref_limits.branches == 0 || self.ref_limits.tags == 0 {
            return Err(Error::config_invalid_value(
                "ref_limits",
                Some(format!(
                    "branches={}, tags={}",
                    self.ref_limits.branches, self.ref_limits.tags
                )),
                "Ref limits must be at least 1",
            ));
        }
        Ok(())
    }

    /// Webhook URL, if one is set and non-blank.
    pub fn webhook_url(&self) -> Option<&str> {
        self.slack_webhook
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Application name used for `{{app_name}}` and the webhook title.
    pub fn app_name(&self) -> &str {
        self.slack
            .as_ref()
            .and_then(|slack| slack.app.as_deref())
            .or(self.application.as_deref())
            .unwrap_or(defaults::DEFAULT_APP_NAME)
    }

    pub fn git_binary(&self) -> &str {
        self.git_binary.as_deref().unwrap_or("git")
    }

    /// Copy safe to print: secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(slack) = copy.slack.as_mut() {
            if slack.token.is_some() {
                slack.token = Some("********".to_string());
            }
        }
        if copy.slack_webhook.is_some() {
            copy.slack_webhook = copy.webhook_url().map(mask_url);
        }
        copy
    }
}

/// Keep scheme and host, hide the path (webhook URLs embed their secret there).
fn mask_url(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            format!("{}/********", &url[..scheme_end + 3 + host_end])
        }
        None => "********".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(dir.path()).unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.ref_limits.branches, 9);
        assert_eq!(config.ref_limits.tags, 6);
    }

    #[test]
    fn parses_original_keys() {
        let config = Configuration::from_json(
            r##"{
                "slack": {"token": "xoxp-1", "team": "acme", "channel": "#deploys"},
                "slack_webhook": "https://hooks.slack.com/services/T/B/X",
                "slack_skip_notification": true,
                "ref_limits": {"tags": 3}
            }"##,
            "test",
        )
        .unwrap();

        assert_eq!(
            config.slack.as_ref().and_then(|s| s.team.as_deref()),
            Some("acme")
        );
        assert!(config.slack_skip_notification);
        assert_eq!(config.ref_limits.tags, 3);
        assert_eq!(config.ref_limits.branches, 9);
    }

    #[test]
    fn blank_webhook_is_ignored() {
        let config = Configuration {
            slack_webhook: Some("   ".to_string()),
            ..Configuration::default()
        };
        assert_eq!(config.webhook_url(), None);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = Configuration::from_json(r#"{"ref_limits": {"branches": 0}}"#, "test").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn app_name_prefers_slack_table() {
        let mut config = Configuration {
            application: Some("shop".to_string()),
            ..Configuration::default()
        };
        assert_eq!(config.app_name(), "shop");

        config.slack = Some(SlackOverrides {
            app: Some("shop-api".to_string()),
            ..SlackOverrides::default()
        });
        assert_eq!(config.app_name(), "shop-api");
    }

    #[test]
    fn redacted_masks_token_and_webhook_path() {
        let config = Configuration {
            slack: Some(SlackOverrides {
                token: Some("xoxp-secret".to_string()),
                ..SlackOverrides::default()
            }),
            slack_webhook: Some("https://hooks.slack.com/services/T/B/secret".to_string()),
            ..Configuration::default()
        };

        let redacted = config.redacted();
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(
            redacted.slack_webhook.as_deref(),
            Some("https://hooks.slack.com/********")
        );
    }
}
