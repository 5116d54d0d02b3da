//! Built-in defaults that configuration can override.

use serde::{Deserialize, Serialize};

/// Slack chat API endpoint used by the token backend.
pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Color for production deployments.
pub const PROD_COLOR: &str = "#7CD197";

/// Color for every other environment.
pub const DEFAULT_COLOR: &str = "#4d91f7";

/// Environment name that gets the production color.
pub const PROD_ENVIRONMENT: &str = "prod";

pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_APP_NAME: &str = "app-name";

/// How many refs to offer when prompting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefLimits {
    #[serde(default = "default_branch_limit")]
    pub branches: usize,
    #[serde(default = "default_tag_limit")]
    pub tags: usize,
}

impl Default for RefLimits {
    fn default() -> Self {
        Self {
            branches: default_branch_limit(),
            tags: default_tag_limit(),
        }
    }
}

fn default_branch_limit() -> usize {
    9
}

fn default_tag_limit() -> usize {
    6
}

/// Message settings the token backend starts from before user overrides apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackDefaults {
    pub channel: String,
    pub icon: String,
    pub username: String,
    pub message: String,
    pub app: String,
    pub unset_text: bool,
}

impl Default for SlackDefaults {
    fn default() -> Self {
        Self {
            channel: "#general".to_string(),
            icon: ":sunny:".to_string(),
            username: "Deployer".to_string(),
            message: "Deployment to `{{host}}` on *{{stage}}* of {{branch}}".to_string(),
            app: DEFAULT_APP_NAME.to_string(),
            unset_text: true,
        }
    }
}

pub const START_TITLE: &str = "Deployment initiated";

pub const START_TEXT: &str =
    "{{user.name}} <{{user.email}}> has initiated a deployment\nTarget: {{target}}\nRelease: {{branch}} - {{release}}";

pub const SUCCESS_TITLE: &str = "Deployment Complete";

/// Webhook body for the start event.
pub const WEBHOOK_START_TEXT: &str =
    "*{{user.name}}* _<{{user.email}}>_ has initiated a deployment\nTarget: *{{target}}*\nRelease: *{{branch}}* - _{{release}}_";

/// Webhook body for the success event.
pub const WEBHOOK_SUCCESS_TEXT: &str =
    "*{{user.name}}* _<{{user.email}}>_ has deployed successfully!\nTarget: *{{target}}*\nRelease: *{{branch}}* - _{{release}}_";

/// Webhook attachment title.
pub const WEBHOOK_TITLE: &str = "{{app_name}}";
