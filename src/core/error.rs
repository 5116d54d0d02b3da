use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    ServerNotFound,

    GitBackendUnavailable,
    GitCommandFailed,

    SelectionInvalid,

    DeployEnvironmentMissing,
    DeployCommandFailed,

    NotifyNotConfigured,
    NotifyBackendRejected,
    NotifyTransportFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ServerNotFound => "server.not_found",

            ErrorCode::GitBackendUnavailable => "git.backend_unavailable",
            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::SelectionInvalid => "selection.invalid",

            ErrorCode::DeployEnvironmentMissing => "deploy.environment_missing",
            ErrorCode::DeployCommandFailed => "deploy.command_failed",

            ErrorCode::NotifyNotConfigured => "notify.not_configured",
            ErrorCode::NotifyBackendRejected => "notify.backend_rejected",
            ErrorCode::NotifyTransportFailed => "notify.transport_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Notification failures never abort a deployment.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            ErrorCode::NotifyNotConfigured
                | ErrorCode::NotifyBackendRejected
                | ErrorCode::NotifyTransportFailed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidSelectionDetails {
    pub answer: String,
    pub kind: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRejectedDetails {
    pub backend: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(ErrorCode::ValidationInvalidArgument, problem, details)
    }

    pub fn server_not_found(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(
            ErrorCode::ServerNotFound,
            format!("Server '{}' not found", id),
            to_details(NotFoundDetails { id }),
        )
        .with_hint("Add a server config under servers/<id>.json in the shipnote config directory")
    }

    pub fn git_backend_unavailable(program: impl Into<String>, error: impl Into<String>) -> Self {
        let program = program.into();
        Self::new(
            ErrorCode::GitBackendUnavailable,
            format!("Could not find local git ('{}')", program),
            serde_json::json!({ "program": program, "error": error.into() }),
        )
        .with_hint("Install git or point 'git_binary' in shipnote.json at the executable")
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    /// The user's answer matched neither a listed name nor a listed index.
    pub fn selection_invalid(kind: &str, answer: impl Into<String>, choices: Vec<String>) -> Self {
        let details = to_details(InvalidSelectionDetails {
            answer: answer.into(),
            kind: kind.to_string(),
            choices,
        });

        Self::new(
            ErrorCode::SelectionInvalid,
            format!(
                "You must select a {} from the list or run this command with the --{} option.",
                kind, kind
            ),
            details,
        )
    }

    pub fn environment_missing(server_id: impl Into<String>) -> Self {
        let server_id = server_id.into();
        Self::new(
            ErrorCode::DeployEnvironmentMissing,
            format!("Environment for server \"{}\" is not configured", server_id),
            to_details(NotFoundDetails { id: server_id }),
        )
        .with_hint("Pass --environment <name> or set 'environment' in the server config")
    }

    pub fn deploy_command_failed(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        let command = command.into();
        Self::new(
            ErrorCode::DeployCommandFailed,
            format!("Deploy command failed: {}", command),
            serde_json::json!({ "command": command, "exitCode": exit_code }),
        )
    }

    pub fn notify_not_configured(missing: Vec<String>) -> Self {
        let message = if missing.is_empty() {
            "No notification backend is configured".to_string()
        } else {
            format!("Slack is missing required keys: {}", missing.join(", "))
        };

        Self::new(
            ErrorCode::NotifyNotConfigured,
            message,
            to_details(MissingArgumentDetails { args: missing }),
        )
        .with_hint(
            "Set \"slack\": {\"token\": \"xoxp...\", \"team\": \"team\", \"channel\": \"#channel\"} \
             or \"slack_webhook\" in shipnote.json",
        )
        .with_hint("Set \"slack_skip_notification\": true to disable notifications")
    }

    pub fn notify_backend_rejected(
        backend: impl Into<String>,
        reason: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        let backend = backend.into();
        let reason = reason.into();
        let details = to_details(BackendRejectedDetails {
            backend: backend.clone(),
            reason: reason.clone(),
            status,
        });

        Self::new(
            ErrorCode::NotifyBackendRejected,
            format!("Slack {} error: {}", backend, reason),
            details,
        )
    }

    pub fn notify_transport_failed(backend: impl Into<String>, error: impl Into<String>) -> Self {
        let backend = backend.into();
        let error = error.into();
        let mut err = Self::new(
            ErrorCode::NotifyTransportFailed,
            format!("Could not reach Slack ({}): {}", backend, error),
            serde_json::json!({ "backend": backend, "error": error }),
        );
        err.retryable = Some(true);
        err
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidJson,
            format!("Invalid JSON in configuration file {}", path),
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
