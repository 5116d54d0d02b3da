//! Local desktop notification after a successful deploy when Slack stayed quiet.

use std::ffi::OsString;
use std::time::Duration;

use crate::config::Configuration;
use crate::context::DeployContext;
use crate::error::{Error, Result};
use crate::utils::command;

/// `<minutes>m <seconds>s`, minutes wrapping at the hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}m {}s", (total / 60) % 60, total % 60)
}

/// Desktop notifications only stand in for Slack, never duplicate it.
pub fn should_notify(config: &Configuration, slack_delivered: bool) -> bool {
    !slack_delivered && !config.disable_system_notification
}

pub fn message(context: &DeployContext, elapsed: Duration) -> (String, String) {
    let title = format!("Successfully deployed to {}!", context.host);
    let body = format!(
        "Successfully deployed {} ({}) to {}!\nTotal Time Elapsed: {}",
        context.selected_ref,
        context.summary,
        context.host,
        format_elapsed(elapsed)
    );
    (title, body)
}

/// Display used when the shell has none, e.g. an ssh or cron session.
const FALLBACK_DISPLAY: &str = ":0";

/// Extra environment for `notify-send`; an existing `DISPLAY` is left alone.
fn display_env(current: Option<OsString>) -> Vec<(&'static str, &'static str)> {
    match current {
        Some(display) if !display.is_empty() => Vec::new(),
        _ => vec![("DISPLAY", FALLBACK_DISPLAY)],
    }
}

pub fn send(title: &str, body: &str) -> Result<()> {
    let env = display_env(std::env::var_os("DISPLAY"));
    let output = command::capture_with_env("notify-send", &[title, body], &env)
        .map_err(|e| Error::internal_io(e.to_string(), Some("notify-send".to_string())))?;

    if !output.status.success() {
        return Err(Error::internal_io(
            command::error_text(&output),
            Some("notify-send".to_string()),
        ));
    }
    Ok(())
}
