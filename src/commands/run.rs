use clap::Args;
use serde::Serialize;
use std::time::{Duration, Instant};

use shipnote::config::Configuration;
use shipnote::log_status;
use shipnote::notify::transport::{ReqwestTransport, Transport};
use shipnote::notify::{desktop, DeliveryResult, Dispatcher, NotifyEvent};
use shipnote::utils::command;
use shipnote::{DeployContext, Error};

use super::{build_context, CmdResult, DeployFlags, GlobalArgs};

#[derive(Args)]
pub struct RunArgs {
    /// Server ID (servers/<id>.json)
    pub server_id: String,

    #[command(flatten)]
    pub flags: DeployFlags,

    /// External deploy command, after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// What happened to one notification; failures are recorded, never raised.
#[derive(Debug, Serialize)]
pub struct NotificationOutcome {
    pub event: NotifyEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    fn delivered_via_slack(&self) -> bool {
        self.delivery
            .as_ref()
            .map(DeliveryResult::is_delivered)
            .unwrap_or(false)
    }
}

#[derive(Serialize)]
pub struct RunOutput {
    pub command: String,
    pub context: DeployContext,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed: String,
    pub notifications: Vec<NotificationOutcome>,
    pub desktop_notified: bool,
}

/// Notification errors are recorded and the deploy goes on; anything else aborts.
fn dispatch_best_effort(
    transport: Option<&dyn Transport>,
    event: NotifyEvent,
    context: &DeployContext,
    config: &Configuration,
) -> shipnote::Result<NotificationOutcome> {
    let result = match transport {
        Some(transport) => Dispatcher::new(transport).notify(event, context, config),
        None => Err(Error::notify_transport_failed("http", "HTTP client unavailable")),
    };

    match result {
        Ok(delivery) => Ok(NotificationOutcome {
            event,
            delivery: Some(delivery),
            error_code: None,
            error: None,
        }),
        Err(err) if err.code.is_notification() => {
            log_status!("notify", "Skipping {} notification: {}", event, err.message);
            Ok(NotificationOutcome {
                event,
                delivery: None,
                error_code: Some(err.code.as_str().to_string()),
                error: Some(err.message),
            })
        }
        Err(err) => Err(err),
    }
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<RunOutput> {
    let config = global.configuration()?;
    let context = build_context(global, &config, &args.server_id, &args.flags)?;

    let transport = match ReqwestTransport::new(Duration::from_secs(config.notify_timeout_secs)) {
        Ok(transport) => Some(transport),
        Err(err) => {
            log_status!("notify", "{}", err.message);
            None
        }
    };
    let transport = transport.as_ref().map(|t| t as &dyn Transport);

    let started_at = chrono::Local::now();
    let clock = Instant::now();

    let mut notifications = vec![dispatch_best_effort(
        transport,
        NotifyEvent::Start,
        &context,
        &config,
    )?];

    let env = [
        ("SHIPNOTE_REF", context.selected_ref.as_str()),
        ("SHIPNOTE_REF_KIND", context.ref_kind.as_str()),
        ("SHIPNOTE_ENVIRONMENT", context.environment.as_str()),
    ];
    let status = command::run_inherited(&args.command, &env)?;
    if !status.success() {
        return Err(Error::deploy_command_failed(args.command.join(" "), status.code())
            .with_hint("No success notification was sent"));
    }

    let elapsed = clock.elapsed();
    let finished_at = chrono::Local::now();

    let success = dispatch_best_effort(transport, NotifyEvent::Success, &context, &config)?;
    let mut desktop_notified = false;
    if desktop::should_notify(&config, success.delivered_via_slack()) {
        let (title, body) = desktop::message(&context, elapsed);
        match desktop::send(&title, &body) {
            Ok(()) => desktop_notified = true,
            Err(err) => log_status!("notify", "Desktop notification failed: {}", err),
        }
    }
    notifications.push(success);

    log_status!("run", "Total Time Elapsed: {}", desktop::format_elapsed(elapsed));

    Ok((
        RunOutput {
            command: "deploy.run".to_string(),
            context,
            started_at: started_at.to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            elapsed: desktop::format_elapsed(elapsed),
            notifications,
            desktop_notified,
        },
        0,
    ))
}
