use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use shipnote::notify::transport::ReqwestTransport;
use shipnote::notify::{DeliveryResult, Dispatcher, NotifyEvent};
use shipnote::DeployContext;

use super::{CmdResult, GlobalArgs};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EventArg {
    Start,
    Success,
}

impl From<EventArg> for NotifyEvent {
    fn from(event: EventArg) -> Self {
        match event {
            EventArg::Start => NotifyEvent::Start,
            EventArg::Success => NotifyEvent::Success,
        }
    }
}

#[derive(Args)]
pub struct NotifyArgs {
    /// Deployment event to announce
    #[arg(value_enum)]
    pub event: EventArg,

    /// Context file written by `prepare --save`
    #[arg(long, value_name = "FILE")]
    pub context: PathBuf,
}

pub fn run(args: NotifyArgs, global: &GlobalArgs) -> CmdResult<DeliveryResult> {
    let config = global.configuration()?;
    let context = DeployContext::load(&args.context)?;
    let transport = ReqwestTransport::new(Duration::from_secs(config.notify_timeout_secs))?;

    let result = Dispatcher::new(&transport).notify(args.event.into(), &context, &config)?;
    Ok((result, 0))
}
