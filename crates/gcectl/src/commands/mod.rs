//! Command implementations

pub mod clone;
pub mod controller;
pub mod firewall;
pub mod instance;
pub mod operation;
pub mod profile;
pub mod progress;
pub mod snapshot;

use std::time::Duration;

use gcectl_core::WaitOptions;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, OutputFormat};
use crate::connection::{ConnectOptions, ConnectionManager, Session};
use crate::error::Result as CliResult;
use crate::output;
use progress::WaitProgress;

/// Everything a resource command needs besides its own arguments
pub struct CommandContext<'a> {
    pub conn_mgr: &'a ConnectionManager,
    pub connect: ConnectOptions,
    pub output: OutputFormat,
    pub poll_interval: Option<u64>,
    pub wait_timeout: Option<u64>,
    pub cancel: CancellationToken,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &Cli, conn_mgr: &'a ConnectionManager, cancel: CancellationToken) -> Self {
        Self {
            conn_mgr,
            connect: ConnectOptions {
                profile: cli.profile.clone(),
                zone: cli.zone.clone(),
                no_retry: cli.no_retry,
                retry_attempts: cli.retry_attempts,
            },
            output: cli.output,
            poll_interval: cli.poll_interval,
            wait_timeout: cli.wait_timeout,
            cancel,
        }
    }

    pub fn session(&self) -> CliResult<Session> {
        self.conn_mgr.connect(&self.connect)
    }

    /// Profile wait settings with flag overrides, cancellation, and a spinner
    ///
    /// The spinner is only drawn for human output; it clears itself when the
    /// returned [`WaitProgress`] is dropped.
    pub fn wait_options(&self, session: &Session) -> (WaitOptions, WaitProgress) {
        let mut options =
            WaitOptions::from(&session.wait).with_cancellation(self.cancel.clone());
        if let Some(secs) = self.poll_interval {
            options = options.with_interval(Duration::from_secs(secs.max(1)));
        }
        if let Some(secs) = self.wait_timeout {
            options = options.with_timeout(Duration::from_secs(secs));
        }

        let progress = WaitProgress::new(self.output.is_human());
        if let Some(callback) = progress.callback() {
            options = options.with_progress(callback);
        }
        (options, progress)
    }
}

/// Print structured output, or run `human` for auto/table output
pub fn print_or<T, F>(data: &T, format: OutputFormat, human: F) -> CliResult<()>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Auto => human(),
        _ => output::print_output(data, format.into())?,
    }
    Ok(())
}
