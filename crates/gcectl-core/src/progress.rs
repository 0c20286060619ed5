//! Operation waiting and progress reporting
//!
//! Every mutating control-plane call returns an [`Operation`](crate::Operation)
//! that must be polled until `DONE`. [`wait_for_operation`] routes each poll
//! to the zonal or global status endpoint, sleeps between polls, and honours
//! an optional deadline and cancellation token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::compute::{ComputeApi, OperationHandle, OperationScope, OperationState, OperationStatus};
use crate::config::WaitConfig;
use crate::error::{CoreError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Progress events emitted while waiting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Waiting has begun
    Started { target: String },
    /// One poll finished; `state` is the provider-reported status
    Polling {
        target: String,
        state: String,
        elapsed: Duration,
    },
    /// Terminal success
    Completed { target: String, elapsed: Duration },
    /// Terminal failure, timeout, or cancellation
    Failed { target: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner. Nothing in the workflows depends on
/// it being called.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// How to wait for operations and resources
#[derive(Clone)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            cancel: None,
            on_progress: None,
        }
    }
}

impl fmt::Debug for WaitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitOptions")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl From<&WaitConfig> for WaitOptions {
    fn from(config: &WaitConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

impl WaitOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

/// Shared bookkeeping for poll loops: deadline, cancellation, and pacing
pub(crate) struct Poller<'a> {
    options: &'a WaitOptions,
    target: String,
    start: Instant,
}

impl<'a> Poller<'a> {
    pub(crate) fn start(options: &'a WaitOptions, target: impl Into<String>) -> Self {
        let target = target.into();
        options.emit(ProgressEvent::Started {
            target: target.clone(),
        });
        Self {
            options,
            target,
            start: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub(crate) fn polled(&self, state: impl Into<String>) {
        let state = state.into();
        debug!(target_resource = %self.target, %state, elapsed_secs = self.elapsed().as_secs(), "poll");
        self.options.emit(ProgressEvent::Polling {
            target: self.target.clone(),
            state,
            elapsed: self.elapsed(),
        });
    }

    pub(crate) fn completed(&self) {
        info!(target_resource = %self.target, elapsed_secs = self.elapsed().as_secs(), "done");
        self.options.emit(ProgressEvent::Completed {
            target: self.target.clone(),
            elapsed: self.elapsed(),
        });
    }

    pub(crate) fn fail(&self, err: CoreError) -> CoreError {
        warn!(target_resource = %self.target, error = %err, "wait failed");
        self.options.emit(ProgressEvent::Failed {
            target: self.target.clone(),
            error: err.to_string(),
        });
        err
    }

    /// Sleep one interval, bounded by the deadline and the cancellation token
    pub(crate) async fn pause(&self) -> Result<()> {
        let mut sleep_for = self.options.interval;
        if let Some(timeout) = self.options.timeout {
            let remaining = timeout.saturating_sub(self.elapsed());
            if remaining.is_zero() {
                return Err(self.fail(self.timed_out(timeout)));
            }
            sleep_for = sleep_for.min(remaining);
        }

        match &self.options.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(self.fail(CoreError::Cancelled(self.target.clone()))),
                    _ = tokio::time::sleep(sleep_for) => self.check_deadline(),
                }
            }
            None => {
                tokio::time::sleep(sleep_for).await;
                self.check_deadline()
            }
        }
    }

    /// Run one status query, abandoning it if the wait is cancelled
    pub(crate) async fn query<T, F>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let result = match &self.options.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(CoreError::Cancelled(self.target.clone())),
                    result = fut => result,
                }
            }
            None => fut.await,
        };
        result.map_err(|e| self.fail(e))
    }

    fn check_deadline(&self) -> Result<()> {
        match self.options.timeout {
            Some(timeout) if self.elapsed() >= timeout => Err(self.fail(self.timed_out(timeout))),
            _ => Ok(()),
        }
    }

    fn timed_out(&self, timeout: Duration) -> CoreError {
        CoreError::OperationTimedOut {
            operation: self.target.clone(),
            timeout,
        }
    }
}

/// Poll an operation until it reaches `DONE`
///
/// Zonal handles are polled on the zone's operations endpoint and global
/// handles on the global one. Returns the final status when the operation
/// finished cleanly, [`CoreError::OperationFailed`] when it finished with an
/// error, and never returns while it is `PENDING` or `RUNNING`, unless the
/// deadline passes ([`CoreError::OperationTimedOut`]) or the wait is
/// cancelled ([`CoreError::Cancelled`]).
///
/// # Example
///
/// ```rust,ignore
/// let op = client.insert_instance("us-west1-b", &body).await?;
/// let status = wait_for_operation(&client, &op.handle(), &WaitOptions::default()).await?;
/// assert!(status.is_done());
/// ```
pub async fn wait_for_operation(
    api: &dyn ComputeApi,
    handle: &OperationHandle,
    options: &WaitOptions,
) -> Result<OperationStatus> {
    let poller = Poller::start(options, handle.to_string());

    loop {
        let operation = match &handle.scope {
            OperationScope::Zonal(zone) => {
                poller
                    .query(api.get_zone_operation(zone, &handle.id))
                    .await?
            }
            OperationScope::Global => poller.query(api.get_global_operation(&handle.id)).await?,
        };

        let status = operation.status();
        poller.polled(status.state.to_string());

        if status.state == OperationState::Done {
            return match status.error_detail {
                Some(detail) => Err(poller.fail(CoreError::OperationFailed {
                    operation: handle.id.clone(),
                    detail,
                })),
                None => {
                    poller.completed();
                    Ok(status)
                }
            };
        }

        poller.pause().await?;
    }
}
