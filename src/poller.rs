//! Completion-awaiting state machine.
//!
//! [`await_completion`] drives one polling session: it queries the job status
//! through a [`JobApi`], stops on a terminal status, sleeps between
//! `pending` answers, and gives up once the time budget is spent.
//!
//! The deadline is soft. It is checked at the top of each iteration only, so
//! the request in flight and the sleep that follows it may run past
//! `timeout_ms` before the timeout is reported.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{JobApi, JobStatus, PollMode};
use crate::error::JobClientError;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

const POLL_CONTEXT: &str = "Invalid polling options";

/// Per-call polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitOptions {
    /// Polling strategy forwarded to the status endpoint.
    #[serde(default)]
    pub mode: PollMode,
    /// Wall-clock budget for the whole session. Must be positive.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Sleep between `pending` answers. Zero is allowed.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for AwaitOptions {
    fn default() -> Self {
        Self {
            mode: PollMode::default(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// What the poller does after observing a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Terminal status observed; stop and return it.
    Finish(JobStatus),
    /// Still pending; sleep and poll again.
    Continue,
}

/// Evaluate one status string from the server.
///
/// `error` is a normal terminal outcome and comes back as
/// `Step::Finish(JobStatus::Error)`. Only strings outside the known set are
/// failures.
pub fn evaluate(job_id: &str, raw: &str) -> Result<Step, JobClientError> {
    match raw.parse::<JobStatus>() {
        Ok(JobStatus::Completed) => {
            info!(job_id, "job completed successfully");
            Ok(Step::Finish(JobStatus::Completed))
        }
        Ok(JobStatus::Error) => {
            warn!(job_id, "job ended in an error state");
            Ok(Step::Finish(JobStatus::Error))
        }
        Ok(JobStatus::Pending) => {
            debug!(job_id, "job is still pending");
            Ok(Step::Continue)
        }
        Err(unknown) => Err(JobClientError::Protocol {
            job_id: job_id.to_string(),
            status: unknown.0,
        }),
    }
}

/// State owned by a single `await_completion` call.
#[derive(Debug)]
struct PollingSession<'a> {
    job_id: &'a str,
    mode: PollMode,
    timeout: Duration,
    poll_interval: Duration,
    started_at: Instant,
}

impl<'a> PollingSession<'a> {
    fn start(job_id: &'a str, options: AwaitOptions) -> Result<Self, JobClientError> {
        if job_id.trim().is_empty() {
            return Err(JobClientError::invalid_argument(
                POLL_CONTEXT,
                "job id must not be empty",
            ));
        }
        if options.timeout_ms == 0 {
            return Err(JobClientError::invalid_argument(
                POLL_CONTEXT,
                "timeout_ms must be positive",
            ));
        }
        Ok(Self {
            job_id,
            mode: options.mode,
            timeout: Duration::from_millis(options.timeout_ms),
            poll_interval: Duration::from_millis(options.poll_interval_ms),
            started_at: Instant::now(),
        })
    }

    fn within_budget(&self) -> bool {
        self.started_at.elapsed() <= self.timeout
    }

    fn cancelled(&self) -> JobClientError {
        warn!(job_id = self.job_id, "polling cancelled");
        JobClientError::Cancelled {
            job_id: self.job_id.to_string(),
        }
    }

    fn timed_out(&self) -> JobClientError {
        let timeout_ms = self.timeout.as_millis() as u64;
        error!(
            job_id = self.job_id,
            timeout_ms, "polling timed out before the job reached a terminal status"
        );
        JobClientError::Timeout { timeout_ms }
    }
}

/// Poll `job_id` until it reports `completed` or `error`.
///
/// Returns the terminal status. Fails with the classified transport error as
/// soon as one status query fails (after the transport's own retries), with
/// `Protocol` on an unrecognised status, or with `Timeout` once the budget is
/// exhausted.
pub async fn await_completion<A: JobApi>(
    api: &A,
    job_id: &str,
    options: AwaitOptions,
) -> Result<JobStatus, JobClientError> {
    await_completion_with_cancel(api, job_id, options, &CancellationToken::new()).await
}

/// [`await_completion`] with a cancellation token. Cancellation interrupts
/// the status request or inter-poll sleep in progress and fails with
/// `Cancelled`.
pub async fn await_completion_with_cancel<A: JobApi>(
    api: &A,
    job_id: &str,
    options: AwaitOptions,
    cancel: &CancellationToken,
) -> Result<JobStatus, JobClientError> {
    let session = PollingSession::start(job_id, options)?;

    while session.within_budget() {
        debug!(job_id = session.job_id, mode = %session.mode, "polling job status");

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(session.cancelled()),
            status = api.get_status(session.job_id, session.mode) => status?,
        };

        match evaluate(session.job_id, &raw)? {
            Step::Finish(status) => return Ok(status),
            Step::Continue => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(session.cancelled()),
                    _ = sleep(session.poll_interval) => {}
                }
            }
        }
    }

    Err(session.timed_out())
}
