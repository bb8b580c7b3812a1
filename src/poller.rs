//! Task status polling
//!
//! [`TaskPoller::start`] spawns a background loop that queries the service for a task's
//! status until it reaches a terminal state. The loop is owned by the returned
//! [`PollHandle`]: stopping or dropping the handle cancels it before the next query.
//!
//! # State machine
//!
//! ```text
//! Idle ──start──▶ Polling ──completed──▶ Completed
//!                    │    ──failed / poll error / timeout──▶ Failed
//!                    └────stop / drop──▶ Cancelled
//! ```
//!
//! Every response other than `completed` or `failed` (including `queued` and values the
//! client does not recognize) keeps the poller in `Polling` and schedules the next query
//! one interval after the response arrived.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::service::ConversionService;
use crate::types::{TaskId, TaskSnapshot, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Status line reported when the task completes
pub const COMPLETION_MESSAGE: &str = "Conversion completed!";

/// Failure message used when a failed task carries no message of its own
pub const DEFAULT_FAILURE_MESSAGE: &str = "Conversion failed";

/// Lifecycle state of a poll loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PollerState {
    /// Not started
    #[default]
    Idle,
    /// Querying the service at the configured interval
    Polling,
    /// The task completed; the artifact can be fetched
    Completed,
    /// The task failed, a query failed, or polling timed out
    Failed,
    /// The loop was stopped before the task finished
    Cancelled,
}

/// Timing parameters for a poll loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between a response and the next query
    pub interval: Duration,
    /// Upper bound on total polling time (None = unbounded)
    pub timeout: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            timeout: config.poll_timeout,
        }
    }
}

/// How a poll loop ended, when it did not fail
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The task completed; carries the final status record
    Completed(TaskSnapshot),
    /// The loop was stopped before the task reached a terminal state
    Cancelled,
}

/// Starts poll loops against a conversion service
#[derive(Clone)]
pub struct TaskPoller {
    service: Arc<dyn ConversionService>,
    config: PollerConfig,
}

impl TaskPoller {
    /// Create a poller
    pub fn new(service: Arc<dyn ConversionService>, config: PollerConfig) -> Self {
        Self { service, config }
    }

    /// Timing parameters used for new loops
    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Start polling `task_id`
    ///
    /// The first status query is issued immediately. `on_tick` receives the progress
    /// percentage and status line after every non-failed response.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, task_id: TaskId, on_tick: F) -> PollHandle
    where
        F: FnMut(u8, &str) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(PollerState::Polling);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        tracing::info!(
            task_id = %task_id,
            interval_ms = self.config.interval.as_millis() as u64,
            "polling task status"
        );

        let poll_loop = PollLoop {
            service: Arc::clone(&self.service),
            config: self.config,
            task_id: task_id.clone(),
            cancel: cancel.clone(),
            state_tx,
            snapshot_tx,
        };
        let task = tokio::spawn(poll_loop.run(on_tick));

        PollHandle {
            task_id,
            _guard: cancel.clone().drop_guard(),
            cancel,
            state_rx,
            snapshot_rx,
            task,
        }
    }
}

struct PollLoop {
    service: Arc<dyn ConversionService>,
    config: PollerConfig,
    task_id: TaskId,
    cancel: CancellationToken,
    state_tx: watch::Sender<PollerState>,
    snapshot_tx: watch::Sender<Option<TaskSnapshot>>,
}

impl PollLoop {
    async fn run<F>(self, mut on_tick: F) -> Result<PollOutcome>
    where
        F: FnMut(u8, &str) + Send + 'static,
    {
        let deadline = self
            .config
            .timeout
            .and_then(|t| Instant::now().checked_add(t));

        loop {
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(self.cancelled()),
                _ = expiry(deadline) => return Err(self.timed_out()),
                response = self.service.task_status(&self.task_id) => response,
            };

            let snapshot = match response {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    let e = match e {
                        Error::TaskFailure(_) => e,
                        other => Error::TaskFailure(other.user_message()),
                    };
                    tracing::warn!(task_id = %self.task_id, error = %e, "status query failed");
                    self.finish(PollerState::Failed);
                    return Err(e);
                }
            };

            self.snapshot_tx.send_replace(Some(snapshot.clone()));

            match &snapshot.status {
                TaskStatus::Completed => {
                    on_tick(100, COMPLETION_MESSAGE);
                    tracing::info!(task_id = %self.task_id, "task completed");
                    self.finish(PollerState::Completed);
                    return Ok(PollOutcome::Completed(snapshot));
                }
                TaskStatus::Failed => {
                    let message = snapshot.message().unwrap_or(DEFAULT_FAILURE_MESSAGE);
                    tracing::warn!(task_id = %self.task_id, error = %message, "task failed");
                    self.finish(PollerState::Failed);
                    return Err(Error::TaskFailure(message.to_string()));
                }
                status => {
                    if let TaskStatus::Other(value) = status {
                        tracing::debug!(task_id = %self.task_id, status = %value, "unrecognized status, still polling");
                    }
                    let percent = snapshot.percent();
                    on_tick(percent, &format!("Converting... {}%", percent));
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(self.cancelled()),
                _ = expiry(deadline) => return Err(self.timed_out()),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    fn finish(&self, state: PollerState) {
        self.state_tx.send_replace(state);
    }

    fn cancelled(&self) -> PollOutcome {
        tracing::debug!(task_id = %self.task_id, "polling stopped");
        self.finish(PollerState::Cancelled);
        PollOutcome::Cancelled
    }

    fn timed_out(&self) -> Error {
        let secs = self.config.timeout.map(|t| t.as_secs()).unwrap_or_default();
        tracing::warn!(task_id = %self.task_id, timeout_secs = secs, "polling timed out");
        self.finish(PollerState::Failed);
        Error::TaskFailure(format!("Conversion timed out after {}s", secs))
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Owner of a running poll loop
///
/// Dropping the handle cancels the loop.
pub struct PollHandle {
    task_id: TaskId,
    cancel: CancellationToken,
    _guard: DropGuard,
    state_rx: watch::Receiver<PollerState>,
    snapshot_rx: watch::Receiver<Option<TaskSnapshot>>,
    task: JoinHandle<Result<PollOutcome>>,
}

impl PollHandle {
    /// Task being polled
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Current poller state
    pub fn state(&self) -> PollerState {
        *self.state_rx.borrow()
    }

    /// Last status record received, if any
    pub fn snapshot(&self) -> Option<TaskSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Stop the loop; no status query is issued after this returns
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end, keeping the handle
    ///
    /// Dropping this future leaves the loop running, so it can be awaited again.
    /// Once it has returned, the handle must not be awaited a second time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskFailure`] if the task failed, a status query failed, or
    /// polling timed out.
    pub async fn join(&mut self) -> Result<PollOutcome> {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(task_id = %self.task_id, error = %e, "poll loop panicked or was aborted");
                Err(Error::TaskFailure(format!("Status polling aborted: {}", e)))
            }
        }
    }

    /// Wait for the loop to end
    ///
    /// # Errors
    ///
    /// See [`join`](Self::join).
    pub async fn wait(mut self) -> Result<PollOutcome> {
        self.join().await
    }
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("task_id", &self.task_id)
            .field("state", &self.state())
            .finish()
    }
}
