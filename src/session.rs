//! Conversion session: one user's file, task and artifact, from selection to download.
//!
//! [`ConversionSession`] orchestrates the validator, the conversion service, the
//! [`TaskPoller`] and the save collaborator, and keeps the presentation sink in step:
//!
//! 1. [`select_file`](ConversionSession::select_file) validates locally and enables start
//! 2. [`start_conversion`](ConversionSession::start_conversion) uploads and starts polling
//! 3. [`wait_for_completion`](ConversionSession::wait_for_completion) awaits a terminal status
//! 4. [`request_download`](ConversionSession::request_download) fetches and saves the PDF
//!
//! Any submission, polling or retrieval failure is reported verbatim and returns the
//! session to the ready phase with no active task. The selected file is kept, so the
//! same document can be submitted again.

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::poller::{PollHandle, PollOutcome, PollerConfig, PollerState, TaskPoller};
use crate::saver::{ArtifactSaver, DirectorySaver};
use crate::service::{ConversionService, HttpConversionService, RETRIEVAL_FAILURE_PREFIX};
use crate::sink::PresentationSink;
use crate::types::{SavedArtifact, SelectedFile, TaskId, TaskSnapshot};
use crate::validation::{Validation, validate_file};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Progress line shown while the upload is in flight
pub const STARTING_MESSAGE: &str = "Starting conversion...";

/// Notice shown once the service accepted the upload
pub const STARTED_MESSAGE: &str = "Conversion started! Tracking progress...";

/// Notice shown when the task completed
pub const SUCCESS_MESSAGE: &str = "File converted successfully!";

const RESET_PROGRESS_MESSAGE: &str = "0%";

/// Where the session is in the conversion lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No file selected
    Empty,
    /// A valid file is selected and no task is active
    Ready,
    /// A task was submitted and is being polled
    Converting,
    /// The task completed; the artifact can be downloaded
    Completed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Ready => "ready",
            SessionPhase::Converting => "converting",
            SessionPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Orchestrates a single document's conversion
pub struct ConversionSession {
    service: Arc<dyn ConversionService>,
    sink: Arc<dyn PresentationSink>,
    saver: Arc<dyn ArtifactSaver>,
    poller: TaskPoller,
    max_upload_bytes: u64,
    phase: SessionPhase,
    file: Option<SelectedFile>,
    /// Name of the file submitted for the current task
    submitted_name: Option<String>,
    task_id: Option<TaskId>,
    task: Option<TaskSnapshot>,
    poll: Option<PollHandle>,
}

impl ConversionSession {
    /// Create a session from explicit collaborators
    pub fn new(
        config: &Config,
        service: Arc<dyn ConversionService>,
        sink: Arc<dyn PresentationSink>,
        saver: Arc<dyn ArtifactSaver>,
    ) -> Self {
        let poller = TaskPoller::new(Arc::clone(&service), PollerConfig::from(config));
        Self {
            service,
            sink,
            saver,
            poller,
            max_upload_bytes: config.max_upload_bytes,
            phase: SessionPhase::Empty,
            file: None,
            submitted_name: None,
            task_id: None,
            task: None,
            poll: None,
        }
    }

    /// Create a session talking HTTP to the configured service and saving into
    /// the configured output directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        sink: Arc<dyn PresentationSink>,
    ) -> Result<Self> {
        let service = HttpConversionService::new(config, credentials)?;
        let saver = DirectorySaver::from_config(&config.save);
        Ok(Self::new(config, Arc::new(service), sink, Arc::new(saver)))
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Identifier of the active task, if one was submitted in this attempt
    pub fn current_task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Most recent status record of the active task
    pub fn current_task(&self) -> Option<TaskSnapshot> {
        self.task
            .clone()
            .or_else(|| self.poll.as_ref().and_then(PollHandle::snapshot))
    }

    /// State of the active poll loop ([`PollerState::Idle`] when none is running)
    pub fn poll_state(&self) -> PollerState {
        self.poll
            .as_ref()
            .map(PollHandle::state)
            .unwrap_or_default()
    }

    /// Name of the selected file
    pub fn selected_file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    /// Whether [`start_conversion`](Self::start_conversion) would be accepted
    pub fn can_start(&self) -> bool {
        self.file.is_some() && self.phase != SessionPhase::Converting
    }

    /// Whether [`request_download`](Self::request_download) would be accepted
    pub fn can_download(&self) -> bool {
        self.phase == SessionPhase::Completed && self.task_id.is_some()
    }

    /// Select a file for conversion
    ///
    /// A rejected file clears the selection and disables start. An accepted file
    /// replaces the previous selection, abandons any task in flight and enables start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with the user-facing reason if the file is rejected.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        if let Validation::Rejected(reason) = validate_file(&file, self.max_upload_bytes) {
            tracing::warn!(file = %file.name, error = %reason, "file rejected");
            self.file = None;
            if self.phase == SessionPhase::Ready {
                self.phase = SessionPhase::Empty;
            }
            self.sink.report_error(&reason);
            self.sink.set_ready(false);
            return Err(Error::Validation(reason));
        }

        if let Some(stale) = self.poll.take() {
            tracing::info!(task_id = %stale.task_id(), "new file selected, abandoning task");
            stale.stop();
        }

        tracing::info!(file = %file.name, size_bytes = file.size(), "file selected");
        self.file = Some(file);
        self.clear_task();
        self.phase = SessionPhase::Ready;
        self.sink.set_download_available(false);
        self.sink.set_ready(true);
        Ok(())
    }

    /// Upload the selected file and start tracking the resulting task
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no file is selected or a conversion is already
    /// running, and [`Error::Submission`] if the upload fails (the session is reset).
    pub async fn start_conversion(&mut self) -> Result<TaskId> {
        if self.phase == SessionPhase::Converting {
            return Err(Error::invalid_state("start conversion", self.phase));
        }
        let file = match &self.file {
            Some(file) => file.clone(),
            None => return Err(Error::invalid_state("start conversion", self.phase)),
        };

        self.clear_task();
        self.phase = SessionPhase::Converting;
        self.sink.set_ready(false);
        self.sink.set_download_available(false);
        self.sink.report_progress(0, STARTING_MESSAGE);

        let submitted = self.service.submit(&file).await;
        let task_id = self.settle(submitted)?;

        tracing::info!(task_id = %task_id, file = %file.name, "conversion started");
        self.task_id = Some(task_id.clone());
        self.submitted_name = Some(file.name);
        self.sink.report_success(STARTED_MESSAGE);

        let sink = Arc::clone(&self.sink);
        self.poll = Some(self.poller.start(task_id.clone(), move |percent, message| {
            sink.report_progress(percent, message)
        }));

        Ok(task_id)
    }

    /// Wait until the active task completes or fails
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no task is being polled, and
    /// [`Error::TaskFailure`] if the task failed, polling failed, or polling timed out
    /// (the session is reset).
    pub async fn wait_for_completion(&mut self) -> Result<TaskSnapshot> {
        let Some(handle) = self.poll.as_mut() else {
            return Err(Error::invalid_state("wait for completion", self.phase));
        };

        // The handle stays in place until the loop resolves, so a dropped wait
        // leaves polling running.
        let outcome = handle.join().await;
        self.poll = None;

        let result = match outcome {
            Ok(PollOutcome::Completed(snapshot)) => Ok(snapshot),
            Ok(PollOutcome::Cancelled) => {
                Err(Error::TaskFailure("Conversion was cancelled".to_string()))
            }
            Err(e) => Err(e),
        };

        let snapshot = self.settle(result)?;
        self.task = Some(snapshot.clone());
        self.phase = SessionPhase::Completed;
        self.sink.report_success(SUCCESS_MESSAGE);
        self.sink.set_download_available(true);
        self.sink.set_ready(self.file.is_some());
        Ok(snapshot)
    }

    /// Upload the selected file and wait for the conversion to finish
    ///
    /// # Errors
    ///
    /// See [`start_conversion`](Self::start_conversion) and
    /// [`wait_for_completion`](Self::wait_for_completion).
    pub async fn convert(&mut self) -> Result<TaskSnapshot> {
        self.start_conversion().await?;
        self.wait_for_completion().await
    }

    /// Download the converted PDF and hand it to the saver
    ///
    /// May be repeated while the session stays completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] before completion, and [`Error::Retrieval`] if the
    /// download or save fails (the session is reset).
    pub async fn request_download(&mut self) -> Result<SavedArtifact> {
        let task_id = match (&self.task_id, self.phase) {
            (Some(task_id), SessionPhase::Completed) => task_id.clone(),
            _ => return Err(Error::invalid_state("download", self.phase)),
        };
        let original_name = self.submitted_name.clone().unwrap_or_default();

        let saved = match self.service.fetch_artifact(&task_id, &original_name).await {
            Ok(artifact) => self.saver.save(&artifact).await.map_err(|e| {
                Error::Retrieval(format!("{}{}", RETRIEVAL_FAILURE_PREFIX, e.user_message()))
            }),
            Err(e) => Err(e),
        };

        let saved = self.settle(saved)?;
        tracing::info!(
            task_id = %task_id,
            filename = %saved.filename,
            size_bytes = saved.size_bytes,
            "artifact retrieved"
        );
        Ok(saved)
    }

    /// Ask the service to purge stale files, without waiting for the result
    ///
    /// Failures are logged and otherwise ignored; the session is never affected.
    /// Must be called from within a tokio runtime.
    pub fn request_cleanup(&self) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            match service.cleanup().await {
                Ok(()) => tracing::debug!("cleanup requested"),
                Err(e) => tracing::debug!(error = %e, "cleanup request failed, ignoring"),
            }
        })
    }

    fn clear_task(&mut self) {
        self.poll = None;
        self.task_id = None;
        self.task = None;
        self.submitted_name = None;
    }

    /// Pass `result` through, ending the current attempt if its error resets the session
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Err(e) if e.resets_session() => self.fail(e),
            _ => {}
        }
        result
    }

    /// End the current attempt after a submission, polling or retrieval failure
    fn fail(&mut self, e: &Error) {
        tracing::warn!(
            task_id = ?self.task_id.as_ref().map(TaskId::as_str),
            error = %e,
            "conversion attempt failed"
        );
        self.clear_task();
        self.phase = if self.file.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Empty
        };
        self.sink.report_error(&e.user_message());
        self.sink.set_download_available(false);
        self.sink.report_progress(0, RESET_PROGRESS_MESSAGE);
        self.sink.set_ready(self.file.is_some());
    }
}

impl std::fmt::Debug for ConversionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionSession")
            .field("phase", &self.phase)
            .field("file", &self.file)
            .field("task_id", &self.task_id)
            .field("poll", &self.poll)
            .finish()
    }
}
