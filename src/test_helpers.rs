//! Shared test doubles for unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::error::{Error, Result};
use crate::saver::ArtifactSaver;
use crate::service::{ConversionService, RETRIEVAL_FAILURE_PREFIX};
use crate::sink::PresentationSink;
use crate::types::{Artifact, SavedArtifact, SelectedFile, TaskId, TaskSnapshot, TaskStatus};
use crate::utils::resolve_artifact_filename;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Status record with the given wire status and progress
pub(crate) fn snapshot(status: &str, progress: u32) -> TaskSnapshot {
    TaskSnapshot::new(TaskStatus::from(status.to_string()), progress)
}

/// Failed status record, optionally carrying a message
pub(crate) fn failed(message: Option<&str>) -> TaskSnapshot {
    TaskSnapshot {
        message: message.map(str::to_string),
        ..TaskSnapshot::new(TaskStatus::Failed, 0)
    }
}

pub(crate) fn docx(name: &str) -> SelectedFile {
    SelectedFile::new(name, b"PK\x03\x04 word document".to_vec())
}

/// Conversion service that replays a fixed script
///
/// Status responses are consumed in order; the last one repeats forever.
/// `Err(message)` entries become [`Error::TaskFailure`].
pub(crate) struct ScriptedService {
    submit_result: Mutex<std::result::Result<String, String>>,
    statuses: Mutex<VecDeque<std::result::Result<TaskSnapshot, String>>>,
    artifact: Mutex<std::result::Result<(Vec<u8>, Option<String>), String>>,
    fail_cleanup: Mutex<bool>,
    submitted: Mutex<Vec<SelectedFile>>,
    status_times: Mutex<Vec<(TaskId, Instant)>>,
    fetch_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
}

impl ScriptedService {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            submit_result: Mutex::new(Ok("task-1".to_string())),
            statuses: Mutex::new(VecDeque::from([Ok(snapshot("completed", 100))])),
            artifact: Mutex::new(Ok((b"%PDF-1.7".to_vec(), None))),
            fail_cleanup: Mutex::new(false),
            submitted: Mutex::new(Vec::new()),
            status_times: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            cleanup_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn with_task_id(self: Arc<Self>, task_id: &str) -> Arc<Self> {
        *self.submit_result.lock().unwrap() = Ok(task_id.to_string());
        self
    }

    pub(crate) fn with_submit_error(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.submit_result.lock().unwrap() = Err(message.to_string());
        self
    }

    pub(crate) fn with_statuses(
        self: Arc<Self>,
        statuses: Vec<std::result::Result<TaskSnapshot, String>>,
    ) -> Arc<Self> {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub(crate) fn with_artifact(
        self: Arc<Self>,
        bytes: &[u8],
        content_disposition: Option<&str>,
    ) -> Arc<Self> {
        *self.artifact.lock().unwrap() =
            Ok((bytes.to_vec(), content_disposition.map(str::to_string)));
        self
    }

    pub(crate) fn with_fetch_error(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.artifact.lock().unwrap() = Err(message.to_string());
        self
    }

    pub(crate) fn with_failing_cleanup(self: Arc<Self>) -> Arc<Self> {
        *self.fail_cleanup.lock().unwrap() = true;
        self
    }

    pub(crate) fn submitted(&self) -> Vec<SelectedFile> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_times.lock().unwrap().len()
    }

    pub(crate) fn status_calls_for(&self, task_id: &str) -> usize {
        self.status_times
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id.as_str() == task_id)
            .count()
    }

    pub(crate) fn status_call_times(&self) -> Vec<Instant> {
        self.status_times
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cleanup_calls(&self) -> usize {
        self.cleanup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionService for ScriptedService {
    async fn submit(&self, file: &SelectedFile) -> Result<TaskId> {
        self.submitted.lock().unwrap().push(file.clone());
        self.submit_result
            .lock()
            .unwrap()
            .clone()
            .map(TaskId::from)
            .map_err(Error::Submission)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot> {
        self.status_times
            .lock()
            .unwrap()
            .push((task_id.clone(), Instant::now()));

        let mut statuses = self.statuses.lock().unwrap();
        let step = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        step.expect("status script must not be empty")
            .map(|mut s| {
                s.task_id.get_or_insert_with(|| task_id.clone());
                s
            })
            .map_err(Error::TaskFailure)
    }

    async fn fetch_artifact(&self, _task_id: &TaskId, original_name: &str) -> Result<Artifact> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let (bytes, disposition) = self
            .artifact
            .lock()
            .unwrap()
            .clone()
            .map_err(|m| Error::Retrieval(format!("{RETRIEVAL_FAILURE_PREFIX}{m}")))?;
        let filename = resolve_artifact_filename(disposition.as_deref(), original_name);
        Ok(Artifact::pdf(bytes, filename))
    }

    async fn cleanup(&self) -> Result<()> {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_cleanup.lock().unwrap() {
            return Err(Error::Cleanup("Request failed with status code 500".to_string()));
        }
        Ok(())
    }
}

/// One call received by [`RecordingSink`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SinkCall {
    Progress(u8, String),
    Error(String),
    Success(String),
    Ready(bool),
    DownloadAvailable(bool),
}

/// Presentation sink that records every call in order
#[derive(Default)]
pub(crate) struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn successes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Success(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn progress(&self) -> Vec<(u8, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Progress(p, m) => Some((p, m)),
                _ => None,
            })
            .collect()
    }

    /// Most recent `set_ready` value
    pub(crate) fn ready(&self) -> Option<bool> {
        self.calls().into_iter().rev().find_map(|c| match c {
            SinkCall::Ready(r) => Some(r),
            _ => None,
        })
    }

    /// Most recent `set_download_available` value
    pub(crate) fn download_available(&self) -> Option<bool> {
        self.calls().into_iter().rev().find_map(|c| match c {
            SinkCall::DownloadAvailable(a) => Some(a),
            _ => None,
        })
    }

    pub(crate) fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PresentationSink for RecordingSink {
    fn report_progress(&self, percent: u8, message: &str) {
        self.push(SinkCall::Progress(percent, message.to_string()));
    }

    fn report_error(&self, message: &str) {
        self.push(SinkCall::Error(message.to_string()));
    }

    fn report_success(&self, message: &str) {
        self.push(SinkCall::Success(message.to_string()));
    }

    fn set_ready(&self, ready: bool) {
        self.push(SinkCall::Ready(ready));
    }

    fn set_download_available(&self, available: bool) {
        self.push(SinkCall::DownloadAvailable(available));
    }
}

/// Saver that keeps artifacts in memory
#[derive(Default)]
pub(crate) struct MemorySaver {
    saved: Mutex<Vec<Artifact>>,
    fail_with: Mutex<Option<String>>,
}

impl MemorySaver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        let saver = Self::default();
        *saver.fail_with.lock().unwrap() = Some(message.to_string());
        Arc::new(saver)
    }

    pub(crate) fn saved(&self) -> Vec<Artifact> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSaver for MemorySaver {
    async fn save(&self, artifact: &Artifact) -> Result<SavedArtifact> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(Error::Io(std::io::Error::other(message)));
        }
        self.saved.lock().unwrap().push(artifact.clone());
        Ok(SavedArtifact {
            filename: artifact.filename.clone(),
            path: None,
            size_bytes: artifact.bytes.len() as u64,
        })
    }
}
