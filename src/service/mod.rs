//! Conversion service boundary.
//!
//! [`ConversionService`] is the seam between the task-lifecycle core and the network.
//! - [`http`] - reqwest implementation speaking the service's REST API
//!
//! The poller and session only ever hold an `Arc<dyn ConversionService>`, which keeps
//! them testable without a running service.

mod http;

pub use http::HttpConversionService;

use crate::error::Result;
use crate::types::{Artifact, SelectedFile, TaskId, TaskSnapshot};
use async_trait::async_trait;

/// Message used when a failed submission carries no structured error body
pub const GENERIC_SUBMISSION_FAILURE: &str = "Conversion failed";

/// Prefix of every retrieval error surfaced to the user
pub const RETRIEVAL_FAILURE_PREFIX: &str = "Failed to download file: ";

/// Remote conversion service
///
/// Each method is a single request/response round trip. Implementations classify
/// failures into the domain error kinds:
/// - `submit` fails with [`Error::Submission`](crate::Error::Submission)
/// - `task_status` fails with [`Error::TaskFailure`](crate::Error::TaskFailure)
/// - `fetch_artifact` fails with [`Error::Retrieval`](crate::Error::Retrieval)
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Upload a validated file and return the service-assigned task identifier unchanged
    async fn submit(&self, file: &SelectedFile) -> Result<TaskId>;

    /// Query the current status record of a task
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot>;

    /// Download the converted artifact of a completed task
    ///
    /// `original_name` is the submitted file's name, used to derive the artifact
    /// filename when the service does not suggest one.
    async fn fetch_artifact(&self, task_id: &TaskId, original_name: &str) -> Result<Artifact>;

    /// Ask the service to purge stale uploads and outputs
    async fn cleanup(&self) -> Result<()>;
}
