//! Core types for docconv

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Media type declared for every converted artifact
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Opaque, server-issued identifier of a conversion task
///
/// The client never inspects its shape; it is stored and echoed back exactly as received.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as received from the service
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status as reported by the service
///
/// Unrecognized values are kept in [`TaskStatus::Other`] and are never terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Accepted but not yet started
    Queued,
    /// Conversion in progress
    Processing,
    /// Artifact ready for download
    Completed,
    /// Conversion failed; see the task message
    Failed,
    /// Any other value the service may send
    Other(String),
}

impl TaskStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => TaskStatus::Queued,
            "processing" => TaskStatus::Processing,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status record of a conversion task, as returned by `GET /api/task/{id}/`
///
/// Each poll replaces the previous record wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Current status
    pub status: TaskStatus,
    /// Progress percentage (0-100, not verified by the client)
    #[serde(default)]
    pub progress: u32,
    /// Service message, populated on failure
    #[serde(default)]
    pub message: Option<String>,
    /// Task identifier echoed by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Name of the produced file, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}

impl TaskSnapshot {
    /// Create a snapshot with only status and progress set
    pub fn new(status: TaskStatus, progress: u32) -> Self {
        Self {
            status,
            progress,
            message: None,
            task_id: None,
            output_filename: None,
        }
    }

    /// Progress clamped to a displayable percentage
    pub fn percent(&self) -> u8 {
        self.progress.min(100) as u8
    }

    /// The service message, treating an empty string as absent
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Successful response body of `POST /api/upload/`
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) task_id: TaskId,
}

/// Structured error body returned by the service on non-2xx responses
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ServiceErrorBody {
    pub(crate) error: String,
}

/// A file chosen by the user for conversion
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name including extension
    pub name: String,
    /// Raw file content
    pub content: Vec<u8>,
}

impl SelectedFile {
    /// Create a new SelectedFile
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, using its final path component as the name
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("'{}' has no usable file name", path.display()),
                )
            })?
            .to_string();
        let content = tokio::fs::read(path).await?;
        Ok(Self { name, content })
    }

    /// Size of the content in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

// Content is omitted so logging a file never dumps the document.
impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .finish()
    }
}

/// A converted document retrieved from the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact bytes
    pub bytes: Vec<u8>,
    /// Suggested file name
    pub filename: String,
    /// Declared media type
    pub media_type: String,
}

impl Artifact {
    /// Create a PDF artifact
    pub fn pdf(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            media_type: PDF_MEDIA_TYPE.to_string(),
        }
    }
}

/// Where an artifact ended up after the save collaborator handled it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedArtifact {
    /// Name the artifact was saved under
    pub filename: String,
    /// Location on disk, when the saver writes to the filesystem
    pub path: Option<std::path::PathBuf>,
    /// Number of bytes saved
    pub size_bytes: u64,
}

/// Event emitted to presentation subscribers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Progress update
    Progress {
        /// Progress percentage (0 to 100)
        percent: u8,
        /// Status line
        message: String,
    },

    /// Error to show to the user
    Error {
        /// Error message
        message: String,
    },

    /// Success notice
    Success {
        /// Success message
        message: String,
    },

    /// Start action enabled or disabled
    Ready {
        /// Whether a conversion can be started
        ready: bool,
    },

    /// Download action shown or hidden
    DownloadAvailable {
        /// Whether the artifact can be downloaded
        available: bool,
    },
}
