//! Error types for docconv
//!
//! Every failure of a conversion attempt falls into one of four domain kinds:
//! - [`Error::Validation`] - the selected file was rejected locally (never reaches the network)
//! - [`Error::Submission`] - the upload was rejected or the service was unreachable
//! - [`Error::TaskFailure`] - the service reported a failed task, or a status poll failed
//! - [`Error::Retrieval`] - the artifact download was rejected or unreachable
//!
//! The remaining variants cover misconfiguration and misuse of the session API.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docconv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docconv
#[derive(Debug, Error)]
pub enum Error {
    /// The selected file is not an acceptable document
    #[error("validation error: {0}")]
    Validation(String),

    /// The upload was rejected by the service or could not be sent
    #[error("submission error: {0}")]
    Submission(String),

    /// The service reported the task as failed, or polling could not reach it
    #[error("task failure: {0}")]
    TaskFailure(String),

    /// The converted artifact could not be downloaded or saved
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Operation not allowed in the session's current phase
    #[error("cannot {operation} while session is {phase}")]
    InvalidState {
        /// The operation that was attempted (e.g., "start conversion")
        operation: String,
        /// The phase that prevents the operation (e.g., "converting")
        phase: String,
    },

    /// The cleanup request could not be completed
    #[error("cleanup failed: {0}")]
    Cleanup(String),

    /// A file already exists where an artifact was about to be written
    #[error("file collision at {path}: {reason}")]
    FileCollision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable error code
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Submission(_) => "submission_error",
            Error::TaskFailure(_) => "task_failure",
            Error::Retrieval(_) => "retrieval_error",
            Error::Config { .. } => "config_error",
            Error::InvalidState { .. } => "invalid_state",
            Error::Cleanup(_) => "cleanup_error",
            Error::FileCollision { .. } => "file_collision",
            Error::Io(_) => "io_error",
        }
    }

    /// The text shown to the user through the presentation sink.
    ///
    /// Domain errors carry the service's (or validator's) message verbatim,
    /// without the variant prefix used by `Display`.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg)
            | Error::Submission(msg)
            | Error::TaskFailure(msg)
            | Error::Retrieval(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error ends the current attempt and returns the session to "ready".
    ///
    /// Validation errors block locally and never start an attempt, so they are excluded.
    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            Error::Submission(_) | Error::TaskFailure(_) | Error::Retrieval(_)
        )
    }

    pub(crate) fn invalid_state(operation: &str, phase: impl std::fmt::Display) -> Self {
        Error::InvalidState {
            operation: operation.to_string(),
            phase: phase.to_string(),
        }
    }
}
