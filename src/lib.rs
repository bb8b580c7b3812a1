//! # docconv
//!
//! Client library for a document-to-PDF conversion service.
//!
//! The service converts Word documents asynchronously: an upload returns a task
//! identifier, the task is polled until it completes or fails, and the resulting PDF is
//! downloaded by identifier. docconv owns that lifecycle and renders it through a
//! [`PresentationSink`], so the same core drives a terminal, a GUI or an event stream.
//!
//! ## Design
//!
//! - **Explicit session** - all state for one conversion lives in a [`ConversionSession`]
//! - **Cancellable polling** - each poll loop is owned by a [`PollHandle`]; dropping it stops the loop
//! - **Pluggable edges** - the service, credential lookup, presentation and saving are traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use docconv::{Config, ConversionSession, CookieStore, EventSink, SelectedFile};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         base_url: "http://127.0.0.1:8000/".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let sink = Arc::new(EventSink::default());
//!     let mut events = sink.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let credentials = Arc::new(CookieStore::new("csrftoken=abc123"));
//!     let mut session = ConversionSession::from_config(&config, credentials, sink)?;
//!
//!     session.select_file(SelectedFile::from_path(Path::new("report.docx")).await?)?;
//!     session.convert().await?;
//!     let saved = session.request_download().await?;
//!     println!("saved {}", saved.filename);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Credential lookup for the anti-forgery token
pub mod credentials;
/// Error types
pub mod error;
/// Task status polling
pub mod poller;
/// Artifact saving
pub mod saver;
/// Conversion service client
pub mod service;
/// Conversion session orchestration
pub mod session;
/// Presentation sinks
pub mod sink;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Local file validation
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, FileCollisionAction, SaveConfig};
pub use credentials::{CookieStore, CredentialStore, NoCredentials};
pub use error::{Error, Result};
pub use poller::{PollHandle, PollOutcome, PollerConfig, PollerState, TaskPoller};
pub use saver::{ArtifactSaver, DirectorySaver};
pub use service::{ConversionService, HttpConversionService};
pub use session::{ConversionSession, SessionPhase};
pub use sink::{EventSink, NoopSink, PresentationSink};
pub use types::{
    Artifact, Event, SavedArtifact, SelectedFile, TaskId, TaskSnapshot, TaskStatus,
};
pub use validation::{Validation, validate_file, validate_file_name};
