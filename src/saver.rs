//! Save collaborator: hands a retrieved artifact to the host environment.

use crate::config::{FileCollisionAction, SaveConfig};
use crate::error::Result;
use crate::types::{Artifact, SavedArtifact};
use crate::utils::{get_unique_path, safe_file_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Host mechanism that persists or exports a downloaded artifact
#[async_trait]
pub trait ArtifactSaver: Send + Sync {
    /// Save the artifact under (a variant of) its suggested filename
    async fn save(&self, artifact: &Artifact) -> Result<SavedArtifact>;
}

/// Saver that writes artifacts into a directory
///
/// The suggested filename is reduced to its final path component before use,
/// and collisions are resolved with the configured [`FileCollisionAction`].
#[derive(Clone, Debug)]
pub struct DirectorySaver {
    dir: PathBuf,
    collision: FileCollisionAction,
}

impl DirectorySaver {
    /// Create a saver for `dir`
    pub fn new(dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            dir: dir.into(),
            collision,
        }
    }

    /// Create a saver from the save section of the configuration
    pub fn from_config(config: &SaveConfig) -> Self {
        Self::new(config.output_dir.clone(), config.file_collision)
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSaver for DirectorySaver {
    async fn save(&self, artifact: &Artifact) -> Result<SavedArtifact> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory '{}': {}",
                    self.dir.display(),
                    e
                ),
            )
        })?;

        let filename = safe_file_name(&artifact.filename);
        let path = get_unique_path(&self.dir.join(&filename), self.collision)?;

        tokio::fs::write(&path, &artifact.bytes).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to write '{}': {}", path.display(), e),
            )
        })?;

        let saved_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or(filename);

        tracing::info!(
            path = %path.display(),
            size_bytes = artifact.bytes.len(),
            "artifact saved"
        );

        Ok(SavedArtifact {
            filename: saved_name,
            path: Some(path),
            size_bytes: artifact.bytes.len() as u64,
        })
    }
}
