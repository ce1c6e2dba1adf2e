//! The materialized aggregate file and its retention policy

use crate::error::{MsError, Result};
use crate::settings::Settings;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Default aggregate file name inside the base directory
pub const DEFAULT_ARTIFACT_FILE: &str = "docker-compose-tmp.yml";

/// Whether the aggregate file should go once a lifecycle command finishes
pub fn should_remove(keep_requested: bool, settings: &Settings) -> bool {
    !keep_requested && !settings.keep_docker_compose_file_on_shutdown
}

/// Aggregate docker-compose file on disk
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A present file means a stack is currently running
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the file atomically
    ///
    /// The content goes to a sibling temporary file which is then renamed
    /// over the target, so readers see either the old or the new file.
    pub fn write(&self, contents: &str) -> Result<()> {
        let temp = self.temp_path();
        let write_error = |source| MsError::ArtifactWrite {
            path: self.path.clone(),
            source,
        };

        if let Err(e) = std::fs::write(&temp, contents) {
            let _ = std::fs::remove_file(&temp);
            return Err(write_error(e));
        }

        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(write_error(e));
        }

        tracing::debug!("Wrote {}", self.path.display());
        Ok(())
    }

    pub fn contents(&self) -> Result<String> {
        if !self.exists() {
            return Err(MsError::ArtifactMissing(self.path.clone()));
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Delete the file. Returns false when there was nothing to delete.
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply the retention policy after a lifecycle command
    pub fn remove_unless_kept(&self, keep_requested: bool, settings: &Settings) -> Result<()> {
        if should_remove(keep_requested, settings) {
            self.remove()?;
        } else {
            tracing::info!("Keeping {}", self.path.display());
        }
        Ok(())
    }

    /// Await `work`, then apply the retention policy whether it succeeded or not.
    ///
    /// An error from `work` takes precedence over one from the removal.
    pub async fn cleanup_after<T, F>(
        &self,
        keep_requested: bool,
        settings: &Settings,
        work: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let outcome = work.await;
        let removed = self.remove_unless_kept(keep_requested, settings);
        let value = outcome?;
        removed?;
        Ok(value)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_ARTIFACT_FILE.to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}
