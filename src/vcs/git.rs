//! git operations on a service checkout

use crate::error::{MsError, Result};
use crate::runtime::process::{self, ProcessConfig};
use std::path::{Path, PathBuf};

/// git executable
pub const GIT_PROGRAM: &str = "git";

/// Branch every service tracks for local development
pub const MAIN_BRANCH: &str = "master";

/// A service checkout driven through the git CLI
pub struct GitRepo {
    path: PathBuf,
    program: String,
}

impl GitRepo {
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            program: GIT_PROGRAM.to_string(),
        }
    }

    /// Use another executable in place of git
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command<I, S>(&self, args: I) -> ProcessConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessConfig::new(&self.program)
            .cwd(&self.path)
            .args(args)
    }

    pub async fn current_branch(&self) -> Result<String> {
        let output = process::output(&self.command(["rev-parse", "--abbrev-ref", "HEAD"])).await?;
        Ok(output.trim().to_string())
    }

    pub async fn checkout(&self, branch: &str) -> Result<()> {
        process::checked(&self.command(["checkout", branch])).await
    }

    pub async fn pull(&self) -> Result<()> {
        process::checked(&self.command(["pull", "origin"])).await
    }

    /// Switch to master and pull it.
    ///
    /// With `keep_branch`, a checkout that started elsewhere goes back to its
    /// original branch afterwards.
    pub async fn pull_master(&self, keep_branch: bool) -> Result<()> {
        let current = self.current_branch().await?;

        if current == MAIN_BRANCH {
            return self.pull().await;
        }

        let switched = async {
            self.checkout(MAIN_BRANCH).await?;
            self.pull().await?;
            if keep_branch {
                self.checkout(&current).await?;
            }
            Ok::<(), MsError>(())
        };

        switched.await.map_err(|e| {
            tracing::error!(
                "Could not checkout {} in {}, try checking in or stashing changes",
                MAIN_BRANCH,
                self.path.display()
            );
            e
        })
    }
}
