//! External process execution
//!
//! Every call out to docker-compose, docker or git goes through
//! [`ProcessConfig`]. Children inherit the terminal unless their output is
//! captured.

use crate::error::{MsError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Command line and environment for a child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
}

impl ProcessConfig {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Printable command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).envs(&self.env);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> MsError {
        MsError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

/// How a blocking invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The child exited by itself
    Exited(ExitStatus),
    /// Ctrl+C arrived first; the child was left to handle it
    Interrupted,
}

impl Completion {
    pub fn success(&self) -> bool {
        matches!(self, Completion::Exited(status) if status.success())
    }
}

/// Run to completion with inherited stdio
pub async fn status(config: &ProcessConfig) -> Result<ExitStatus> {
    tracing::debug!("Running {}", config.command_line());
    config
        .command()
        .status()
        .await
        .map_err(|e| config.spawn_error(e))
}

/// Run and fail on a non-zero exit
pub async fn checked(config: &ProcessConfig) -> Result<()> {
    let exit = status(config).await?;
    ensure_success(&config.program, exit)
}

/// Run and capture stdout
pub async fn output(config: &ProcessConfig) -> Result<String> {
    tracing::debug!("Running {}", config.command_line());
    let output = config
        .command()
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .await
        .map_err(|e| config.spawn_error(e))?;

    ensure_success(&config.program, output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run with inherited stdio until the child exits or Ctrl+C arrives
pub async fn interruptible(config: &ProcessConfig) -> Result<Completion> {
    tracing::debug!("Running {}", config.command_line());
    let mut child = config
        .command()
        .spawn()
        .map_err(|e| config.spawn_error(e))?;

    tokio::select! {
        exit = child.wait() => Ok(Completion::Exited(exit?)),
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted while running {}", config.program);
            Ok(Completion::Interrupted)
        }
    }
}

/// Map a non-zero exit to [`MsError::ExternalTool`]
pub fn ensure_success(program: &str, exit: ExitStatus) -> Result<()> {
    if exit.success() {
        Ok(())
    } else {
        Err(MsError::ExternalTool {
            program: program.to_string(),
            code: exit.code().unwrap_or(-1),
        })
    }
}
