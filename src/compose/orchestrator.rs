//! docker-compose driver for the aggregate file

use super::builder::Targets;
use crate::error::Result;
use crate::runtime::process::{self, Completion, ProcessConfig};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// docker-compose executable
pub const COMPOSE_PROGRAM: &str = "docker-compose";

/// Read timeout handed to docker-compose, large enough for big stacks
pub const COMPOSE_HTTP_TIMEOUT: &str = "300";

/// Runs docker-compose subcommands against one compose file
pub struct ComposeOrchestrator {
    /// Executable to invoke
    program: String,
    /// Compose file passed with `-f`
    file: PathBuf,
}

impl ComposeOrchestrator {
    pub fn new(file: PathBuf) -> Self {
        Self {
            program: COMPOSE_PROGRAM.to_string(),
            file,
        }
    }

    /// Use another executable in place of docker-compose
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// `docker-compose -f <file> <args>`
    pub fn command<I, S>(&self, args: I) -> ProcessConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessConfig::new(&self.program)
            .arg("-f")
            .arg(self.file.to_string_lossy())
            .args(args)
            .env("COMPOSE_HTTP_TIMEOUT", COMPOSE_HTTP_TIMEOUT)
    }

    /// Start services in the foreground; no names means every service
    pub async fn up(&self, services: &[String]) -> Result<Completion> {
        tracing::info!("Starting {} service(s)", count_label(services));
        let completion = process::interruptible(&self.command(prefixed("up", services))).await?;
        warn_on_failure(&self.program, "up", completion);
        Ok(completion)
    }

    /// Stop and remove every service of the file
    pub async fn down(&self) -> Result<Completion> {
        tracing::info!("Bringing down {}", self.file.display());
        let completion = process::interruptible(&self.command(["down"])).await?;
        warn_on_failure(&self.program, "down", completion);
        Ok(completion)
    }

    /// `up` for the selected targets. Returns `None` when everything was ignored.
    pub async fn up_targets(&self, targets: &Targets) -> Result<Option<Completion>> {
        match targets {
            Targets::All => self.up(&[]).await.map(Some),
            Targets::Only(services) => self.up(services).await.map(Some),
            Targets::Nothing => {
                tracing::info!("Every service is ignored, nothing to start");
                Ok(None)
            }
        }
    }

    /// `down` for the whole file, or `stop` then `rm -f` for a subset
    pub async fn down_targets(&self, targets: &Targets) -> Result<Option<Completion>> {
        let services = match targets {
            Targets::All => return self.down().await.map(Some),
            Targets::Only(services) => services,
            Targets::Nothing => {
                tracing::info!("Every service is ignored, nothing to bring down");
                return Ok(None);
            }
        };

        let completion = self.stop(services).await?;
        if completion == Completion::Interrupted {
            tracing::info!("Interrupted, not removing containers");
        } else {
            self.remove(services).await?;
        }
        Ok(Some(completion))
    }

    pub async fn stop(&self, services: &[String]) -> Result<Completion> {
        let completion = process::interruptible(&self.command(prefixed("stop", services))).await?;
        warn_on_failure(&self.program, "stop", completion);
        Ok(completion)
    }

    /// Remove stopped containers of `services` without prompting
    pub async fn remove(&self, services: &[String]) -> Result<ExitStatus> {
        let mut args = vec!["rm".to_string(), "-f".to_string()];
        args.extend(services.iter().cloned());
        process::status(&self.command(args)).await
    }

    /// Pull images for every service concurrently.
    ///
    /// One child per service is started and all of them are awaited. A failed
    /// pull is reported and does not stop the others.
    pub async fn pull(&self, services: &[String]) -> Result<()> {
        tracing::info!("Pulling images for {} service(s)", services.len());

        let workers = services.iter().map(|service| {
            let config = self.command(["pull", service.as_str()]);
            async move { (service, process::status(&config).await) }
        });

        for (service, result) in futures::future::join_all(workers).await {
            match result {
                Ok(exit) if exit.success() => tracing::debug!("[{}] pulled", service),
                Ok(exit) => tracing::warn!("[{}] pull exited with {}", service, exit),
                Err(e) => tracing::warn!("[{}] pull failed: {}", service, e),
            }
        }

        Ok(())
    }

    pub async fn top(&self, services: &[String]) -> Result<ExitStatus> {
        process::status(&self.command(prefixed("top", services))).await
    }

    pub async fn logs(
        &self,
        services: &[String],
        follow: bool,
        tail: Option<usize>,
    ) -> Result<Completion> {
        let mut args = vec!["logs".to_string()];
        if follow {
            args.push("-f".to_string());
        }
        if let Some(lines) = tail {
            args.push("--tail".to_string());
            args.push(lines.to_string());
        }
        args.extend(services.iter().cloned());

        process::interruptible(&self.command(args)).await
    }

    /// Execute a command in a running service; non-zero exit is an error
    pub async fn exec(&self, service: &str, command: &[&str]) -> Result<()> {
        let mut args = vec!["exec".to_string(), service.to_string()];
        args.extend(command.iter().map(|s| s.to_string()));
        process::checked(&self.command(args)).await
    }

    pub async fn restart(&self, service: &str) -> Result<()> {
        tracing::info!("Restarting {}", service);
        process::checked(&self.command(["restart", service])).await
    }

    /// One-off container, removed when the command ends
    pub async fn run(&self, service: &str, command: &[String]) -> Result<ExitStatus> {
        let mut args = vec!["run".to_string(), "--rm".to_string(), service.to_string()];
        args.extend(command.iter().cloned());
        process::status(&self.command(args)).await
    }

    pub async fn kill(&self, service: &str) -> Result<ExitStatus> {
        process::status(&self.command(["kill", service])).await
    }
}

fn prefixed(subcommand: &str, services: &[String]) -> Vec<String> {
    std::iter::once(subcommand.to_string())
        .chain(services.iter().cloned())
        .collect()
}

fn count_label(services: &[String]) -> String {
    if services.is_empty() {
        "all".to_string()
    } else {
        services.len().to_string()
    }
}

fn warn_on_failure(program: &str, subcommand: &str, completion: Completion) {
    if let Completion::Exited(exit) = completion {
        if !exit.success() {
            tracing::warn!("{} {} exited with {}", program, subcommand, exit);
        }
    }
}
