//! Host-wide container operations through the docker CLI

use super::config::ContainerSummary;
use crate::error::Result;
use crate::runtime::process::{self, ProcessConfig};

/// docker executable
pub const DOCKER_PROGRAM: &str = "docker";

/// Lists, stops and kills containers on the local docker host
pub struct ContainerManager {
    program: String,
}

impl Default for ContainerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerManager {
    pub fn new() -> Self {
        Self {
            program: DOCKER_PROGRAM.to_string(),
        }
    }

    /// Use another executable in place of docker
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// IDs of every running container
    pub async fn running_ids(&self) -> Result<Vec<String>> {
        let output = process::output(&ProcessConfig::new(&self.program).args(["ps", "-q"])).await?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    /// Kill every running container, returning how many there were
    pub async fn kill_all(&self) -> Result<usize> {
        self.apply_to_running("kill").await
    }

    /// Stop every running container, returning how many there were
    pub async fn stop_all(&self) -> Result<usize> {
        self.apply_to_running("stop").await
    }

    /// Running containers, optionally filtered by name
    pub async fn list(&self, name_filter: Option<&str>) -> Result<Vec<ContainerSummary>> {
        let mut config = ProcessConfig::new(&self.program).args(["ps", "--format", "{{json .}}"]);
        if let Some(name) = name_filter {
            config = config.arg("--filter").arg(format!("name={}", name));
        }

        ContainerSummary::parse_lines(&process::output(&config).await?)
    }

    async fn apply_to_running(&self, subcommand: &str) -> Result<usize> {
        let ids = self.running_ids().await?;
        if ids.is_empty() {
            tracing::info!("No running containers");
            return Ok(0);
        }

        tracing::info!("Sending {} to {} container(s)", subcommand, ids.len());
        let config = ProcessConfig::new(&self.program)
            .arg(subcommand)
            .args(ids.iter().cloned());
        process::checked(&config).await?;

        Ok(ids.len())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_running_ids_splits_output() {
        // `echo ps -q` stands in for docker and prints its arguments back.
        let manager = ContainerManager::new().with_program("echo");
        assert_eq!(manager.running_ids().await.unwrap(), vec!["ps", "-q"]);
    }

    #[tokio::test]
    async fn test_kill_all_counts_containers() {
        let manager = ContainerManager::new().with_program("echo");
        assert_eq!(manager.kill_all().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_nothing_running() {
        let manager = ContainerManager::new().with_program("true");
        assert_eq!(manager.stop_all().await.unwrap(), 0);
    }
}
