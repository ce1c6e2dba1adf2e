//! Container summaries as reported by `docker ps`

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Container state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Container is created but not running
    Created,
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container is restarting
    Restarting,
    /// Container has exited
    Exited,
    /// Container is being removed
    Removing,
    /// Container is in an error state
    Dead,
    /// State docker reported that ms does not know
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Created => write!(f, "created"),
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Paused => write!(f, "paused"),
            ContainerStatus::Restarting => write!(f, "restarting"),
            ContainerStatus::Exited => write!(f, "exited"),
            ContainerStatus::Removing => write!(f, "removing"),
            ContainerStatus::Dead => write!(f, "dead"),
            ContainerStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One line of `docker ps --format '{{json .}}'`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    /// Short container ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Container names, comma separated
    pub names: String,
    /// Image name/tag
    pub image: String,
    /// Human readable status, e.g. "Up 3 minutes"
    #[serde(default)]
    pub status: String,
    /// Machine readable state
    #[serde(default = "unknown_state")]
    pub state: ContainerStatus,
    /// Published ports
    #[serde(default)]
    pub ports: String,
    /// Age, e.g. "2 hours ago"
    #[serde(default)]
    pub running_for: String,
}

fn unknown_state() -> ContainerStatus {
    ContainerStatus::Unknown
}

impl ContainerSummary {
    /// Parse newline separated JSON objects, skipping blank lines
    pub fn parse_lines(output: &str) -> Result<Vec<Self>> {
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str::<Self>(line)?))
            .collect()
    }
}
