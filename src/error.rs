//! Error types for ms

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ms operations
pub type Result<T> = std::result::Result<T, MsError>;

/// ms error types
#[derive(Error, Debug)]
pub enum MsError {
    #[error("Could not find service [{0}] folder in the root directory")]
    DirectoryNotFound(String),

    #[error("Could not find docker-compose.yml file in [{0}] service directory")]
    FragmentMissing(String),

    #[error("Failed to parse {path}: {message}")]
    FragmentParse { path: PathBuf, message: String },

    #[error("Service name [{name}] is produced by both [{first}] and [{second}]")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Failed to write {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No microservices docker-compose file found at {0}")]
    ArtifactMissing(PathBuf),

    #[error("{program} exited with status {code}")]
    ExternalTool { program: String, code: i32 },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
