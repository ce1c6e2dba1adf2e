//! Typed view of the persisted settings

use crate::compose::artifact::DEFAULT_ARTIFACT_FILE;
use crate::compose::names::{AliasTable, SingletonSet};
use crate::error::{MsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Settings consumed by the descriptor builder and the lifecycle commands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    /// Directory holding one sub-directory per service
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Directory name to preferred alias
    #[serde(default)]
    pub service_mapping: HashMap<String, String>,
    /// Group name to ordered member directories
    #[serde(default)]
    pub service_constellations: HashMap<String, Vec<String>>,
    /// Subservices materialized at most once across the whole stack
    #[serde(default)]
    pub singleton_services: Vec<String>,
    /// Where the aggregate docker-compose file is written
    #[serde(default)]
    pub docker_compose_file: Option<PathBuf>,
    /// Never delete the aggregate file when a lifecycle command finishes
    #[serde(default)]
    pub keep_docker_compose_file_on_shutdown: bool,
}

impl Settings {
    /// Build settings from a raw JSON object
    ///
    /// Falsy values (null, `false`, zero, empty strings, arrays and objects)
    /// count as unset, the same way a missing key does.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let object = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(MsError::InvalidConfig(format!(
                    "expected a JSON object, found {}",
                    other
                )))
            }
        };

        let cleaned: serde_json::Map<String, serde_json::Value> = object
            .into_iter()
            .filter(|(_, v)| !is_unset(v))
            .collect();

        serde_json::from_value(serde_json::Value::Object(cleaned))
            .map_err(|e| MsError::InvalidConfig(e.to_string()))
    }

    /// Absolute base directory
    pub fn base_dir(&self) -> Result<PathBuf> {
        let dir = self
            .base_dir
            .as_deref()
            .ok_or_else(|| MsError::InvalidConfig("BASE_DIR is not set".to_string()))?;

        Ok(std::path::absolute(dir)?)
    }

    /// Path of the aggregate docker-compose file
    pub fn artifact_path(&self) -> Result<PathBuf> {
        match &self.docker_compose_file {
            Some(path) => Ok(std::path::absolute(path)?),
            None => Ok(self.base_dir()?.join(DEFAULT_ARTIFACT_FILE)),
        }
    }

    pub fn alias_table(&self) -> AliasTable {
        AliasTable::from(self.service_mapping.clone())
    }

    pub fn singleton_set(&self) -> SingletonSet {
        self.singleton_services.iter().cloned().collect()
    }

    /// Settings rooted at `base_dir` with nothing else configured
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            base_dir: Some(base_dir.to_path_buf()),
            ..Default::default()
        }
    }
}

fn is_unset(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_all_keys() {
        let value = json!({
            "BASE_DIR": "/srv/code",
            "SERVICE_MAPPING": {"billing-service": "billing"},
            "SERVICE_CONSTELLATIONS": {"teams": ["api", "billing-service"]},
            "SINGLETON_SERVICES": ["haproxy"],
            "KEEP_DOCKER_COMPOSE_FILE_ON_SHUTDOWN": true,
            "PLUGINS": ["ignored"]
        });

        let settings = Settings::from_value(value).unwrap();
        assert_eq!(settings.base_dir, Some(PathBuf::from("/srv/code")));
        assert_eq!(settings.service_mapping["billing-service"], "billing");
        assert_eq!(settings.service_constellations["teams"].len(), 2);
        assert_eq!(settings.singleton_services, vec!["haproxy".to_string()]);
        assert!(settings.keep_docker_compose_file_on_shutdown);
    }

    #[test]
    fn test_default_artifact_path() {
        let settings = Settings::with_base_dir(Path::new("/srv/code"));
        assert_eq!(
            settings.artifact_path().unwrap(),
            PathBuf::from("/srv/code/docker-compose-tmp.yml")
        );
    }

    #[test]
    fn test_explicit_artifact_path_wins() {
        let settings = Settings::from_value(json!({
            "BASE_DIR": "/srv/code",
            "DOCKER_COMPOSE_FILE": "/tmp/stack.yml"
        }))
        .unwrap();
        assert_eq!(
            settings.artifact_path().unwrap(),
            PathBuf::from("/tmp/stack.yml")
        );
    }

    #[test]
    fn test_empty_base_dir_is_unset() {
        let settings = Settings::from_value(json!({"BASE_DIR": ""})).unwrap();
        assert!(matches!(
            settings.base_dir(),
            Err(MsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_falsy_values_are_unset() {
        let settings = Settings::from_value(json!({
            "BASE_DIR": "/srv/code",
            "SINGLETON_SERVICES": {},
            "SERVICE_CONSTELLATIONS": [],
            "SERVICE_MAPPING": 0,
            "KEEP_DOCKER_COMPOSE_FILE_ON_SHUTDOWN": false
        }))
        .unwrap();

        assert!(settings.singleton_services.is_empty());
        assert!(settings.service_constellations.is_empty());
        assert!(settings.service_mapping.is_empty());
        assert!(!settings.keep_docker_compose_file_on_shutdown);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Settings::from_value(json!([1, 2])).is_err());
    }
}
