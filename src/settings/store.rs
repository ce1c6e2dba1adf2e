//! On-disk settings file

use super::config::Settings;
use crate::error::{MsError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Settings file name inside the home directory
pub const SETTINGS_FILE: &str = ".ms";

/// Environment variable overriding the settings file location
pub const SETTINGS_PATH_ENV: &str = "MS_CONFIG";

/// JSON settings file, created empty on first read
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `$MS_CONFIG`, or `~/.ms`
    pub fn open_default() -> Result<Self> {
        if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Ok(Self::new(PathBuf::from(path)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            MsError::InvalidConfig("could not determine the home directory".to_string())
        })?;

        Ok(Self::new(home.join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load typed settings
    pub fn load(&self) -> Result<Settings> {
        Settings::from_value(Value::Object(self.read()?))
    }

    /// Raw value of a single key
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.remove(key))
    }

    /// Set a key and write the file back, keeping every other key
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut data = self.read()?;
        data.insert(key.to_string(), value);
        self.write(&data)
    }

    /// Read the raw object
    ///
    /// A missing file is created empty. Content that is not a JSON object is
    /// reported and treated as empty.
    pub fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            tracing::debug!("Creating empty settings file at {}", self.path.display());
            std::fs::write(&self.path, "")?;
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                tracing::error!(
                    "Error loading config file {}: not a JSON object",
                    self.path.display()
                );
                Ok(Map::new())
            }
            Err(e) => {
                tracing::error!("Error loading config file {}: {}", self.path.display(), e);
                Ok(Map::new())
            }
        }
    }

    fn write(&self, data: &Map<String, Value>) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut serializer)?;
        buf.push(b'\n');

        std::fs::write(&self.path, buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_created_empty() {
        let temp = tempdir().unwrap();
        let store = SettingsStore::new(temp.path().join(".ms"));

        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(store.path().exists());
    }

    #[test]
    fn test_set_preserves_other_keys() {
        let temp = tempdir().unwrap();
        let store = SettingsStore::new(temp.path().join(".ms"));

        store.set("PLUGINS", json!(["ms_extra"])).unwrap();
        store.set("BASE_DIR", json!("/srv/code")).unwrap();

        assert_eq!(store.get("PLUGINS").unwrap(), Some(json!(["ms_extra"])));
        assert_eq!(
            store.load().unwrap().base_dir,
            Some(PathBuf::from("/srv/code"))
        );

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.ends_with("}\n"));
        assert!(content.contains("    \"BASE_DIR\""));
    }

    #[test]
    fn test_invalid_json_treated_as_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".ms");
        std::fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path);
        assert!(store.read().unwrap().is_empty());
    }
}
