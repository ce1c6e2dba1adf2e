//! Per-directory docker-compose fragments

use crate::error::{MsError, Result};
use std::path::{Path, PathBuf};

/// Fragment file every service directory must contain
pub const FRAGMENT_FILE: &str = "docker-compose.yml";

/// Optional environment override file
pub const OVERRIDE_FILE: &str = ".env.local";

const COMMENT_MARKER: char = '#';

/// Environment lines attached to every non-singleton entry of a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrideBlock(Vec<String>);

impl EnvOverrideBlock {
    /// Keep non-blank, non-comment lines in order. Lines are not interpreted.
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with(COMMENT_MARKER))
            .map(|line| line.trim().to_string())
            .collect();

        Self(lines)
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Services declared by one directory
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Directory identifier under the base path
    pub directory: String,
    /// Path of the directory's docker-compose.yml
    pub path: PathBuf,
    /// Subservice names in declaration order
    pub services: Vec<String>,
    /// Parsed .env.local, if present
    pub env_override: Option<EnvOverrideBlock>,
}

/// Reads fragments from service directories under a base path
#[derive(Debug, Clone)]
pub struct FragmentLoader {
    base_dir: PathBuf,
}

impl FragmentLoader {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn directory(&self, id: &str) -> PathBuf {
        self.base_dir.join(id)
    }

    /// Check that `id` is a service directory and return its fragment path
    pub fn validate(&self, id: &str) -> Result<PathBuf> {
        if !is_plain_name(id) || !self.directory(id).is_dir() {
            return Err(MsError::DirectoryNotFound(id.to_string()));
        }

        let fragment = self.directory(id).join(FRAGMENT_FILE);
        if !fragment.is_file() {
            return Err(MsError::FragmentMissing(id.to_string()));
        }

        Ok(fragment)
    }

    /// Validate and read one directory
    pub fn load(&self, id: &str) -> Result<Fragment> {
        let path = self.validate(id)?;
        let content = std::fs::read_to_string(&path)?;
        let services = parse_services(&path, &content)?;

        let override_path = self.directory(id).join(OVERRIDE_FILE);
        let env_override = if override_path.is_file() {
            let block = EnvOverrideBlock::parse(&std::fs::read_to_string(&override_path)?);
            tracing::debug!("[{}] using {} environment overrides", id, block.lines().len());
            Some(block)
        } else {
            None
        };

        Ok(Fragment {
            directory: id.to_string(),
            path,
            services,
            env_override,
        })
    }

    /// Every directory under the base path that holds a fragment, sorted
    pub fn discover(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();

        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if !entry.path().join(FRAGMENT_FILE).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                found.push(name.to_string());
            }
        }

        found.sort();
        Ok(found)
    }
}

/// Names under the top-level `services` key, in file order
pub fn parse_services(path: &Path, content: &str) -> Result<Vec<String>> {
    let parse_error = |message: String| MsError::FragmentParse {
        path: path.to_path_buf(),
        message,
    };

    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;

    let services = document
        .get("services")
        .and_then(serde_yaml::Value::as_mapping)
        .ok_or_else(|| parse_error("missing top-level services mapping".to_string()))?;

    services
        .keys()
        .map(|key| {
            key.as_str()
                .map(str::to_string)
                .ok_or_else(|| parse_error(format!("service name {:?} is not a string", key)))
        })
        .collect()
}

fn is_plain_name(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_service(base: &Path, name: &str, compose: &str) {
        std::fs::create_dir_all(base.join(name)).unwrap();
        std::fs::write(base.join(name).join(FRAGMENT_FILE), compose).unwrap();
    }

    #[test]
    fn test_parse_services_keeps_order() {
        let yaml = r#"
version: "2"
services:
  worker:
    build: .
  web:
    build: .
  haproxy:
    image: haproxy
"#;
        let services = parse_services(Path::new("docker-compose.yml"), yaml).unwrap();
        assert_eq!(services, vec!["worker", "web", "haproxy"]);
    }

    #[test]
    fn test_parse_services_requires_mapping() {
        let result = parse_services(Path::new("docker-compose.yml"), "version: '2'\n");
        assert!(matches!(result, Err(MsError::FragmentParse { .. })));
    }

    #[test]
    fn test_env_override_strips_comments_and_blanks() {
        let block = EnvOverrideBlock::parse("# local\nDEBUG=1\n\n  \nAPI_URL=http://x\n#OFF=1\nnot a pair\n");
        assert_eq!(block.lines(), &["DEBUG=1", "API_URL=http://x", "not a pair"]);
    }

    #[test]
    fn test_load_missing_directory() {
        let temp = tempdir().unwrap();
        let loader = FragmentLoader::new(temp.path().to_path_buf());

        assert!(matches!(
            loader.load("nope"),
            Err(MsError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            loader.load("../etc"),
            Err(MsError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_load_missing_fragment() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();
        let loader = FragmentLoader::new(temp.path().to_path_buf());

        assert!(matches!(loader.load("docs"), Err(MsError::FragmentMissing(_))));
    }

    #[test]
    fn test_load_with_override() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "api", "services:\n  web: {}\n  worker: {}\n");
        std::fs::write(temp.path().join("api").join(OVERRIDE_FILE), "A=1\n").unwrap();

        let loader = FragmentLoader::new(temp.path().to_path_buf());
        let fragment = loader.load("api").unwrap();

        assert_eq!(fragment.services, vec!["web", "worker"]);
        assert_eq!(fragment.path, temp.path().join("api").join(FRAGMENT_FILE));
        assert_eq!(fragment.env_override.unwrap().lines(), &["A=1"]);
    }

    #[test]
    fn test_discover_only_service_directories() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "billing", "services:\n  web: {}\n");
        write_service(temp.path(), "api", "services:\n  web: {}\n");
        std::fs::create_dir(temp.path().join("notes")).unwrap();
        std::fs::write(temp.path().join("README.md"), "hi").unwrap();

        let loader = FragmentLoader::new(temp.path().to_path_buf());
        assert_eq!(loader.discover().unwrap(), vec!["api", "billing"]);
    }
}
