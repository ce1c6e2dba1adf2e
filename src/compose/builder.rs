//! Aggregate descriptor construction
//!
//! Every requested directory is validated and read before anything is
//! merged, and the merged descriptor is only written once it is complete.
//! A bad directory therefore never leaves a half-built aggregate file behind.

use super::artifact::Artifact;
use super::descriptor::{AggregateDescriptor, AggregateEntry, Extends};
use super::fragment::{Fragment, FragmentLoader};
use super::groups::GroupExpander;
use super::names::{NameResolver, Resolution, WEB_SERVICE};
use crate::error::Result;
use crate::settings::Settings;

/// Services a lifecycle command acts on once `--ignore` is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Nothing ignored: the whole aggregate file
    All,
    /// Built names minus the ignored ones
    Only(Vec<String>),
    /// Every built name was ignored
    Nothing,
}

impl Targets {
    /// Filter the built `names` by `ignore`, keeping their order
    pub fn select(names: Vec<String>, ignore: &[String]) -> Self {
        if ignore.is_empty() {
            return Targets::All;
        }

        let remaining: Vec<String> = names
            .into_iter()
            .filter(|name| !ignore.contains(name))
            .collect();

        if remaining.is_empty() {
            Targets::Nothing
        } else {
            Targets::Only(remaining)
        }
    }
}

/// Builds the aggregate docker-compose file from service directories
pub struct DescriptorBuilder {
    loader: FragmentLoader,
    resolver: NameResolver,
    groups: GroupExpander,
    artifact: Artifact,
}

impl DescriptorBuilder {
    /// Builder configured from settings; requires `BASE_DIR`
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::from_parts(
            FragmentLoader::new(settings.base_dir()?),
            NameResolver::new(settings.alias_table(), settings.singleton_set()),
            GroupExpander::new(settings.service_constellations.clone()),
            Artifact::new(settings.artifact_path()?),
        ))
    }

    pub fn from_parts(
        loader: FragmentLoader,
        resolver: NameResolver,
        groups: GroupExpander,
        artifact: Artifact,
    ) -> Self {
        Self {
            loader,
            resolver,
            groups,
            artifact,
        }
    }

    pub fn loader(&self) -> &FragmentLoader {
        &self.loader
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Turn a command-line request into directory identifiers.
    ///
    /// No request means every service directory; a single constellation name
    /// is expanded.
    pub fn resolve_directories(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            let all = self.loader.discover()?;
            tracing::debug!("No services requested, using {:?}", all);
            return Ok(all);
        }

        Ok(self.groups.expand(requested))
    }

    /// Validate every directory in order; the first failure wins
    pub fn validate(&self, directories: &[String]) -> Result<()> {
        for directory in directories {
            self.loader.validate(directory)?;
        }
        Ok(())
    }

    /// Merge the fragments of `directories` without touching the disk
    pub fn assemble(&self, directories: &[String]) -> Result<AggregateDescriptor> {
        self.validate(directories)?;

        let fragments = directories
            .iter()
            .map(|directory| self.loader.load(directory))
            .collect::<Result<Vec<Fragment>>>()?;

        let mut descriptor = AggregateDescriptor::new();

        for fragment in &fragments {
            for subservice in &fragment.services {
                let (name, environment) =
                    match self.resolver.resolve(&fragment.directory, subservice) {
                        Resolution::Singleton if descriptor.contains(subservice) => {
                            tracing::debug!(
                                "[{}] {} already provided, skipping",
                                fragment.directory,
                                subservice
                            );
                            continue;
                        }
                        Resolution::Singleton => (subservice.clone(), None),
                        Resolution::Named(name) => (
                            name,
                            fragment
                                .env_override
                                .as_ref()
                                .map(|block| block.lines().to_vec()),
                        ),
                    };

                descriptor.insert(
                    name,
                    AggregateEntry {
                        extends: Extends {
                            file: fragment.path.clone(),
                            service: subservice.clone(),
                        },
                        environment,
                        directory: fragment.directory.clone(),
                    },
                )?;
            }
        }

        Ok(descriptor)
    }

    /// Assemble, write the aggregate file and return the final service names
    pub fn build(&self, directories: &[String]) -> Result<Vec<String>> {
        let descriptor = self.assemble(directories)?;
        self.artifact.write(&descriptor.to_yaml()?)?;

        let names = descriptor.names();
        tracing::debug!("Mapped services: {:?}", names);
        Ok(names)
    }

    /// [`resolve_directories`](Self::resolve_directories) followed by [`build`](Self::build)
    pub fn build_requested(&self, requested: &[String]) -> Result<Vec<String>> {
        let directories = self.resolve_directories(requested)?;
        tracing::debug!("Services: {:?}", directories);
        self.build(&directories)
    }

    /// Aggregate service to target for a one-off command in `directory`.
    ///
    /// An explicit subservice always wins. Otherwise a directory with a
    /// single non-shared service uses it, and anything else falls back to web.
    pub fn run_target(&self, directory: &str, subservice: Option<&str>, names: &[String]) -> String {
        if let Some(subservice) = subservice {
            return self.resolver.full_name(directory, subservice);
        }

        let own: Vec<&String> = names
            .iter()
            .filter(|name| !self.resolver.is_singleton(name))
            .collect();

        match own.as_slice() {
            [only] => only.to_string(),
            _ => self.resolver.full_name(directory, WEB_SERVICE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::fragment::{FRAGMENT_FILE, OVERRIDE_FILE};
    use crate::error::MsError;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_service(base: &Path, name: &str, services: &[&str]) {
        let mut yaml = String::from("version: '2'\nservices:\n");
        for service in services {
            yaml.push_str(&format!("  {}:\n    image: example/{}\n", service, service));
        }
        std::fs::create_dir_all(base.join(name)).unwrap();
        std::fs::write(base.join(name).join(FRAGMENT_FILE), yaml).unwrap();
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn builder(base: &Path, singletons: &[&str]) -> DescriptorBuilder {
        let mut settings = Settings::with_base_dir(base);
        settings.singleton_services = strings(singletons);
        DescriptorBuilder::new(&settings).unwrap()
    }

    #[test]
    fn test_singleton_taken_from_first_directory() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "api", &["web", "worker", "haproxy"]);
        write_service(temp.path(), "billing", &["web", "haproxy"]);

        let builder = builder(temp.path(), &["haproxy"]);
        let descriptor = builder.assemble(&strings(&["api", "billing"])).unwrap();

        assert_eq!(descriptor.names(), vec!["api", "api-worker", "haproxy", "billing"]);
        assert_eq!(
            descriptor.get("haproxy").unwrap().extends.file,
            temp.path().join("api").join(FRAGMENT_FILE)
        );
    }

    #[test]
    fn test_override_only_on_own_non_singleton_entries() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "api", &["web", "worker", "haproxy"]);
        write_service(temp.path(), "billing", &["web"]);
        std::fs::write(
            temp.path().join("api").join(OVERRIDE_FILE),
            "# dev\nDEBUG=1\n\nLOG=verbose\n",
        )
        .unwrap();

        let builder = builder(temp.path(), &["haproxy"]);
        let descriptor = builder.assemble(&strings(&["api", "billing"])).unwrap();

        let expected = Some(strings(&["DEBUG=1", "LOG=verbose"]));
        assert_eq!(descriptor.get("api").unwrap().environment, expected);
        assert_eq!(descriptor.get("api-worker").unwrap().environment, expected);
        assert_eq!(descriptor.get("haproxy").unwrap().environment, None);
        assert_eq!(descriptor.get("billing").unwrap().environment, None);
    }

    #[test]
    fn test_alias_collision_is_an_error() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "billing", &["web"]);
        write_service(temp.path(), "billing-v2", &["web"]);

        let mut settings = Settings::with_base_dir(temp.path());
        settings
            .service_mapping
            .insert("billing-v2".to_string(), "billing".to_string());
        let builder = DescriptorBuilder::new(&settings).unwrap();

        let result = builder.build(&strings(&["billing", "billing-v2"]));
        assert!(matches!(result, Err(MsError::NameCollision { .. })));
        assert!(!builder.artifact().exists());
    }

    #[test]
    fn test_failed_validation_leaves_artifact_untouched() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "api", &["web"]);

        let builder = builder(temp.path(), &[]);
        builder.artifact().write("previous").unwrap();

        let result = builder.build(&strings(&["api", "missing"]));
        assert!(matches!(result, Err(MsError::DirectoryNotFound(_))));
        assert_eq!(builder.artifact().contents().unwrap(), "previous");
    }

    #[test]
    fn test_empty_request_uses_every_directory() {
        let temp = tempdir().unwrap();
        write_service(temp.path(), "billing", &["web"]);
        write_service(temp.path(), "api", &["web"]);

        let builder = builder(temp.path(), &[]);
        assert_eq!(builder.build_requested(&[]).unwrap(), vec!["api", "billing"]);
        assert!(builder.artifact().exists());
    }

    #[test]
    fn test_validation_precedes_parsing() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("api")).unwrap();
        std::fs::write(temp.path().join("api").join(FRAGMENT_FILE), "services: [").unwrap();

        let builder = builder(temp.path(), &[]);
        let result = builder.assemble(&strings(&["api", "ghost"]));
        assert!(matches!(result, Err(MsError::DirectoryNotFound(d)) if d == "ghost"));
    }

    #[test]
    fn test_targets_nothing_ignored() {
        let names = strings(&["api", "api-worker", "haproxy"]);
        assert_eq!(Targets::select(names, &[]), Targets::All);
    }

    #[test]
    fn test_targets_some_ignored() {
        let names = strings(&["api", "api-worker", "haproxy"]);
        assert_eq!(
            Targets::select(names, &strings(&["api", "billing"])),
            Targets::Only(strings(&["api-worker", "haproxy"]))
        );
    }

    #[test]
    fn test_targets_everything_ignored() {
        let names = strings(&["api", "api-worker"]);
        assert_eq!(
            Targets::select(names, &strings(&["api-worker", "api"])),
            Targets::Nothing
        );
    }

    #[test]
    fn test_run_target() {
        let temp = tempdir().unwrap();
        let builder = builder(temp.path(), &["haproxy"]);

        assert_eq!(
            builder.run_target("api", Some("worker"), &strings(&["api", "api-worker"])),
            "api-worker"
        );
        assert_eq!(
            builder.run_target("cron", None, &strings(&["cron-beat", "haproxy"])),
            "cron-beat"
        );
        assert_eq!(
            builder.run_target("api", None, &strings(&["api", "api-worker", "haproxy"])),
            "api"
        );
    }
}
