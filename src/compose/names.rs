//! Aggregate service naming
//!
//! A subservice declared in a directory's fragment becomes `<alias>-<subservice>`
//! in the aggregate file, except for `web` and for subservices named like the
//! alias itself, which take the bare alias.

use std::collections::{HashMap, HashSet};

/// Subservice that never gets a suffix
pub const WEB_SERVICE: &str = "web";

/// Directory name to preferred alias
#[derive(Debug, Clone, Default)]
pub struct AliasTable(HashMap<String, String>);

impl AliasTable {
    /// Alias for `directory`, or the directory name itself
    pub fn alias<'a>(&'a self, directory: &'a str) -> &'a str {
        self.0.get(directory).map(String::as_str).unwrap_or(directory)
    }
}

impl From<HashMap<String, String>> for AliasTable {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Subservices shared by every directory, materialized once
#[derive(Debug, Clone, Default)]
pub struct SingletonSet(HashSet<String>);

impl SingletonSet {
    pub fn contains(&self, subservice: &str) -> bool {
        self.0.contains(subservice)
    }
}

impl FromIterator<String> for SingletonSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of resolving a (directory, subservice) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Shared subservice, keeps its own name and is deduplicated by the caller
    Singleton,
    /// Final aggregate service name
    Named(String),
}

/// Maps (directory, subservice) pairs to aggregate service names
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    aliases: AliasTable,
    singletons: SingletonSet,
}

impl NameResolver {
    pub fn new(aliases: AliasTable, singletons: SingletonSet) -> Self {
        Self {
            aliases,
            singletons,
        }
    }

    pub fn is_singleton(&self, subservice: &str) -> bool {
        self.singletons.contains(subservice)
    }

    pub fn resolve(&self, directory: &str, subservice: &str) -> Resolution {
        if self.is_singleton(subservice) {
            Resolution::Singleton
        } else {
            Resolution::Named(self.full_name(directory, subservice))
        }
    }

    /// Aliased name, ignoring the singleton set
    pub fn full_name(&self, directory: &str, subservice: &str) -> String {
        let alias = self.aliases.alias(directory);

        if subservice == WEB_SERVICE || alias == subservice {
            alias.to_string()
        } else {
            format!("{}-{}", alias, subservice)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> NameResolver {
        let mut mapping = HashMap::new();
        mapping.insert("billing-service".to_string(), "billing".to_string());
        mapping.insert("gateway-service".to_string(), "gateway".to_string());

        NameResolver::new(
            AliasTable::from(mapping),
            vec!["haproxy".to_string()].into_iter().collect(),
        )
    }

    #[test]
    fn test_web_takes_bare_alias() {
        assert_eq!(resolver().full_name("api", "web"), "api");
        assert_eq!(resolver().full_name("billing-service", "web"), "billing");
    }

    #[test]
    fn test_subservice_suffixed() {
        assert_eq!(resolver().full_name("api", "worker"), "api-worker");
        assert_eq!(
            resolver().full_name("billing-service", "worker"),
            "billing-worker"
        );
    }

    #[test]
    fn test_subservice_matching_alias_not_suffixed() {
        assert_eq!(resolver().full_name("gateway-service", "gateway"), "gateway");
        assert_eq!(resolver().full_name("gateway", "gateway"), "gateway");
    }

    #[test]
    fn test_singleton_detected() {
        assert_eq!(resolver().resolve("api", "haproxy"), Resolution::Singleton);
        assert_eq!(
            resolver().resolve("api", "worker"),
            Resolution::Named("api-worker".to_string())
        );
    }

    #[test]
    fn test_resolution_is_stable() {
        let resolver = resolver();
        let first = resolver.resolve("billing-service", "cron");
        let second = resolver.resolve("billing-service", "cron");
        assert_eq!(first, second);
    }
}
