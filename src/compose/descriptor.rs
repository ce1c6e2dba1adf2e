//! Aggregate docker-compose descriptor

use crate::error::{MsError, Result};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// docker-compose file format written to the aggregate file
pub const DESCRIPTOR_VERSION: &str = "2";

/// `extends` pointer back into a directory's fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extends {
    /// Fragment file path
    pub file: PathBuf,
    /// Subservice name inside the fragment
    pub service: String,
}

/// One service of the aggregate file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateEntry {
    pub extends: Extends,
    /// Lines from the directory's .env.local
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Vec<String>>,
    /// Directory the entry was produced from
    #[serde(skip)]
    pub directory: String,
}

/// Services keyed by final name, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateDescriptor {
    entries: Vec<(String, AggregateEntry)>,
}

impl AggregateDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AggregateEntry> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add an entry under `name`.
    ///
    /// A name already produced by another directory is a collision. A name
    /// produced twice by the same directory keeps its position and takes the
    /// later entry.
    pub fn insert(&mut self, name: String, entry: AggregateEntry) -> Result<()> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, current)) if current.directory != entry.directory => {
                Err(MsError::NameCollision {
                    name,
                    first: current.directory.clone(),
                    second: entry.directory,
                })
            }
            Some((_, current)) => {
                tracing::warn!(
                    "[{}] declares more than one service named {}, keeping {}",
                    entry.directory,
                    name,
                    entry.extends.service
                );
                *current = entry;
                Ok(())
            }
            None => {
                self.entries.push((name, entry));
                Ok(())
            }
        }
    }

    /// Final service names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregateEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

struct Services<'a>(&'a [(String, AggregateEntry)]);

impl Serialize for Services<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entry) in self.0 {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

impl Serialize for AggregateDescriptor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("AggregateDescriptor", 2)?;
        state.serialize_field("version", DESCRIPTOR_VERSION)?;
        state.serialize_field("services", &Services(&self.entries))?;
        state.end()
    }
}
