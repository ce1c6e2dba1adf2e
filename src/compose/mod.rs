//! Aggregate docker-compose construction
//!
//! Each service directory carries its own `docker-compose.yml`. This module
//! merges the requested directories into one file whose services `extend`
//! the per-directory definitions, and drives docker-compose against it.

pub mod artifact;
pub mod builder;
pub mod descriptor;
pub mod fragment;
pub mod groups;
pub mod names;
pub mod orchestrator;

pub use artifact::Artifact;
pub use builder::{DescriptorBuilder, Targets};
pub use descriptor::{AggregateDescriptor, AggregateEntry, Extends};
pub use fragment::{EnvOverrideBlock, Fragment, FragmentLoader};
pub use groups::GroupExpander;
pub use names::{AliasTable, NameResolver, Resolution, SingletonSet};
pub use orchestrator::ComposeOrchestrator;
