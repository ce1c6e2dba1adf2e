//! Container management module
//!
//! Operations that act on every container of the local docker host rather
//! than on the aggregate compose file.

pub mod config;
pub mod lifecycle;

pub use config::{ContainerStatus, ContainerSummary};
pub use lifecycle::ContainerManager;
