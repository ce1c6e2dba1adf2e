//! ms - run a multi-repository microservice stack with docker-compose
//!
//! Every service lives in its own directory under a common base path, with
//! its own `docker-compose.yml`. ms merges the fragments of the requested
//! services into one aggregate compose file and runs docker-compose against
//! it:
//!
//! - Alias-based naming of the merged services
//! - Shared singleton services materialized once
//! - Named groups ("constellations") of services
//! - Per-directory `.env.local` environment overrides
//! - Lifecycle, log, pull and git helpers around the aggregate file

pub mod compose;
pub mod container;
pub mod error;
pub mod runtime;
pub mod settings;
pub mod vcs;

pub use error::{MsError, Result};
