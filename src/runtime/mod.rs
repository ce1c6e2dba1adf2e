//! Child process plumbing for the external tools ms drives

pub mod process;

pub use process::{Completion, ProcessConfig};
