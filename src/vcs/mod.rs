//! Version control for service directories

pub mod git;

pub use git::GitRepo;
