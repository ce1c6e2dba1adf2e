//! Persisted user settings
//!
//! ms keeps a single JSON object in the user's home directory. It is read
//! once at startup into a [`Settings`] value which is then passed by
//! reference to everything that needs it.

pub mod config;
pub mod store;

pub use config::Settings;
pub use store::SettingsStore;
