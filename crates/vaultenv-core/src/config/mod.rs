//! Deployment configuration loading and management

mod loader;

pub use loader::{DeployConfig, CONFIG_FILE_NAMES};
