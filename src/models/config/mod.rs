//! Configuration loading and validation.
//!
//! The watcher reads a single JSON or YAML file describing the safes to watch,
//! the signer aliases and the notification targets.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::path::Path;

mod error;
mod watcher_config;

pub use error::ConfigError;
pub use watcher_config::{SafeEntry, WatcherConfig};

/// Common interface for loading configuration files
#[async_trait]
pub trait ConfigLoader: Sized {
	/// Load configuration from a specific file path, resolving secrets and validating it
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Validate the configuration
	fn validate(&self) -> Result<(), ConfigError>;

	/// Logs warnings for settings that are accepted but probably unintended
	fn validate_protocol(&self);

	/// Resolve all secrets in the configuration
	async fn resolve_secrets(&self) -> Result<Self, ConfigError>;

	/// Check if a file is a JSON file based on extension
	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}

	/// Check if a file is a YAML file based on extension
	fn is_yaml_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| {
				let ext = ext.to_string_lossy().to_lowercase();
				ext == "yaml" || ext == "yml"
			})
			.unwrap_or(false)
	}
}
