//! Test helper utilities for the watcher configuration
//!
//! - `WatcherConfigBuilder`: Builder for creating test WatcherConfig instances

use std::collections::BTreeMap;

use crate::{
	models::{ApiMode, SafeEntry, SecretString, SecretValue, WatcherConfig},
	utils::{RetryConfig, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SAFE_URL},
};

/// Builder for creating test WatcherConfig instances
///
/// Starts without safes or notifiers; add safes with [`safe`](Self::safe).
pub struct WatcherConfigBuilder {
	config: WatcherConfig,
}

impl Default for WatcherConfigBuilder {
	fn default() -> Self {
		Self {
			config: WatcherConfig {
				safe_url: DEFAULT_SAFE_URL.to_string(),
				poll_interval: DEFAULT_POLL_INTERVAL_SECS,
				telegram_bot_token: None,
				telegram_channel_id: None,
				slack_bot_token: None,
				slack_channel_id: None,
				safe_addresses: Vec::new(),
				signers: BTreeMap::new(),
				api: ApiMode::default(),
				retry_policy: RetryConfig::default(),
			},
		}
	}
}

impl WatcherConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn safe(mut self, address: &str, alias: &str) -> Self {
		self.config.safe_addresses.push(SafeEntry {
			address: address.parse().expect("valid test address"),
			alias: alias.to_string(),
		});
		self
	}

	pub fn signer(mut self, address: &str, name: &str) -> Self {
		self.config
			.signers
			.insert(address.to_string(), name.to_string());
		self
	}

	pub fn poll_interval(mut self, seconds: u64) -> Self {
		self.config.poll_interval = seconds;
		self
	}

	pub fn api(mut self, api: ApiMode) -> Self {
		self.config.api = api;
		self
	}

	pub fn safe_url(mut self, url: &str) -> Self {
		self.config.safe_url = url.to_string();
		self
	}

	pub fn slack(mut self, token: &str, channel_id: &str) -> Self {
		self.config.slack_bot_token = Some(SecretValue::Plain(SecretString::new(token.to_string())));
		self.config.slack_channel_id = Some(channel_id.to_string());
		self
	}

	pub fn telegram(mut self, token: &str, channel_id: &str) -> Self {
		self.config.telegram_bot_token =
			Some(SecretValue::Plain(SecretString::new(token.to_string())));
		self.config.telegram_channel_id = Some(channel_id.to_string());
		self
	}

	pub fn retry_policy(mut self, retry_policy: RetryConfig) -> Self {
		self.config.retry_policy = retry_policy;
		self
	}

	pub fn build(self) -> WatcherConfig {
		self.config
	}
}
