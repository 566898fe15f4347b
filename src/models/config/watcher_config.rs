//! Watcher configuration file.
//!
//! ```yaml
//! safeURL: https://app.safe.global
//! pollInterval: 20
//! slackBotToken:
//!   type: environment
//!   value: SLACK_BOT_TOKEN
//! slackChannelId: C0123456
//! safeAddresses:
//!   - "rsk:0x0000000000000000000000000000000000000001": Treasury
//! signers:
//!   "0x0000000000000000000000000000000000000003": alice
//! api: fallback
//! ```

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{de, Deserialize, Deserializer};
use std::{
	collections::{BTreeMap, HashSet},
	path::Path,
	str::FromStr,
};

use crate::{
	models::{
		config::error::ConfigError, ApiMode, ConfigLoader, PrefixedAddress, SecretValue,
	},
	utils::{
		logging::error::{metadata, BoxedSource},
		RetryConfig, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SAFE_URL,
	},
};

fn default_safe_url() -> String {
	DEFAULT_SAFE_URL.to_string()
}

fn default_poll_interval() -> u64 {
	DEFAULT_POLL_INTERVAL_SECS
}

/// A watched safe and its alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeEntry {
	pub address: PrefixedAddress,
	pub alias: String,
}

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherConfig {
	/// Safe web application used for transaction links
	#[serde(rename = "safeURL", default = "default_safe_url")]
	pub safe_url: String,

	/// Poll interval in seconds
	#[serde(default = "default_poll_interval")]
	pub poll_interval: u64,

	#[serde(default)]
	pub telegram_bot_token: Option<SecretValue>,

	#[serde(default)]
	pub telegram_channel_id: Option<String>,

	#[serde(default)]
	pub slack_bot_token: Option<SecretValue>,

	#[serde(default)]
	pub slack_channel_id: Option<String>,

	/// Written as a list of single-entry maps `{"<prefix:0xaddr>": "<alias>"}`
	#[serde(deserialize_with = "deserialize_safe_addresses")]
	pub safe_addresses: Vec<SafeEntry>,

	/// Signer address (in the chain's checksum form) to display name
	#[serde(default)]
	pub signers: BTreeMap<String, String>,

	#[serde(default)]
	pub api: ApiMode,

	/// Retry policy for notification delivery
	#[serde(default)]
	pub retry_policy: RetryConfig,
}

fn deserialize_safe_addresses<'de, D>(deserializer: D) -> Result<Vec<SafeEntry>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: Vec<BTreeMap<String, String>> = Vec::deserialize(deserializer)?;

	raw.into_iter()
		.flatten()
		.map(|(address, alias)| {
			let address = address.parse::<PrefixedAddress>().map_err(de::Error::custom)?;
			Ok(SafeEntry { address, alias })
		})
		.collect()
}

impl WatcherConfig {
	pub fn poll_interval_ms(&self) -> u64 {
		self.poll_interval.saturating_mul(1000)
	}

	/// True when the watched safes, their aliases, the signers, the poll
	/// interval or the api mode differ. Notification settings are not compared.
	pub fn has_changed(&self, other: &WatcherConfig) -> bool {
		let safes = |config: &WatcherConfig| -> BTreeMap<PrefixedAddress, String> {
			config
				.safe_addresses
				.iter()
				.map(|entry| (entry.address.clone(), entry.alias.clone()))
				.collect()
		};

		safes(self) != safes(other)
			|| self.signers != other.signers
			|| self.poll_interval != other.poll_interval
			|| self.api != other.api
	}

	fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
		let parsed: Result<Self, BoxedSource> = if Self::is_yaml_file(path) {
			serde_yaml::from_str(content).map_err(|e| Box::new(e) as BoxedSource)
		} else {
			serde_json::from_str(content).map_err(|e| Box::new(e) as BoxedSource)
		};

		parsed.map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse config: {}", e),
				Some(e),
				metadata([("path", path.display().to_string())]),
			)
		})
	}
}

#[async_trait]
impl ConfigLoader for WatcherConfig {
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to read config file: {}", e),
				Some(Box::new(e)),
				metadata([("path", path.display().to_string())]),
			)
		})?;

		let config = Self::parse(path, &content)?.resolve_secrets().await?;
		config.validate()?;
		config.validate_protocol();

		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.poll_interval == 0 {
			return Err(ConfigError::validation_error(
				"pollInterval must be greater than zero",
				None,
				None,
			));
		}

		url::Url::parse(&self.safe_url).map_err(|e| {
			ConfigError::validation_error(
				format!("invalid safeURL: {}", e),
				Some(Box::new(e)),
				metadata([("safeURL", self.safe_url.clone())]),
			)
		})?;

		if self.safe_addresses.is_empty() {
			return Err(ConfigError::validation_error(
				"safeAddresses must contain at least one safe",
				None,
				None,
			));
		}

		let mut seen = HashSet::new();
		for entry in &self.safe_addresses {
			if entry.alias.trim().is_empty() {
				return Err(ConfigError::validation_error(
					"safe alias must not be empty",
					None,
					metadata([("safe", entry.address.to_string())]),
				));
			}
			if !seen.insert(&entry.address) {
				return Err(ConfigError::validation_error(
					"safe listed more than once",
					None,
					metadata([("safe", entry.address.to_string())]),
				));
			}
		}

		for (address, name) in &self.signers {
			Address::from_str(address).map_err(|e| {
				ConfigError::validation_error(
					format!("invalid signer address '{}'", address),
					Some(Box::new(e)),
					None,
				)
			})?;
			if name.trim().is_empty() {
				return Err(ConfigError::validation_error(
					"signer name must not be empty",
					None,
					metadata([("signer", address.clone())]),
				));
			}
		}

		for (key, token) in [
			("telegramBotToken", &self.telegram_bot_token),
			("slackBotToken", &self.slack_bot_token),
		] {
			if token.as_ref().is_some_and(SecretValue::is_empty) {
				return Err(ConfigError::validation_error(
					format!("{} must not be empty", key),
					None,
					None,
				));
			}
		}

		Ok(())
	}

	fn validate_protocol(&self) {
		if self.safe_url.starts_with("http://") {
			tracing::warn!(safe_url = %self.safe_url, "safeURL uses an insecure protocol");
		}

		let pairs = [
			(
				"telegram",
				self.telegram_bot_token.is_some(),
				self.telegram_channel_id.is_some(),
			),
			(
				"slack",
				self.slack_bot_token.is_some(),
				self.slack_channel_id.is_some(),
			),
		];
		for (notifier, has_token, has_channel) in pairs {
			if has_token != has_channel {
				tracing::warn!(
					notifier,
					"notifier needs both a bot token and a channel id, it will be disabled"
				);
			}
		}
	}

	async fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		let mut config = self.clone();

		for token in [&mut config.telegram_bot_token, &mut config.slack_bot_token]
			.into_iter()
			.flatten()
		{
			let resolved = token.resolve().map_err(|e| {
				ConfigError::parse_error(
					format!("failed to resolve bot token: {}", e),
					Some(e),
					None,
				)
			})?;
			*token = SecretValue::Plain(resolved);
		}

		Ok(config)
	}
}
