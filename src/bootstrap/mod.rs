//! Bootstrap module for wiring configuration, notifiers and watchers.
//!
//! # Services
//! - `NotificationSender`: built from the configured Slack and Telegram bots
//! - `WatcherRegistry`: one watcher per configured safe
//!
//! # Helpers
//! - `create_api_factory`: builds the Safe API adapters of a safe
//! - `spawn_config_reload`: periodically re-reads the configuration file and
//!   reconciles the registry
//! - `spawn_watcher_retry`: periodically restarts watchers that failed to start

use reqwest::Client as ReqwestClient;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::JobScheduler;

use crate::{
	models::{ConfigError, ConfigLoader, SecretString, SecretValue, WatcherConfig},
	services::{
		notification::{
			NotificationClientPool, NotificationError, NotificationSender, SlackConfig,
			SlackNotifier, TelegramConfig, TelegramNotifier,
		},
		safe_api::{
			constants::{alt_api_url, classic_api_url},
			AltApi, ClassicApi, SafeApi, SafeApiError, SafeApiWrapper,
		},
		watcher::{ApiFactory, JobSchedulerTrait, ReconcileSummary, WatchSpec, WatcherRegistry},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Safe API used in production: transaction service with gateway fallback
pub type SafeApiService = SafeApiWrapper<ClassicApi, AltApi>;

/// Registry used in production
pub type SafeWatcherRegistry = WatcherRegistry<SafeApiService, JobScheduler>;

/// HTTP client for the Safe APIs.
///
/// Retries are handled per request by `fetch_with_retry`, so the client
/// carries no retry middleware.
pub fn create_safe_api_client() -> std::result::Result<Arc<ClientWithMiddleware>, reqwest::Error> {
	let base_client = ReqwestClient::builder()
		.pool_max_idle_per_host(10)
		.pool_idle_timeout(Some(Duration::from_secs(90)))
		.connect_timeout(Duration::from_secs(10))
		.timeout(Duration::from_secs(30))
		.build()?;

	Ok(Arc::new(ClientBuilder::new(base_client).build()))
}

/// Factory building both adapters of a safe behind a [`SafeApiWrapper`].
///
/// A chain known to neither API is rejected here, before any watcher starts.
pub fn create_api_factory(client: Arc<ClientWithMiddleware>) -> ApiFactory<SafeApiService> {
	Arc::new(move |safe, mode| {
		if classic_api_url(&safe.prefix).is_none() && alt_api_url(&safe.prefix).is_none() {
			return Err(SafeApiError::no_endpoint(&safe.prefix));
		}
		SafeApiWrapper::from_address(&safe.to_string(), mode, client.clone())
	})
}

fn resolve_token(
	token: &SecretValue,
	notifier: &str,
) -> std::result::Result<SecretString, NotificationError> {
	token.resolve().map_err(|e| {
		NotificationError::config_error(
			format!("failed to resolve {} bot token", notifier),
			Some(e),
			None,
		)
	})
}

/// Registers a notifier for every platform with both a bot token and a channel.
pub async fn build_notification_sender(
	config: &WatcherConfig,
	pool: &NotificationClientPool,
) -> std::result::Result<NotificationSender, NotificationError> {
	let mut sender = NotificationSender::new();

	let slack = config.slack_bot_token.as_ref().zip(config.slack_channel_id.as_ref());
	let telegram = config
		.telegram_bot_token
		.as_ref()
		.zip(config.telegram_channel_id.as_ref());
	if slack.is_none() && telegram.is_none() {
		tracing::warn!("no notifiers configured, events will only be logged");
		return Ok(sender);
	}

	let client = pool
		.get_or_create_http_client(&config.retry_policy)
		.await
		.map_err(|e| {
			NotificationError::internal_error(
				"Failed to get or create HTTP client from pool",
				Some(Box::new(e)),
				None,
			)
		})?;

	if let Some((token, channel_id)) = telegram {
		sender.add_notifier(Arc::new(TelegramNotifier::new(
			TelegramConfig {
				token: resolve_token(token, "telegram")?,
				channel_id: channel_id.clone(),
				safe_url: config.safe_url.clone(),
				api_url: None,
			},
			client.clone(),
		)?));
	}

	if let Some((token, channel_id)) = slack {
		sender.add_notifier(Arc::new(SlackNotifier::new(
			SlackConfig {
				token: resolve_token(token, "slack")?,
				channel_id: channel_id.clone(),
				api_url: None,
			},
			client,
		)?));
	}

	Ok(sender)
}

/// Reconciles `registry` against `config` when a configured safe has no
/// running watcher, typically because its seed failed.
///
/// Returns `None` when every configured safe is watched.
pub async fn retry_failed_watchers<A, J>(
	config: &WatcherConfig,
	registry: &WatcherRegistry<A, J>,
) -> Option<ReconcileSummary>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	let specs = WatchSpec::from_config(config);
	let missing = registry.missing(&specs).await;
	if missing.is_empty() {
		return None;
	}

	tracing::warn!(
		safes = %missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
		"retrying watchers that are not running"
	);
	Some(registry.reconcile(specs).await)
}

/// Re-reads the configuration at `path` and reconciles `registry` when the
/// watch settings changed or a configured safe is not being watched.
///
/// Returns `Ok(None)` when there was nothing to do. On error the running
/// configuration is left untouched.
pub async fn reload_config<A, J>(
	path: &std::path::Path,
	current: &mut WatcherConfig,
	registry: &WatcherRegistry<A, J>,
) -> std::result::Result<Option<ReconcileSummary>, ConfigError>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	let config = WatcherConfig::load_from_path(path).await?;
	if !config.has_changed(current) {
		tracing::debug!("configuration unchanged");
		return Ok(retry_failed_watchers(current, registry).await);
	}

	tracing::info!("configuration changed, updating watchers");
	let summary = registry.reconcile(WatchSpec::from_config(&config)).await;
	*current = config;
	Ok(Some(summary))
}

/// Spawns a task re-reading the configuration every `interval`.
pub fn spawn_config_reload<A, J>(
	path: PathBuf,
	interval: Duration,
	initial: WatcherConfig,
	registry: Arc<WatcherRegistry<A, J>>,
) -> JoinHandle<()>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait + 'static,
{
	tokio::spawn(async move {
		let mut current = initial;
		let mut ticker = tokio::time::interval(interval);
		// The first tick completes immediately
		ticker.tick().await;

		loop {
			ticker.tick().await;
			if let Err(e) = reload_config(&path, &mut current, &registry).await {
				tracing::error!(
					error = %e,
					path = %path.display(),
					"failed to reload configuration, keeping current one"
				);
			}
		}
	})
}

/// Spawns a task retrying, every `interval`, the watchers of `config` that
/// are not running. Used when configuration reload is disabled.
pub fn spawn_watcher_retry<A, J>(
	interval: Duration,
	config: WatcherConfig,
	registry: Arc<WatcherRegistry<A, J>>,
) -> JoinHandle<()>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait + 'static,
{
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.tick().await;

		loop {
			ticker.tick().await;
			retry_failed_watchers(&config, &registry).await;
		}
	})
}
