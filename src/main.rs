//! Safe multisig watcher entry point.
//!
//! Loads the configuration, starts one watcher per configured safe and keeps
//! them running until the process receives Ctrl+C or SIGTERM.
//!
//! # Flow
//! 1. Parses the CLI and applies it to the environment
//! 2. Loads and validates the configuration file
//! 3. Builds the Slack/Telegram notifiers
//! 4. Starts the watchers and the health server
//! 5. Re-reads the configuration on an interval when enabled, and retries
//!    watchers that failed to start
//! 6. Stops every watcher on shutdown

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{
		build_notification_sender, create_api_factory, create_safe_api_client,
		spawn_config_reload, spawn_watcher_retry, Result, SafeWatcherRegistry,
	},
	models::{ConfigLoader, WatcherConfig},
	services::{notification::NotificationClientPool, watcher::WatchSpec},
	utils::{
		constants::{DEFAULT_CONFIG_PATH, DEFAULT_HEALTH_ADDRESS, WATCHER_RETRY_INTERVAL_SECS},
		logging::setup_logging,
		metrics::{record_service_start, server::create_health_server},
		parse_string_to_bytes_size,
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::{
	env::{set_var, var},
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "safe-watcher",
	about = "Watches Safe multisig wallets for new, updated, executed and malicious transactions and sends notifications.",
	version
)]
struct Cli {
	/// Path to the configuration file (JSON or YAML)
	#[arg(long, value_name = "PATH", env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address of the health and metrics server
	#[arg(long, value_name = "HOST:PORT", default_value = DEFAULT_HEALTH_ADDRESS)]
	health_address: String,

	/// Re-read the configuration every N seconds, 0 disables reloading
	#[arg(long, value_name = "SECONDS", env = "CONFIG_RELOAD_INTERVAL", default_value_t = 0)]
	reload_interval: u64,

	/// Validate the configuration file without starting the service
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}
	}
}

/// Loads the configuration, logging a hint on failure.
async fn load_config(path: &Path) -> Option<WatcherConfig> {
	match WatcherConfig::load_from_path(path).await {
		Ok(config) => Some(config),
		Err(e) => {
			error!(
				path = %path.display(),
				"{}. Check the file, or point --config / CONFIG_PATH at a valid one.",
				e
			);
			None
		}
	}
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			error!("Error waiting for Ctrl+C: {}", e);
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	if cli.check {
		match load_config(&cli.config).await {
			Some(config) => {
				info!(
					safes = config.safe_addresses.len(),
					signers = config.signers.len(),
					"configuration is valid"
				);
				return Ok(());
			}
			None => std::process::exit(1),
		}
	}

	let Some(config) = load_config(&cli.config).await else {
		std::process::exit(1);
	};

	let started_at = chrono::Utc::now();
	record_service_start(&uuid::Uuid::new_v4().to_string(), started_at);

	let pool = NotificationClientPool::new();
	let sender = build_notification_sender(&config, &pool).await?;

	let factory = create_api_factory(create_safe_api_client()?);
	let registry = Arc::new(SafeWatcherRegistry::new(factory, Arc::new(sender)));

	let summary = registry.reconcile(WatchSpec::from_config(&config)).await;
	if registry.is_empty().await {
		error!(
			failed = summary.failed.len(),
			"no watcher could be started, exiting"
		);
		std::process::exit(1);
	}

	let health_server = create_health_server(cli.health_address.clone(), started_at)?;
	info!(address = %cli.health_address, "health server started");

	// Reloading also retries safes whose watcher failed to start
	let background_task = if cli.reload_interval > 0 {
		info!(interval_secs = cli.reload_interval, "configuration reload enabled");
		spawn_config_reload(
			cli.config.clone(),
			Duration::from_secs(cli.reload_interval),
			config,
			registry.clone(),
		)
	} else {
		spawn_watcher_retry(
			Duration::from_secs(WATCHER_RETRY_INTERVAL_SECS),
			config,
			registry.clone(),
		)
	};

	info!("Service started. Press Ctrl+C to shutdown");

	let server_handle = health_server.handle();
	tokio::select! {
		_ = shutdown_signal() => {
			info!("Shutdown signal received, stopping watchers...");
		}
		result = health_server => {
			if let Err(e) = result {
				error!("Health server error: {}", e);
			}
			info!("Health server stopped, stopping watchers...");
		}
	}

	background_task.abort();
	registry.stop_all().await;
	server_handle.stop(true).await;

	info!("Shutdown complete");
	Ok(())
}
