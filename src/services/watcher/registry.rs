//! Registry of running watchers.
//!
//! Owns one [`SafeWatcher`] per configured safe and reconciles the running set
//! against a new list of [`WatchSpec`]s when the configuration changes.

use futures::future::join_all;
use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
	time::Duration,
};
use tokio::sync::RwLock;

use crate::{
	models::{ApiMode, PrefixedAddress},
	services::{
		notification::Notifier,
		safe_api::{SafeApi, SafeApiError},
		watcher::{
			error::WatcherError,
			safe_watcher::{JobSchedulerTrait, SafeWatcher, WatchSpec},
		},
	},
	utils::{logging::error::metadata, metrics::WATCHED_SAFES, WATCHER_START_STAGGER_MS},
};

/// Builds the API adapter of a safe for the given mode.
pub type ApiFactory<A> =
	Arc<dyn Fn(&PrefixedAddress, ApiMode) -> Result<A, SafeApiError> + Send + Sync>;

struct RegistryEntry<A, J>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	spec: WatchSpec,
	watcher: SafeWatcher<A, J>,
}

/// What [`WatcherRegistry::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
	Started,
	Restarted,
	Unchanged,
}

/// Result of a [`WatcherRegistry::reconcile`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
	pub started: usize,
	pub restarted: usize,
	pub unchanged: usize,
	pub removed: usize,
	/// Safes whose watcher could not be started
	pub failed: Vec<PrefixedAddress>,
}

/// Running watchers keyed by safe.
///
/// # Type Parameters
/// * `A` - Safe API implementation
/// * `J` - Job scheduler implementation (must implement JobSchedulerTrait)
pub struct WatcherRegistry<A, J>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	api_factory: ApiFactory<A>,
	notifier: Arc<dyn Notifier>,
	stagger: Duration,
	watchers: Arc<RwLock<HashMap<PrefixedAddress, RegistryEntry<A, J>>>>,
}

impl<A, J> WatcherRegistry<A, J>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	pub fn new(api_factory: ApiFactory<A>, notifier: Arc<dyn Notifier>) -> Self {
		Self {
			api_factory,
			notifier,
			stagger: Duration::from_millis(WATCHER_START_STAGGER_MS),
			watchers: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Delay between the starts of consecutive new watchers during reconcile
	pub fn with_stagger(mut self, stagger: Duration) -> Self {
		self.stagger = stagger;
		self
	}

	pub async fn len(&self) -> usize {
		self.watchers.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.watchers.read().await.is_empty()
	}

	pub async fn contains(&self, safe: &PrefixedAddress) -> bool {
		self.watchers.read().await.contains_key(safe)
	}

	/// Safes of `specs` without a running watcher, in `specs` order
	pub async fn missing(&self, specs: &[WatchSpec]) -> Vec<PrefixedAddress> {
		let watchers = self.watchers.read().await;
		specs
			.iter()
			.filter(|spec| !watchers.contains_key(&spec.safe))
			.map(|spec| spec.safe.clone())
			.collect()
	}

	/// Safes with a running watcher, sorted
	pub async fn safes(&self) -> Vec<PrefixedAddress> {
		let mut safes: Vec<_> = self.watchers.read().await.keys().cloned().collect();
		safes.sort();
		safes
	}

	async fn start_watcher(&self, spec: &WatchSpec) -> Result<SafeWatcher<A, J>, WatcherError> {
		let api = (self.api_factory)(&spec.safe, spec.mode).map_err(|e| {
			WatcherError::construction_error(
				"failed to create safe api",
				Some(Box::new(e)),
				metadata([("safe", spec.safe.to_string())]),
			)
		})?;

		let mut watcher = SafeWatcher::new(spec, api, self.notifier.clone());
		watcher.start(spec.poll_interval_ms).await?;
		Ok(watcher)
	}

	async fn update_gauge(&self) {
		WATCHED_SAFES.set(self.watchers.read().await.len() as f64);
	}

	/// Starts a watcher for a new safe, or restarts the running one when its
	/// spec changed.
	///
	/// When a restart fails the safe is left without a watcher.
	pub async fn upsert(&self, spec: WatchSpec) -> Result<UpsertOutcome, WatcherError> {
		let previous = {
			let mut watchers = self.watchers.write().await;
			match watchers.get(&spec.safe) {
				Some(entry) if entry.spec == spec => return Ok(UpsertOutcome::Unchanged),
				Some(_) => watchers.remove(&spec.safe),
				None => None,
			}
		};

		let outcome = match previous {
			Some(mut entry) => {
				tracing::info!(safe = %spec.safe, "watch settings changed, restarting watcher");
				if let Err(e) = entry.watcher.stop().await {
					tracing::warn!(safe = %spec.safe, error = %e, "failed to stop watcher");
				}
				UpsertOutcome::Restarted
			}
			None => UpsertOutcome::Started,
		};

		let watcher = match self.start_watcher(&spec).await {
			Ok(watcher) => watcher,
			Err(e) => {
				self.update_gauge().await;
				return Err(e);
			}
		};

		self.watchers
			.write()
			.await
			.insert(spec.safe.clone(), RegistryEntry { spec, watcher });
		self.update_gauge().await;

		Ok(outcome)
	}

	/// Stops and drops the watcher of `safe`. Returns false when none was running.
	pub async fn remove(&self, safe: &PrefixedAddress) -> Result<bool, WatcherError> {
		let entry = self.watchers.write().await.remove(safe);
		self.update_gauge().await;

		match entry {
			Some(mut entry) => {
				entry.watcher.stop().await?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Brings the running watchers in line with `specs`.
	///
	/// New safes start concurrently, the i-th new one after `i * stagger`.
	/// Changed safes restart immediately. Safes missing from `specs` are
	/// removed. A safe that fails to start is reported in the summary and does
	/// not affect the others.
	pub async fn reconcile(&self, specs: Vec<WatchSpec>) -> ReconcileSummary {
		let configured: HashSet<PrefixedAddress> = specs.iter().map(|s| s.safe.clone()).collect();

		let delays: Vec<Duration> = {
			let watchers = self.watchers.read().await;
			let mut new_index = 0u32;
			specs
				.iter()
				.map(|spec| {
					if watchers.contains_key(&spec.safe) {
						Duration::ZERO
					} else {
						let delay = self.stagger * new_index;
						new_index += 1;
						delay
					}
				})
				.collect()
		};

		let results = join_all(specs.into_iter().zip(delays).map(|(spec, delay)| async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
			let safe = spec.safe.clone();
			(safe, self.upsert(spec).await)
		}))
		.await;

		let mut summary = ReconcileSummary::default();
		for (safe, result) in results {
			match result {
				Ok(UpsertOutcome::Started) => summary.started += 1,
				Ok(UpsertOutcome::Restarted) => summary.restarted += 1,
				Ok(UpsertOutcome::Unchanged) => summary.unchanged += 1,
				Err(e) => {
					tracing::error!(safe = %safe, error = %e, "failed to start watcher, skipping safe");
					summary.failed.push(safe);
				}
			}
		}

		let stale: Vec<PrefixedAddress> = self
			.watchers
			.read()
			.await
			.keys()
			.filter(|safe| !configured.contains(*safe))
			.cloned()
			.collect();
		for safe in stale {
			match self.remove(&safe).await {
				Ok(_) => summary.removed += 1,
				Err(e) => tracing::warn!(safe = %safe, error = %e, "failed to stop watcher"),
			}
		}

		tracing::info!(
			started = summary.started,
			restarted = summary.restarted,
			unchanged = summary.unchanged,
			removed = summary.removed,
			failed = summary.failed.len(),
			"watchers updated with new configuration"
		);
		summary
	}

	/// Stops every watcher. Used on shutdown.
	pub async fn stop_all(&self) {
		let entries: Vec<_> = self.watchers.write().await.drain().collect();
		for (safe, mut entry) in entries {
			if let Err(e) = entry.watcher.stop().await {
				tracing::warn!(safe = %safe, error = %e, "failed to stop watcher");
			}
		}
		self.update_gauge().await;
	}
}
