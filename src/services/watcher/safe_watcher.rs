//! Watcher for a single safe.
//!
//! A [`SafeWatcher`] seeds its view of the safe with every known transaction,
//! then polls the most recently modified ones on a fixed interval and turns
//! differences into [`Event`]s for the notification sink.

use alloy::primitives::B256;
use anyhow::Context;
use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
	time::Duration,
};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::instrument;

use crate::{
	models::{ApiMode, Event, EventType, ListedTx, Operation, PrefixedAddress, WatcherConfig},
	services::{
		notification::Notifier,
		safe_api::{constants::is_multisend_call_only, SafeApi},
		watcher::{error::WatcherError, signers::SignerDirectory},
	},
	utils::{
		logging::error::metadata,
		metrics::{EVENTS_EMITTED, POLL_FAILURES},
	},
};

/// Trait for job scheduler
///
/// Abstracts the scheduler driving the poll loop so watchers can be tested
/// without a running scheduler.
#[async_trait::async_trait]
pub trait JobSchedulerTrait: Send + Sync + Sized {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>>;
	async fn add(&self, job: Job) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait::async_trait]
impl JobSchedulerTrait for JobScheduler {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
		Self::new().await.map_err(Into::into)
	}

	async fn add(&self, job: Job) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.add(job).await.map(|_| ()).map_err(Into::into)
	}

	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.start().await.map(|_| ()).map_err(Into::into)
	}

	async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.shutdown().await.map(|_| ()).map_err(Into::into)
	}
}

/// Everything needed to run a watcher for one safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
	pub safe: PrefixedAddress,
	/// Alias of the safe
	pub name: String,
	/// Signer address to display name
	pub signers: BTreeMap<String, String>,
	/// Zero disables polling after the seed
	pub poll_interval_ms: u64,
	pub mode: ApiMode,
}

impl WatchSpec {
	/// One spec per configured safe, in configuration order.
	pub fn from_config(config: &WatcherConfig) -> Vec<Self> {
		config
			.safe_addresses
			.iter()
			.map(|entry| Self {
				safe: entry.address.clone(),
				name: entry.alias.clone(),
				signers: config.signers.clone(),
				poll_interval_ms: config.poll_interval_ms(),
				mode: config.api,
			})
			.collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherStatus {
	Idle,
	Running,
	Stopped,
}

/// State shared between the watcher handle and its scheduled poll job.
struct WatcherCore<A> {
	safe: PrefixedAddress,
	name: String,
	api: A,
	signers: SignerDirectory,
	notifier: Arc<dyn Notifier>,
	/// Last seen status per transaction. Held for the whole poll cycle, so
	/// overlapping cycles of the same watcher are skipped.
	txs: Mutex<HashMap<B256, ListedTx>>,
}

impl<A: SafeApi> WatcherCore<A> {
	fn metadata(&self, tx: Option<&B256>) -> Option<HashMap<String, String>> {
		let mut md = metadata([("safe", self.safe.to_string())]).unwrap_or_default();
		if let Some(tx) = tx {
			md.insert("tx".to_string(), tx.to_string());
		}
		Some(md)
	}

	async fn seed(&self) -> Result<usize, WatcherError> {
		let listed = self.api.fetch_all().await.map_err(|e| {
			WatcherError::seed_error(
				"failed to fetch safe transactions",
				Some(Box::new(e)),
				self.metadata(None),
			)
		})?;

		let mut txs = self.txs.lock().await;
		for tx in &listed {
			txs.insert(tx.safe_tx_hash, *tx);
		}
		Ok(listed.len())
	}

	#[instrument(skip_all, fields(chain = %self.safe.prefix, safe = %self.safe.address))]
	async fn poll(&self) -> usize {
		let Ok(mut txs) = self.txs.try_lock() else {
			tracing::debug!("previous poll still in progress, skipping");
			return 0;
		};

		// All updates are expected to fit in the first page
		let latest = match self.api.fetch_latest().await {
			Ok(latest) => latest,
			Err(e) => {
				POLL_FAILURES
					.with_label_values(&[self.safe.prefix.as_str()])
					.inc();
				tracing::error!(error = %e, "failed to fetch latest transactions");
				return 0;
			}
		};

		let mut pending: Vec<ListedTx> = latest
			.iter()
			.filter(|tx| !tx.is_executed)
			.copied()
			.collect();
		pending.sort_by_key(|tx| tx.nonce);

		let mut emitted = 0;
		for tx in &latest {
			let result = match txs.insert(tx.safe_tx_hash, *tx) {
				None => self.process_new_tx(tx, &pending).await,
				Some(old) => self.process_tx_update(tx, &old, &pending).await,
			};
			match result {
				Ok(true) => emitted += 1,
				Ok(false) => {}
				Err(e) => tracing::debug!(tx = %tx.safe_tx_hash, error = %e, "skipped tx"),
			}
		}
		emitted
	}

	async fn process_new_tx(
		&self,
		tx: &ListedTx,
		pending: &[ListedTx],
	) -> Result<bool, WatcherError> {
		tracing::info!(tx = %tx.safe_tx_hash, nonce = tx.nonce, "detected new tx");

		let detailed = self.api.fetch_detailed(tx.safe_tx_hash).await.map_err(|e| {
			WatcherError::detail_error(
				"failed to fetch transaction details",
				Some(Box::new(e)),
				self.metadata(Some(&tx.safe_tx_hash)),
			)
		})?;

		let kind = if detailed.operation == Operation::DelegateCall
			&& !is_multisend_call_only(&detailed.to)
		{
			EventType::Malicious
		} else {
			EventType::Created
		};

		self.emit(kind, detailed, pending).await?;
		Ok(true)
	}

	async fn process_tx_update(
		&self,
		tx: &ListedTx,
		old: &ListedTx,
		pending: &[ListedTx],
	) -> Result<bool, WatcherError> {
		if !tx.status_differs(old) {
			return Ok(false);
		}
		tracing::info!(
			tx = %tx.safe_tx_hash,
			nonce = tx.nonce,
			is_executed = tx.is_executed,
			"detected updated tx"
		);

		let detailed = self.api.fetch_detailed(tx.safe_tx_hash).await.map_err(|e| {
			WatcherError::detail_error(
				"failed to fetch transaction details",
				Some(Box::new(e)),
				self.metadata(Some(&tx.safe_tx_hash)),
			)
		})?;

		let kind = if tx.is_executed {
			EventType::Executed
		} else {
			EventType::Updated
		};

		self.emit(kind, detailed, pending).await?;
		Ok(true)
	}

	async fn emit(
		&self,
		kind: EventType,
		detailed: crate::models::DetailedTx,
		pending: &[ListedTx],
	) -> Result<(), WatcherError> {
		let hash = detailed.safe_tx_hash;
		let event = Event {
			kind,
			name: self.name.clone(),
			safe: self.safe.clone(),
			tx: self.signers.resolve(detailed),
			pending: pending.to_vec(),
		};

		self.notifier.notify(&event).await.map_err(|e| {
			WatcherError::notify_error(
				"failed to deliver event",
				Some(Box::new(e)),
				self.metadata(Some(&hash)),
			)
		})?;
		EVENTS_EMITTED.with_label_values(&[kind.as_str()]).inc();
		Ok(())
	}
}

/// Watches one safe and reports changes to its multisig transactions.
///
/// # Type Parameters
/// * `A` - Safe API implementation
/// * `J` - Job scheduler implementation (must implement JobSchedulerTrait)
pub struct SafeWatcher<A, J>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	core: Arc<WatcherCore<A>>,
	scheduler: Option<J>,
	status: WatcherStatus,
}

impl<A, J> SafeWatcher<A, J>
where
	A: SafeApi + 'static,
	J: JobSchedulerTrait,
{
	pub fn new(spec: &WatchSpec, api: A, notifier: Arc<dyn Notifier>) -> Self {
		Self {
			core: Arc::new(WatcherCore {
				signers: SignerDirectory::new(&spec.safe.prefix, &spec.signers),
				safe: spec.safe.clone(),
				name: spec.name.clone(),
				api,
				notifier,
				txs: Mutex::new(HashMap::new()),
			}),
			scheduler: None,
			status: WatcherStatus::Idle,
		}
	}

	pub fn safe(&self) -> &PrefixedAddress {
		&self.core.safe
	}

	pub fn status(&self) -> WatcherStatus {
		self.status
	}

	/// Number of transactions currently tracked
	pub async fn tx_count(&self) -> usize {
		self.core.txs.lock().await.len()
	}

	/// Seeds the watcher with every known transaction and, when
	/// `poll_interval_ms` is positive, schedules [`poll`](Self::poll) on that
	/// interval.
	///
	/// A failed seed leaves the watcher idle.
	#[instrument(skip_all, fields(chain = %self.core.safe.prefix, safe = %self.core.safe.address))]
	pub async fn start(&mut self, poll_interval_ms: u64) -> Result<(), WatcherError> {
		if self.status != WatcherStatus::Idle {
			return Err(WatcherError::state_error(
				format!("cannot start watcher in state {:?}", self.status),
				None,
				self.core.metadata(None),
			));
		}

		let seeded = self.core.seed().await?;

		if poll_interval_ms > 0 {
			let scheduler = J::new().await.map_err(|e| {
				WatcherError::scheduler_error(e.to_string(), Some(e), self.core.metadata(None))
			})?;

			let core = self.core.clone();
			let job = Job::new_repeated_async(
				Duration::from_millis(poll_interval_ms),
				move |_uuid, _l| {
					let core = core.clone();
					Box::pin(async move {
						core.poll().await;
					})
				},
			)
			.with_context(|| "Failed to create job")?;

			scheduler.add(job).await.map_err(|e| {
				WatcherError::scheduler_error(e.to_string(), Some(e), self.core.metadata(None))
			})?;
			scheduler.start().await.map_err(|e| {
				WatcherError::scheduler_error(e.to_string(), Some(e), self.core.metadata(None))
			})?;
			self.scheduler = Some(scheduler);
		}

		self.status = WatcherStatus::Running;
		tracing::info!(txs = seeded, poll_interval_ms, "started watcher");
		Ok(())
	}

	/// Runs one poll cycle and returns the number of events emitted.
	///
	/// Failures never escape: a failed listing aborts the cycle, a failed
	/// transaction is skipped while its siblings are still processed.
	pub async fn poll(&self) -> usize {
		self.core.poll().await
	}

	/// Cancels future polls. An in-flight poll runs to completion. Stopping
	/// twice is a no-op.
	pub async fn stop(&mut self) -> Result<(), WatcherError> {
		if let Some(mut scheduler) = self.scheduler.take() {
			scheduler.shutdown().await.map_err(|e| {
				WatcherError::scheduler_error(e.to_string(), Some(e), self.core.metadata(None))
			})?;
		}
		if self.status != WatcherStatus::Stopped {
			tracing::info!(safe = %self.core.safe, "stopped watcher");
		}
		self.status = WatcherStatus::Stopped;
		Ok(())
	}
}
