//! Property-based tests for watcher classification and poll transitions.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use proptest::{prelude::*, test_runner::Config};
use std::{
	collections::{BTreeMap, HashMap},
	sync::{Arc, Mutex},
};
use tokio::runtime::Runtime;
use tokio_cron_scheduler::JobScheduler;

use safe_watcher::{
	models::{ApiMode, DetailedTx, Event, EventType, ListedTx, Operation},
	services::{
		notification::{NotificationError, Notifier},
		safe_api::{constants::is_multisend_call_only, SafeApi, SafeApiError},
		watcher::{SafeWatcher, WatchSpec},
	},
	utils::tests::builders::transaction::DetailedTxBuilder,
};

use crate::properties::strategies::{listing_strategy, target_strategy};

/// Seeds with `seed`, then serves `latest` on every poll.
struct ScriptedApi {
	seed: Vec<ListedTx>,
	latest: Vec<ListedTx>,
	details: HashMap<B256, DetailedTx>,
}

#[async_trait]
impl SafeApi for ScriptedApi {
	async fn fetch_all(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		Ok(self.seed.clone())
	}

	async fn fetch_latest(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		Ok(self.latest.clone())
	}

	async fn fetch_detailed(&self, safe_tx_hash: B256) -> Result<DetailedTx, SafeApiError> {
		self.details
			.get(&safe_tx_hash)
			.cloned()
			.ok_or_else(|| SafeApiError::http_status(404, "http://localhost"))
	}
}

#[derive(Default)]
struct Collector {
	events: Mutex<Vec<Event>>,
}

#[async_trait]
impl Notifier for Collector {
	fn name(&self) -> &str {
		"collector"
	}

	async fn notify(&self, event: &Event) -> Result<(), NotificationError> {
		self.events.lock().unwrap().push(event.clone());
		Ok(())
	}
}

fn spec() -> WatchSpec {
	WatchSpec {
		safe: "eth:0x0000000000000000000000000000000000000001".parse().unwrap(),
		name: "Props".to_string(),
		signers: BTreeMap::new(),
		poll_interval_ms: 0,
		mode: ApiMode::Classic,
	}
}

fn detail_for(tx: &ListedTx, to: Address, operation: Operation) -> DetailedTx {
	DetailedTxBuilder::new()
		.hash(tx.safe_tx_hash)
		.nonce(tx.nonce)
		.executed(tx.is_executed)
		.confirmations_required(tx.confirmations_required)
		.to(to)
		.operation(operation)
		.build()
}

/// Seeds a watcher with `seed`, runs one poll over `latest` and returns the
/// emitted events.
fn run_poll(
	seed: Vec<ListedTx>,
	latest: Vec<ListedTx>,
	details: HashMap<B256, DetailedTx>,
) -> Vec<Event> {
	let runtime = Runtime::new().unwrap();
	runtime.block_on(async move {
		let collector = Arc::new(Collector::default());
		let api = ScriptedApi {
			seed,
			latest,
			details,
		};
		let mut watcher: SafeWatcher<ScriptedApi, JobScheduler> =
			SafeWatcher::new(&spec(), api, collector.clone());
		watcher.start(0).await.unwrap();
		watcher.poll().await;
		watcher.stop().await.unwrap();

		let events = collector.events.lock().unwrap().clone();
		events
	})
}

proptest! {
	#![proptest_config(Config {
		cases: 64,
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_new_tx_classification(
		to in target_strategy(),
		delegate in any::<bool>(),
		listing in listing_strategy(2),
	) {
		prop_assume!(!listing.is_empty());
		let tx = listing[0];
		let operation = if delegate { Operation::DelegateCall } else { Operation::Call };
		let details = HashMap::from([(tx.safe_tx_hash, detail_for(&tx, to, operation))]);

		let events = run_poll(Vec::new(), vec![tx], details);

		let expected = if delegate && !is_multisend_call_only(&to) {
			EventType::Malicious
		} else {
			EventType::Created
		};
		prop_assert_eq!(events.len(), 1);
		prop_assert_eq!(events[0].kind, expected);
	}

	#[test]
	fn test_unchanged_listing_emits_nothing(listing in listing_strategy(8)) {
		let details = listing
			.iter()
			.map(|tx| (tx.safe_tx_hash, detail_for(tx, Address::ZERO, Operation::Call)))
			.collect();

		let events = run_poll(listing.clone(), listing, details);

		prop_assert!(events.is_empty());
	}

	#[test]
	fn test_events_follow_status_changes(
		seed in listing_strategy(8),
		flips in prop::collection::vec((any::<bool>(), 0u32..3), 8),
	) {
		let latest: Vec<ListedTx> = seed
			.iter()
			.zip(flips.iter())
			.map(|(tx, (execute, extra))| ListedTx {
				is_executed: tx.is_executed || *execute,
				confirmations: tx.confirmations + extra,
				..*tx
			})
			.collect();
		let details = latest
			.iter()
			.map(|tx| (tx.safe_tx_hash, detail_for(tx, Address::ZERO, Operation::Call)))
			.collect();

		let events = run_poll(seed.clone(), latest.clone(), details);

		let changed: Vec<&ListedTx> = latest
			.iter()
			.zip(seed.iter())
			.filter(|(new, old)| new.status_differs(old))
			.map(|(new, _)| new)
			.collect();
		prop_assert_eq!(events.len(), changed.len());
		for (event, tx) in events.iter().zip(changed) {
			prop_assert_eq!(event.tx.safe_tx_hash, tx.safe_tx_hash);
			let expected = if tx.is_executed { EventType::Executed } else { EventType::Updated };
			prop_assert_eq!(event.kind, expected);
		}
	}

	#[test]
	fn test_pending_is_sorted_and_unexecuted(
		seed in listing_strategy(2),
		latest in listing_strategy(8).prop_map(|mut listing| {
			// Listing order opposite to hash order
			listing.reverse();
			listing
		}),
	) {
		// A seeded record may share its hash with a listed one
		let details = latest
			.iter()
			.map(|tx| (tx.safe_tx_hash, detail_for(tx, Address::ZERO, Operation::Call)))
			.collect();

		let events = run_poll(seed, latest.clone(), details);

		// Equal nonces keep their listing order
		let mut expected: Vec<ListedTx> =
			latest.iter().filter(|tx| !tx.is_executed).copied().collect();
		expected.sort_by_key(|tx| tx.nonce);

		for event in &events {
			prop_assert!(event.pending.iter().all(|tx| !tx.is_executed));
			prop_assert!(event.pending.windows(2).all(|w| w[0].nonce <= w[1].nonce));
			prop_assert_eq!(&event.pending, &expected);
		}
	}
}
