use alloy::primitives::{address, B256};
use std::sync::{Arc, Mutex};

use safe_watcher::{
	models::{ApiMode, Event, EventType, Operation},
	services::{
		notification::NotificationError,
		safe_api::SafeApiError,
		watcher::{SafeWatcher, WatchSpec, WatcherError, WatcherStatus},
	},
	utils::tests::builders::transaction::{DetailedTxBuilder, ListedTxBuilder, TEST_SIGNER},
};

use crate::integration::mocks::{
	working_scheduler, MockJobScheduler, MockNotifier, MockSafeApi, SCHEDULER_CONTEXT_LOCK,
};

type Watcher = SafeWatcher<MockSafeApi, MockJobScheduler>;

fn create_spec(signer_name: Option<&str>) -> WatchSpec {
	WatchSpec {
		safe: "rsk:0x0000000000000000000000000000000000000001"
			.parse()
			.unwrap(),
		name: "Test".to_string(),
		signers: signer_name
			.map(|name| {
				[(TEST_SIGNER.to_checksum(Some(30)), name.to_string())]
					.into_iter()
					.collect()
			})
			.unwrap_or_default(),
		poll_interval_ms: 0,
		mode: ApiMode::Fallback,
	}
}

fn recording_notifier() -> (MockNotifier, Arc<Mutex<Vec<Event>>>) {
	let events = Arc::new(Mutex::new(Vec::new()));
	let mut notifier = MockNotifier::new();
	notifier.expect_name().return_const("recording".to_string());
	let sink = events.clone();
	notifier.expect_notify().returning(move |event| {
		sink.lock().unwrap().push(event.clone());
		Ok(())
	});
	(notifier, events)
}

fn error() -> SafeApiError {
	SafeApiError::http_status(500, "http://upstream.invalid")
}

#[tokio::test]
async fn test_new_pending_tx_emits_created() {
	let tx = ListedTxBuilder::new()
		.nonce(1)
		.confirmations(1)
		.confirmations_required(2)
		.build();

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().times(1).returning(|| Ok(Vec::new()));
	api.expect_fetch_latest().returning(move || Ok(vec![tx]));
	api.expect_fetch_detailed().times(1).returning(|hash| {
		Ok(DetailedTxBuilder::new()
			.hash(hash)
			.nonce(1)
			.confirmations_required(2)
			.build())
	});
	let (notifier, events) = recording_notifier();

	let mut watcher = Watcher::new(&create_spec(Some("alice")), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();
	assert_eq!(watcher.status(), WatcherStatus::Running);

	assert_eq!(watcher.poll().await, 1);
	assert_eq!(watcher.tx_count().await, 1);

	// Unchanged snapshot
	assert_eq!(watcher.poll().await, 0);

	let events = events.lock().unwrap();
	assert_eq!(events.len(), 1);
	let event = &events[0];
	assert_eq!(event.kind, EventType::Created);
	assert_eq!(event.name, "Test");
	assert_eq!(
		event.safe.to_string(),
		"rsk:0x0000000000000000000000000000000000000001"
	);
	assert_eq!(event.tx.nonce, 1);
	assert_eq!(event.tx.confirmations_required, 2);
	assert_eq!(event.tx.proposer.as_ref().unwrap().name.as_deref(), Some("alice"));
	assert_eq!(event.pending, vec![tx]);
}

#[tokio::test]
async fn test_seeded_txs_are_not_reported() {
	let tx = ListedTxBuilder::new().build();

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(move || Ok(vec![tx]));
	api.expect_fetch_latest().returning(move || Ok(vec![tx]));
	api.expect_fetch_detailed().times(0);
	let mut notifier = MockNotifier::new();
	notifier.expect_notify().times(0);

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();

	assert_eq!(watcher.tx_count().await, 1);
	assert_eq!(watcher.poll().await, 0);
}

#[tokio::test]
async fn test_delegate_call_to_unknown_contract_is_malicious() {
	let safe_call = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x01))
		.nonce(1)
		.build();
	let multisend = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x02))
		.nonce(2)
		.build();

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));
	api.expect_fetch_latest()
		.returning(move || Ok(vec![multisend, safe_call]));
	api.expect_fetch_detailed().returning(|hash| {
		let to = if hash == B256::repeat_byte(0x01) {
			address!("0x00000000000000000000000000000000deadbeef")
		} else {
			address!("0x40a2accbd92bca938b02010e17a5b8929b49130d")
		};
		Ok(DetailedTxBuilder::new()
			.hash(hash)
			.operation(Operation::DelegateCall)
			.to(to)
			.build())
	});
	let (notifier, events) = recording_notifier();

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();
	assert_eq!(watcher.poll().await, 2);

	let events = events.lock().unwrap();
	let kind_of = |hash: B256| {
		events
			.iter()
			.find(|e| e.tx.safe_tx_hash == hash)
			.map(|e| e.kind)
	};
	assert_eq!(kind_of(B256::repeat_byte(0x01)), Some(EventType::Malicious));
	assert_eq!(kind_of(B256::repeat_byte(0x02)), Some(EventType::Created));
	// Pending list is sorted by nonce whatever the listing order
	assert_eq!(events[0].pending[0].nonce, 1);
	assert_eq!(events[0].pending[1].nonce, 2);
}

#[tokio::test]
async fn test_pending_ties_keep_listing_order() {
	// Hashes deliberately out of order for equal nonces
	let late = ListedTxBuilder::new().hash(B256::repeat_byte(0x03)).nonce(5).build();
	let early = ListedTxBuilder::new().hash(B256::repeat_byte(0x01)).nonce(2).build();
	let tie = ListedTxBuilder::new().hash(B256::repeat_byte(0x02)).nonce(5).build();
	let second_tie = ListedTxBuilder::new().hash(B256::repeat_byte(0x05)).nonce(5).build();
	let done = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x06))
		.nonce(1)
		.executed(true)
		.build();
	let fresh = ListedTxBuilder::new().hash(B256::repeat_byte(0x04)).nonce(9).build();

	let seeded = vec![late, early, tie, second_tie, done];
	let listing = vec![late, early, fresh, tie, done, second_tie];

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(move || Ok(seeded.clone()));
	api.expect_fetch_latest()
		.returning(move || Ok(listing.clone()));
	api.expect_fetch_detailed()
		.times(1)
		.returning(|hash| Ok(DetailedTxBuilder::new().hash(hash).nonce(9).build()));
	let (notifier, events) = recording_notifier();

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();
	assert_eq!(watcher.poll().await, 1);

	let events = events.lock().unwrap();
	assert_eq!(events[0].tx.safe_tx_hash, fresh.safe_tx_hash);
	assert_eq!(events[0].pending, vec![early, late, tie, second_tie, fresh]);
}

#[tokio::test]
async fn test_confirmation_then_execution() {
	let proposed = ListedTxBuilder::new().confirmations(1).build();
	let confirmed = ListedTxBuilder::new().confirmations(2).build();
	let executed = ListedTxBuilder::new().confirmations(2).executed(true).build();
	let snapshots = Arc::new(Mutex::new(vec![executed, confirmed, confirmed]));

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(move || Ok(vec![proposed]));
	let remaining = snapshots.clone();
	api.expect_fetch_latest()
		.returning(move || Ok(vec![remaining.lock().unwrap().pop().unwrap()]));
	api.expect_fetch_detailed()
		.returning(|hash| Ok(DetailedTxBuilder::new().hash(hash).build()));
	let (notifier, events) = recording_notifier();

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();

	assert_eq!(watcher.poll().await, 1);
	assert_eq!(watcher.poll().await, 0);
	assert_eq!(watcher.poll().await, 1);

	let kinds: Vec<EventType> = events.lock().unwrap().iter().map(|e| e.kind).collect();
	assert_eq!(kinds, vec![EventType::Updated, EventType::Executed]);
	let events = events.lock().unwrap();
	assert!(events[1].pending.is_empty());
}

#[tokio::test]
async fn test_listing_failure_ends_cycle_without_state_change() {
	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));
	api.expect_fetch_latest().returning(|| Err(error()));
	api.expect_fetch_detailed().times(0);
	let mut notifier = MockNotifier::new();
	notifier.expect_notify().times(0);

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();

	assert_eq!(watcher.poll().await, 0);
	assert_eq!(watcher.tx_count().await, 0);
}

#[tokio::test]
async fn test_failing_detail_and_notifier_do_not_stop_siblings() {
	let broken = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x01))
		.nonce(1)
		.build();
	let rejected = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x02))
		.nonce(2)
		.build();
	let fine = ListedTxBuilder::new()
		.hash(B256::repeat_byte(0x03))
		.nonce(3)
		.build();

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));
	api.expect_fetch_latest()
		.returning(move || Ok(vec![broken, rejected, fine]));
	api.expect_fetch_detailed().returning(|hash| {
		if hash == B256::repeat_byte(0x01) {
			Err(SafeApiError::http_status(404, "http://upstream.invalid"))
		} else {
			Ok(DetailedTxBuilder::new().hash(hash).build())
		}
	});

	let delivered = Arc::new(Mutex::new(Vec::new()));
	let sink = delivered.clone();
	let mut notifier = MockNotifier::new();
	notifier.expect_name().return_const("flaky".to_string());
	notifier.expect_notify().returning(move |event| {
		if event.tx.safe_tx_hash == B256::repeat_byte(0x02) {
			return Err(NotificationError::notify_failed("rejected", None, None));
		}
		sink.lock().unwrap().push(event.tx.safe_tx_hash);
		Ok(())
	});

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(notifier));
	watcher.start(0).await.unwrap();

	assert_eq!(watcher.poll().await, 1);
	assert_eq!(*delivered.lock().unwrap(), vec![B256::repeat_byte(0x03)]);
	assert_eq!(watcher.tx_count().await, 3);
}

#[tokio::test]
async fn test_seed_failure_keeps_watcher_idle() {
	let mut api = MockSafeApi::new();
	api.expect_fetch_all().times(1).returning(|| Err(error()));

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(MockNotifier::new()));
	let result = watcher.start(1000).await;

	assert!(matches!(result, Err(WatcherError::SeedError(_))));
	assert_eq!(watcher.status(), WatcherStatus::Idle);
}

#[tokio::test]
async fn test_scheduler_creation_failure() {
	let _lock = SCHEDULER_CONTEXT_LOCK.lock().await;
	let ctx = MockJobScheduler::new_context();
	ctx.expect()
		.returning(|| Err("Failed to initialize scheduler".into()));

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(MockNotifier::new()));
	let result = watcher.start(1000).await;

	match result {
		Err(WatcherError::SchedulerError(ctx)) => {
			assert!(ctx.message.contains("Failed to initialize scheduler"));
		}
		other => panic!("expected SchedulerError, got {:?}", other.err()),
	}
	assert_eq!(watcher.status(), WatcherStatus::Idle);
}

#[tokio::test]
async fn test_scheduler_add_failure() {
	let _lock = SCHEDULER_CONTEXT_LOCK.lock().await;
	let ctx = MockJobScheduler::new_context();
	ctx.expect().returning(|| {
		let mut scheduler = MockJobScheduler::default();
		scheduler
			.expect_add()
			.returning(|_| Err("Failed to add job".into()));
		Ok(scheduler)
	});

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(MockNotifier::new()));
	let result = watcher.start(1000).await;

	assert!(matches!(result, Err(WatcherError::SchedulerError(_))));
}

#[tokio::test]
async fn test_scheduled_watcher_lifecycle() {
	let _lock = SCHEDULER_CONTEXT_LOCK.lock().await;
	let ctx = MockJobScheduler::new_context();
	ctx.expect().times(1).returning(|| Ok(working_scheduler()));

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(MockNotifier::new()));
	watcher.start(1000).await.unwrap();
	assert_eq!(watcher.status(), WatcherStatus::Running);

	assert!(matches!(
		watcher.start(1000).await,
		Err(WatcherError::StateError(_))
	));

	watcher.stop().await.unwrap();
	watcher.stop().await.unwrap();
	assert_eq!(watcher.status(), WatcherStatus::Stopped);
}

#[tokio::test]
async fn test_scheduler_shutdown_failure_is_reported() {
	let _lock = SCHEDULER_CONTEXT_LOCK.lock().await;
	let ctx = MockJobScheduler::new_context();
	ctx.expect().returning(|| {
		let mut scheduler = MockJobScheduler::default();
		scheduler.expect_add().returning(|_| Ok(()));
		scheduler.expect_start().returning(|| Ok(()));
		scheduler
			.expect_shutdown()
			.returning(|| Err("Failed to shutdown scheduler".into()));
		Ok(scheduler)
	});

	let mut api = MockSafeApi::new();
	api.expect_fetch_all().returning(|| Ok(Vec::new()));

	let mut watcher = Watcher::new(&create_spec(None), api, Arc::new(MockNotifier::new()));
	watcher.start(1000).await.unwrap();

	assert!(matches!(
		watcher.stop().await,
		Err(WatcherError::SchedulerError(_))
	));
}
