use alloy::primitives::B256;

use safe_watcher::{
	models::ApiMode,
	services::safe_api::{SafeApi, SafeApiError, SafeApiWrapper},
	utils::tests::builders::transaction::{DetailedTxBuilder, ListedTxBuilder},
};

use crate::integration::mocks::MockSafeApi;

fn unavailable() -> SafeApiError {
	SafeApiError::http_status(503, "http://upstream.invalid")
}

fn listing(nonce: u64) -> Vec<safe_watcher::models::ListedTx> {
	vec![ListedTxBuilder::new().nonce(nonce).build()]
}

#[tokio::test]
async fn test_fallback_uses_classic_when_it_works() {
	let mut classic = MockSafeApi::new();
	classic
		.expect_fetch_latest()
		.times(1)
		.returning(|| Ok(listing(1)));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_latest().times(0);

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Fallback);
	let txs = wrapper.fetch_latest().await.unwrap();

	assert_eq!(txs[0].nonce, 1);
}

#[tokio::test]
async fn test_fallback_switches_to_alt_on_error() {
	let mut classic = MockSafeApi::new();
	classic
		.expect_fetch_all()
		.times(1)
		.returning(|| Err(unavailable()));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_all().times(1).returning(|| Ok(listing(9)));

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Fallback);
	let txs = wrapper.fetch_all().await.unwrap();

	assert_eq!(txs[0].nonce, 9);
}

#[tokio::test]
async fn test_fallback_listing_failure_yields_empty_list() {
	let mut classic = MockSafeApi::new();
	classic.expect_fetch_latest().returning(|| Err(unavailable()));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_latest().returning(|| Err(unavailable()));

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Fallback);

	assert!(wrapper.fetch_latest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fallback_detail_failure_returns_alt_error() {
	let mut classic = MockSafeApi::new();
	classic
		.expect_fetch_detailed()
		.returning(|_| Err(unavailable()));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_detailed()
		.returning(|_| Err(SafeApiError::http_status(404, "http://gateway.invalid")));

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Fallback);
	let err = wrapper.fetch_detailed(B256::ZERO).await.unwrap_err();

	assert!(matches!(err, SafeApiError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fallback_detail_uses_alt_on_classic_error() {
	let hash = B256::repeat_byte(0x11);
	let mut classic = MockSafeApi::new();
	classic
		.expect_fetch_detailed()
		.returning(|_| Err(unavailable()));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_detailed()
		.withf(move |h| *h == hash)
		.returning(|h| Ok(DetailedTxBuilder::new().hash(h).nonce(3).build()));

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Fallback);
	let tx = wrapper.fetch_detailed(hash).await.unwrap();

	assert_eq!(tx.safe_tx_hash, hash);
	assert_eq!(tx.nonce, 3);
}

#[tokio::test]
async fn test_single_modes_never_touch_the_other_adapter() {
	let mut classic = MockSafeApi::new();
	classic
		.expect_fetch_latest()
		.times(1)
		.returning(|| Err(unavailable()));
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_latest().times(0);

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Classic);
	assert!(wrapper.fetch_latest().await.is_err());

	let mut classic = MockSafeApi::new();
	classic.expect_fetch_all().times(0);
	let mut alt = MockSafeApi::new();
	alt.expect_fetch_all().times(1).returning(|| Ok(listing(2)));

	let wrapper = SafeApiWrapper::new(classic, alt, ApiMode::Alt);
	assert_eq!(wrapper.fetch_all().await.unwrap()[0].nonce, 2);
}
