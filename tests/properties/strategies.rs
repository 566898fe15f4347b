use alloy::primitives::{Address, B256};
use proptest::prelude::*;

use safe_watcher::{models::ListedTx, services::safe_api::constants::MULTISEND_CALL_ONLY};

pub fn prefix_strategy() -> impl Strategy<Value = String> {
	"[a-zA-Z0-9]{1,8}"
}

/// 40 hex digits in mixed case, without `0x`
pub fn hex_address_strategy() -> impl Strategy<Value = String> {
	"[0-9a-fA-F]{40}"
}

pub fn address_strategy() -> impl Strategy<Value = Address> {
	any::<[u8; 20]>().prop_map(Address::from)
}

/// Either an allow-listed multisend contract or an arbitrary address.
pub fn target_strategy() -> impl Strategy<Value = Address> {
	prop_oneof![
		prop::sample::select(MULTISEND_CALL_ONLY.to_vec()),
		address_strategy(),
	]
}

/// Listing records with distinct hashes. Nonces are drawn from a small range
/// so that ties occur.
pub fn listing_strategy(max: usize) -> impl Strategy<Value = Vec<ListedTx>> {
	prop::collection::vec((any::<u64>(), any::<bool>(), 0u32..5, 1u32..5), 0..max).prop_map(
		|records| {
			records
				.into_iter()
				.enumerate()
				.map(|(i, (nonce, is_executed, confirmations, required))| {
					let mut hash = [0u8; 32];
					hash[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
					ListedTx {
						safe_tx_hash: B256::from(hash),
						nonce: nonce % 4,
						is_executed,
						confirmations,
						confirmations_required: required,
					}
				})
				.collect()
		},
	)
}
