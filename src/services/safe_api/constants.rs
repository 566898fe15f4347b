//! Per-chain endpoint tables, keyed by the Safe chain short name.

use alloy::primitives::{address, Address};

use crate::utils::normalize_string;

/// MultiSendCallOnly deployments. A delegate call to any other address is
/// reported as malicious.
///
/// The list is shared by every chain.
pub const MULTISEND_CALL_ONLY: [Address; 2] = [
	address!("0x9641d764fc13c8b624c04430c7356c1c7c8102e2"),
	address!("0x40a2accbd92bca938b02010e17a5b8929b49130d"),
];

pub fn is_multisend_call_only(to: &Address) -> bool {
	MULTISEND_CALL_ONLY.contains(to)
}

pub fn chain_id(prefix: &str) -> Option<u64> {
	match normalize_string(prefix).as_str() {
		"arb1" => Some(42161),
		"eth" => Some(1),
		"gor" => Some(5),
		"oeth" => Some(10),
		"rsk" => Some(30),
		"trsk" => Some(31),
		_ => None,
	}
}

/// Safe transaction service base URL.
pub fn classic_api_url(prefix: &str) -> Option<&'static str> {
	match normalize_string(prefix).as_str() {
		"arb1" => Some("https://safe-transaction-arbitrum.safe.global/api"),
		"eth" => Some("https://safe-transaction-mainnet.safe.global/api"),
		"gor" => Some("https://safe-transaction-goerli.safe.global/api"),
		"oeth" => Some("https://safe-transaction-optimism.safe.global/api"),
		"rsk" | "trsk" => Some("https://transaction.safe.rootstock.io/api"),
		_ => None,
	}
}

/// Safe client gateway base URL.
pub fn alt_api_url(prefix: &str) -> Option<&'static str> {
	match normalize_string(prefix).as_str() {
		"arb1" | "eth" | "gor" | "oeth" => Some("https://safe-client.safe.global"),
		"rsk" | "trsk" => Some("https://gateway.safe.rootstock.io"),
		_ => None,
	}
}

/// Safe web application serving the chain.
pub fn web_app_url(prefix: &str) -> Option<&'static str> {
	match normalize_string(prefix).as_str() {
		"arb1" | "eth" | "gor" | "oeth" => Some("https://safe.global"),
		"rsk" | "trsk" => Some("https://safe.rootstock.io"),
		_ => None,
	}
}
