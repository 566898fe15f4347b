//! Signer display names.

use alloy::primitives::Address;
use std::{
	collections::{BTreeMap, HashMap},
	str::FromStr,
};

use crate::{
	models::{DetailedTx, ResolvedTx, SignerAnnotation},
	utils::normalize_string,
};

/// Chain id used for EIP-1191 checksums, for chains that require them.
fn checksum_chain_id(prefix: &str) -> Option<u64> {
	match normalize_string(prefix).as_str() {
		"rsk" => Some(30),
		"trsk" => Some(31),
		_ => None,
	}
}

/// Maps signer addresses of one safe to their configured names.
///
/// Names are keyed by the checksum form of the safe's chain: EIP-1191 for
/// Rootstock (`rsk`, `trsk`), EIP-55 elsewhere. Configured addresses are
/// converted to that form, so any spelling of an address matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerDirectory {
	checksum_chain_id: Option<u64>,
	names: HashMap<String, String>,
}

impl SignerDirectory {
	pub fn new(prefix: &str, names: &BTreeMap<String, String>) -> Self {
		let checksum_chain_id = checksum_chain_id(prefix);
		Self {
			checksum_chain_id,
			names: names
				.iter()
				.map(|(address, name)| {
					// Keys are validated on load; anything else is kept verbatim
					let key = Address::from_str(address)
						.map(|parsed| parsed.to_checksum(checksum_chain_id))
						.unwrap_or_else(|_| address.clone());
					(key, name.clone())
				})
				.collect(),
		}
	}

	/// Renders `address` in the checksum form of the safe's chain.
	pub fn checksum(&self, address: &Address) -> String {
		address.to_checksum(self.checksum_chain_id)
	}

	pub fn annotate(&self, address: Address) -> SignerAnnotation {
		let address = self.checksum(&address);
		let name = self.names.get(&address).cloned();
		SignerAnnotation { address, name }
	}

	/// Annotates the proposer and every confirmer of `tx`.
	pub fn resolve(&self, tx: DetailedTx) -> ResolvedTx {
		tx.map_signers(|address| self.annotate(address))
	}
}
