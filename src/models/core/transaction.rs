//! Normalised Safe multisig transaction records.
//!
//! Both upstream APIs are mapped onto these shapes: [`ListedTx`] from listing
//! endpoints and [`DetailedTx`] from per-hash lookups. A [`DetailedTx`] whose
//! signer addresses have been annotated with display names is a [`ResolvedTx`].

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction status as seen in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedTx {
	pub safe_tx_hash: B256,
	pub nonce: u64,
	pub is_executed: bool,
	pub confirmations: u32,
	pub confirmations_required: u32,
}

impl ListedTx {
	/// True when the mutable part of the record (execution flag, confirmation
	/// count) differs from `other`.
	pub fn status_differs(&self, other: &ListedTx) -> bool {
		self.is_executed != other.is_executed || self.confirmations != other.confirmations
	}
}

/// Safe operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Operation {
	Call,
	DelegateCall,
}

impl TryFrom<u8> for Operation {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Call),
			1 => Ok(Self::DelegateCall),
			other => Err(format!("unknown operation {}", other)),
		}
	}
}

impl From<Operation> for u8 {
	fn from(value: Operation) -> Self {
		match value {
			Operation::Call => 0,
			Operation::DelegateCall => 1,
		}
	}
}

/// Full transaction record, generic over how signers are represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTx<S> {
	pub safe_tx_hash: B256,
	pub nonce: u64,
	pub is_executed: bool,
	pub confirmations_required: u32,
	pub to: Address,
	pub operation: Operation,
	pub proposer: Option<S>,
	pub confirmations: Vec<S>,
}

/// Record returned by `fetch_detailed`, signers as raw addresses.
pub type DetailedTx = SafeTx<Address>;

/// Record carried by events, signers annotated with display names.
pub type ResolvedTx = SafeTx<SignerAnnotation>;

impl<S> SafeTx<S> {
	/// Converts every signer (proposer and confirmers) with `f`.
	pub fn map_signers<T>(self, mut f: impl FnMut(S) -> T) -> SafeTx<T> {
		SafeTx {
			safe_tx_hash: self.safe_tx_hash,
			nonce: self.nonce,
			is_executed: self.is_executed,
			confirmations_required: self.confirmations_required,
			to: self.to,
			operation: self.operation,
			proposer: self.proposer.map(&mut f),
			confirmations: self.confirmations.into_iter().map(f).collect(),
		}
	}

	pub fn listed(&self) -> ListedTx {
		ListedTx {
			safe_tx_hash: self.safe_tx_hash,
			nonce: self.nonce,
			is_executed: self.is_executed,
			confirmations: self.confirmations.len() as u32,
			confirmations_required: self.confirmations_required,
		}
	}
}

/// A signer address with its configured alias, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerAnnotation {
	/// Address in the chain's checksum form
	pub address: String,
	pub name: Option<String>,
}

impl fmt::Display for SignerAnnotation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{}", name),
			None => write!(f, "{}", self.address),
		}
	}
}
