use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::core::{ListedTx, PrefixedAddress, ResolvedTx};

/// Classification of an observed transaction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
	Created,
	Updated,
	Executed,
	Malicious,
}

impl EventType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Created => "created",
			Self::Updated => "updated",
			Self::Executed => "executed",
			Self::Malicious => "malicious",
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Notification payload emitted by a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
	#[serde(rename = "type")]
	pub kind: EventType,
	/// Alias of the safe
	pub name: String,
	pub safe: PrefixedAddress,
	pub tx: ResolvedTx,
	/// Unexecuted transactions of the last listing, ascending by nonce
	pub pending: Vec<ListedTx>,
}
