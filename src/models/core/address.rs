//! Chain-prefixed Safe address (`rsk:0xAbC...`).

use alloy::primitives::Address;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::models::config::ConfigError;

lazy_static! {
	static ref PREFIXED_ADDRESS_RE: Regex =
		Regex::new(r"^[a-zA-Z0-9]+:0x[a-fA-F0-9]{40}$").expect("static regex is valid");
}

/// External identity of a watched Safe: a chain short name and a 20-byte address.
///
/// Parsing is case-insensitive on the hex digits; the displayed form always uses
/// the EIP-55 checksum, so two spellings of the same address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrefixedAddress {
	pub prefix: String,
	pub address: Address,
}

impl PrefixedAddress {
	pub fn new(prefix: impl Into<String>, address: Address) -> Self {
		Self {
			prefix: prefix.into(),
			address,
		}
	}
}

impl FromStr for PrefixedAddress {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || {
			ConfigError::validation_error(format!("invalid prefixed safe address '{}'", s), None, None)
		};

		if !PREFIXED_ADDRESS_RE.is_match(s) {
			return Err(invalid());
		}

		let (prefix, address) = s.split_once(':').ok_or_else(invalid)?;
		let address = Address::from_str(address).map_err(|_| invalid())?;

		Ok(Self::new(prefix, address))
	}
}

impl TryFrom<String> for PrefixedAddress {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<PrefixedAddress> for String {
	fn from(value: PrefixedAddress) -> Self {
		value.to_string()
	}
}

impl fmt::Display for PrefixedAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.prefix, self.address.to_checksum(None))
	}
}
