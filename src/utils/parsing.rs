//! Parsing utilities

use byte_unit::Byte;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

/// Parses a human-readable size such as "1GB", "500MB" or "1024KiB" into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Trims whitespace and lowercases, used for chain prefixes and other lookup keys.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Deserializes a `u64` that upstream APIs send either as a JSON number or as a
/// decimal string (newer transaction-service versions quote nonces).
pub fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum NumberOrString {
		Number(u64),
		String(String),
	}

	match NumberOrString::deserialize(deserializer)? {
		NumberOrString::Number(n) => Ok(n),
		NumberOrString::String(s) => s
			.trim()
			.parse::<u64>()
			.map_err(|e| de::Error::custom(format!("invalid integer '{}': {}", s, e))),
	}
}
