//! Property-based tests for chain-prefixed safe addresses.

use alloy::primitives::Address;
use proptest::{prelude::*, test_runner::Config};
use std::str::FromStr;

use safe_watcher::models::PrefixedAddress;

use crate::properties::strategies::{hex_address_strategy, prefix_strategy};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_well_formed_addresses_parse(prefix in prefix_strategy(), hex in hex_address_strategy()) {
		let input = format!("{}:0x{}", prefix, hex);
		let parsed: PrefixedAddress = input.parse().unwrap();

		prop_assert_eq!(&parsed.prefix, &prefix);
		prop_assert_eq!(parsed.address, Address::from_str(&format!("0x{}", hex)).unwrap());
	}

	#[test]
	fn test_display_reparses_to_same_address(prefix in prefix_strategy(), hex in hex_address_strategy()) {
		let parsed: PrefixedAddress = format!("{}:0x{}", prefix, hex).parse().unwrap();
		let reparsed: PrefixedAddress = parsed.to_string().parse().unwrap();

		prop_assert_eq!(parsed, reparsed);
	}

	#[test]
	fn test_hex_case_is_irrelevant(prefix in prefix_strategy(), hex in hex_address_strategy()) {
		let lower: PrefixedAddress = format!("{}:0x{}", prefix, hex.to_lowercase()).parse().unwrap();
		let upper: PrefixedAddress = format!("{}:0x{}", prefix, hex.to_uppercase()).parse().unwrap();

		prop_assert_eq!(lower, upper);
	}

	#[test]
	fn test_wrong_length_is_rejected(
		prefix in prefix_strategy(),
		hex in prop_oneof!["[0-9a-f]{1,39}", "[0-9a-f]{41,60}"],
	) {
		let input = format!("{}:0x{}", prefix, hex);
		let err = input.parse::<PrefixedAddress>().unwrap_err();

		let expected = format!("invalid prefixed safe address '{}'", input);
		prop_assert!(err.to_string().contains(&expected));
	}

	#[test]
	fn test_bad_prefix_is_rejected(
		prefix in "[a-z]{0,4}[-_ .][a-z]{0,4}",
		hex in hex_address_strategy(),
	) {
		let input = format!("{}:0x{}", prefix, hex);
		prop_assert!(input.parse::<PrefixedAddress>().is_err());
	}

	#[test]
	fn test_arbitrary_strings_never_panic(input in ".*") {
		let _ = input.parse::<PrefixedAddress>();
	}
}
