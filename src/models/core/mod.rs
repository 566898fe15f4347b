//! Core domain models of the watcher.
//!
//! - Prefixed addresses identifying watched safes
//! - Normalised multisig transactions
//! - Events emitted on transaction changes
//! - Upstream API selection

mod address;
mod api_mode;
mod event;
mod transaction;

pub use address::PrefixedAddress;
pub use api_mode::ApiMode;
pub use event::{Event, EventType};
pub use transaction::{DetailedTx, ListedTx, Operation, ResolvedTx, SafeTx, SignerAnnotation};
