//! Domain models and data structures for Safe monitoring.
//!
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (prefixed addresses, transactions, events)
//! - `security`: Security models (Secret)

mod config;
mod core;
mod security;

// Re-export core types
pub use core::{
	ApiMode, DetailedTx, Event, EventType, ListedTx, Operation, PrefixedAddress, ResolvedTx,
	SafeTx, SignerAnnotation,
};

// Re-export config types
pub use config::{ConfigError, ConfigLoader, SafeEntry, WatcherConfig};

// Re-export security types
pub use security::{SecretString, SecretValue, SecurityError, SecurityResult};
