//! Safe multisig wallet watcher.
//!
//! This library watches Safe multisig wallets through the Safe transaction
//! APIs and notifies chat channels about pending transactions. It includes:
//!
//! - Configuration management through JSON or YAML files
//! - Adapters for the classic transaction service and the client gateway
//! - A polling watcher per safe with malicious delegate-call detection
//! - Slack and Telegram notifiers
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires configuration, notifiers and watchers together
//! - `models`: Data structures for configuration, transactions and events
//! - `services`: Safe API access, watchers and notifications
//! - `utils`: Common utilities and helper functions

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
