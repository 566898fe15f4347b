//! Core services implementing the business logic.
//!
//! This module contains the main service implementations:
//! - `safe_api`: Safe transaction service and client gateway adapters
//! - `watcher`: Per-safe polling and the registry of running watchers
//! - `notification`: Delivery of transaction events to chat platforms

pub mod notification;
pub mod safe_api;
pub mod watcher;
