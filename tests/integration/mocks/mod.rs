//! Mock implementations for testing purposes.
//!
//! This module contains mock implementations of the traits at the seams of the
//! watcher:
//! - Safe API access
//! - Notification sink
//! - Job scheduler
//!
//! The mocks are implemented using the `mockall` crate.

#[allow(unused_imports)]
pub use services::*;
