//! Utility modules for common functionality.
//!
//! - client_storage: shared cache of HTTP clients
//! - constants: defaults for the application
//! - http: HTTP client utilities (retrying GETs, retryable middleware clients)
//! - logging: logging setup and structured error context
//! - macros: crate-wide macros
//! - metrics: Prometheus metrics and the health server
//! - parsing: parsing utilities
//! - tests: test utilities

pub mod client_storage;
pub mod constants;
pub mod http;
pub mod logging;
pub mod macros;
pub mod metrics;
pub mod parsing;

pub use client_storage::ClientStorage;
pub use constants::*;
pub use http::*;
pub use parsing::*;
