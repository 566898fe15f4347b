//! Error types for the Safe transaction APIs
//!
//! Errors are split by kind so that callers can tell construction failures
//! (bad address, unknown chain) from transport failures (status, content type,
//! network) and malformed payloads.
//!
//! Constructors do not log: transport errors are produced inside the retry loop
//! and would otherwise be logged once per attempt. The watcher logs the final
//! outcome.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafeApiError {
	/// The safe address does not match `prefix:0x<40 hex>`
	#[error("Invalid address: {0}")]
	InvalidAddress(ErrorContext),

	/// No upstream endpoint is known for the chain prefix
	#[error("No endpoint: {context}")]
	NoEndpoint { prefix: String, context: ErrorContext },

	/// Upstream answered with a non-2xx status
	#[error("HTTP status error: {context}")]
	HttpStatus {
		status: u16,
		url: String,
		context: ErrorContext,
	},

	/// Upstream answered with something other than JSON
	#[error("Content type error: {context}")]
	ContentType {
		content_type: String,
		context: ErrorContext,
	},

	/// Connection, TLS or timeout failure
	#[error("Network error: {0}")]
	Network(ErrorContext),

	/// Payload did not match the expected shape
	#[error("Failed to parse response: {0}")]
	ResponseParse(ErrorContext),
}

impl SafeApiError {
	pub fn invalid_address(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidAddress(ErrorContext::new(msg, source, metadata))
	}

	pub fn no_endpoint(prefix: impl Into<String>) -> Self {
		let prefix = prefix.into();
		let context = ErrorContext::new(format!("no API URL for chain '{}'", prefix), None, None);
		Self::NoEndpoint { prefix, context }
	}

	pub fn http_status(status: u16, url: impl Into<String>) -> Self {
		let url = url.into();
		let context = ErrorContext::new(format!("invalid response status: {}", status), None, None)
			.with_metadata("url", url.clone());
		Self::HttpStatus {
			status,
			url,
			context,
		}
	}

	pub fn content_type(content_type: impl Into<String>, url: impl Into<String>) -> Self {
		let content_type = content_type.into();
		let context = ErrorContext::new(
			format!("invalid content type: {}", content_type),
			None,
			None,
		)
		.with_metadata("url", url);
		Self::ContentType {
			content_type,
			context,
		}
	}

	pub fn network_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Network(ErrorContext::new(msg, source, metadata))
	}

	pub fn response_parse(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(ErrorContext::new(msg, source, metadata))
	}

	fn context(&self) -> &ErrorContext {
		match self {
			Self::InvalidAddress(ctx) | Self::Network(ctx) | Self::ResponseParse(ctx) => ctx,
			Self::NoEndpoint { context, .. }
			| Self::HttpStatus { context, .. }
			| Self::ContentType { context, .. } => context,
		}
	}
}

impl TraceableError for SafeApiError {
	fn trace_id(&self) -> String {
		self.context().trace_id.clone()
	}
}

impl From<reqwest_middleware::Error> for SafeApiError {
	fn from(err: reqwest_middleware::Error) -> Self {
		Self::network_error(format!("request failed: {}", err), Some(Box::new(err)), None)
	}
}
