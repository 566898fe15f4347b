//! Watcher error types.
//!
//! Covers the lifecycle of a safe watcher: seeding at start-up, per-transaction
//! processing during a poll, event delivery and scheduling.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum WatcherError {
	/// The safe's API adapters could not be built (unknown chain prefix)
	#[error("Construction error: {0}")]
	ConstructionError(ErrorContext),

	/// The initial full listing failed; the watcher never started
	#[error("Seed error: {0}")]
	SeedError(ErrorContext),

	/// Fetching the full record of one transaction failed
	#[error("Detail error: {0}")]
	DetailError(ErrorContext),

	/// The notification sink rejected an event
	#[error("Notify error: {0}")]
	NotifyError(ErrorContext),

	/// The poll job could not be created, scheduled or shut down
	#[error("Scheduler error: {0}")]
	SchedulerError(ErrorContext),

	/// Illegal lifecycle transition, e.g. starting a stopped watcher
	#[error("State error: {0}")]
	StateError(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl WatcherError {
	pub fn construction_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConstructionError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn seed_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SeedError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn detail_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DetailError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn notify_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotifyError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn scheduler_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchedulerError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn state_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StateError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for WatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConstructionError(ctx)
			| Self::SeedError(ctx)
			| Self::DetailError(ctx)
			| Self::NotifyError(ctx)
			| Self::SchedulerError(ctx)
			| Self::StateError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
