//! Notification service implementation.
//!
//! Delivers watcher [`Event`]s to chat platforms. Every platform implements
//! [`Notifier`]; [`NotificationSender`] fans an event out to all registered
//! notifiers and is the single sink shared by every watcher.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

mod error;
mod pool;
mod slack;
mod telegram;

use crate::{models::Event, utils::logging::error::metadata};

pub use error::NotificationError;
pub use pool::{NotificationClientPool, NotificationPoolError};
pub use slack::{SlackConfig, SlackNotifier};
pub use telegram::{TelegramConfig, TelegramNotifier};

/// Sink for watcher events.
///
/// Implementations must tolerate concurrent `notify` calls from several watchers.
#[async_trait]
pub trait Notifier: Send + Sync {
	/// Short platform name used in logs
	fn name(&self) -> &str;

	async fn notify(&self, event: &Event) -> Result<(), NotificationError>;
}

/// Fan-out over every configured notifier.
///
/// A notifier that fails does not prevent delivery to the others; the sender
/// reports failure when at least one of them failed.
#[derive(Default, Clone)]
pub struct NotificationSender {
	notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationSender {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_notifier(&mut self, notifier: Arc<dyn Notifier>) {
		tracing::info!(notifier = notifier.name(), "added notifier");
		self.notifiers.push(notifier);
	}

	pub fn len(&self) -> usize {
		self.notifiers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.notifiers.is_empty()
	}
}

#[async_trait]
impl Notifier for NotificationSender {
	fn name(&self) -> &str {
		"sender"
	}

	async fn notify(&self, event: &Event) -> Result<(), NotificationError> {
		if self.notifiers.is_empty() {
			tracing::debug!(event = %event.kind, "no notifiers configured, dropping event");
			return Ok(());
		}

		let results = join_all(self.notifiers.iter().map(|n| n.notify(event))).await;

		let failed: Vec<&str> = self
			.notifiers
			.iter()
			.zip(&results)
			.filter(|(_, result)| result.is_err())
			.map(|(notifier, _)| notifier.name())
			.collect();

		if failed.is_empty() {
			return Ok(());
		}

		Err(NotificationError::notify_failed(
			format!("{} of {} notifiers failed", failed.len(), results.len()),
			None,
			metadata([
				("failed", failed.join(",")),
				("tx", event.tx.safe_tx_hash.to_string()),
			]),
		))
	}
}
