use reqwest::Client as ReqwestClient;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::utils::{
	client_storage::ClientStorage, create_retryable_http_client, RetryConfig,
	TransientErrorRetryStrategy,
};

#[derive(Debug, Error)]
pub enum NotificationPoolError {
	#[error("Failed to create HTTP client: {0}")]
	HttpClientBuildError(String),
}

/// Pool of HTTP clients shared by the chat notifiers.
///
/// Clients are keyed by retry policy, so notifiers configured with the same
/// policy share one connection pool.
pub struct NotificationClientPool {
	http_clients: ClientStorage<ClientWithMiddleware>,
}

impl NotificationClientPool {
	pub fn new() -> Self {
		Self {
			http_clients: ClientStorage::new(),
		}
	}

	/// Get or create an HTTP client with retry capabilities.
	pub async fn get_or_create_http_client(
		&self,
		retry_policy: &RetryConfig,
	) -> Result<Arc<ClientWithMiddleware>, NotificationPoolError> {
		let key = format!("{:?}", retry_policy);
		self.http_clients
			.get_or_try_insert_with(&key, || {
				let base_client = ReqwestClient::builder()
					.pool_max_idle_per_host(10)
					.pool_idle_timeout(Some(Duration::from_secs(90)))
					.connect_timeout(Duration::from_secs(10))
					.build()
					.map_err(|e| NotificationPoolError::HttpClientBuildError(e.to_string()))?;

				Ok(create_retryable_http_client(
					retry_policy,
					base_client,
					Some(TransientErrorRetryStrategy),
				))
			})
			.await
	}

	/// Get the number of active HTTP clients in the pool
	pub async fn active_http_client_count(&self) -> usize {
		self.http_clients.len().await
	}
}

impl Default for NotificationClientPool {
	fn default() -> Self {
		Self::new()
	}
}
