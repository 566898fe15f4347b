//! HTTP client utilities.
//!
//! - [`fetch_with_retry`]: bounded, immediate retry of a single GET, used for
//!   every call to the Safe transaction APIs.
//! - [`create_retryable_http_client`]: middleware client with exponential
//!   backoff, used by the notifiers.

use reqwest::Response;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	default_on_request_failure, default_on_request_success, policies::ExponentialBackoff, Jitter,
	RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_attempts() -> u32 {
	3
}

fn default_initial_backoff() -> Duration {
	Duration::from_millis(250)
}

fn default_max_backoff() -> Duration {
	Duration::from_secs(10)
}

fn default_base_for_backoff() -> u32 {
	2
}

/// Serializable setting for jitter in retry policies
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
	/// No jitter applied to the backoff duration
	None,
	/// Full jitter applied, randomizing the backoff duration
	#[default]
	Full,
}

/// Retry policy for notification delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RetryConfig {
	/// Maximum number of retries for transient errors
	#[serde(default = "default_max_attempts")]
	pub max_retries: u32,
	/// Base duration for exponential backoff calculations
	#[serde(default = "default_base_for_backoff")]
	pub base_for_backoff: u32,
	/// Initial backoff duration before the first retry
	#[serde(default = "default_initial_backoff")]
	pub initial_backoff: Duration,
	/// Maximum backoff duration for retries
	#[serde(default = "default_max_backoff")]
	pub max_backoff: Duration,
	/// Jitter to apply to the backoff duration
	#[serde(default)]
	pub jitter: JitterSetting,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_attempts(),
			base_for_backoff: default_base_for_backoff(),
			initial_backoff: default_initial_backoff(),
			max_backoff: default_max_backoff(),
			jitter: JitterSetting::default(),
		}
	}
}

/// Retries on connection failures, timeouts, 408, 429 and 5xx responses.
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Creates an HTTP client with exponential-backoff retry middleware
///
/// # Parameters:
/// - `config`: Configuration for retry policies
/// - `base_client`: The base HTTP client to use
/// - `custom_strategy`: Optional custom retry strategy, complementing the default retry behavior
pub fn create_retryable_http_client<S>(
	config: &RetryConfig,
	base_client: reqwest::Client,
	custom_strategy: Option<S>,
) -> ClientWithMiddleware
where
	S: RetryableStrategy + Send + Sync + 'static,
{
	let policy_builder = match config.jitter {
		JitterSetting::None => ExponentialBackoff::builder().jitter(Jitter::None),
		JitterSetting::Full => ExponentialBackoff::builder().jitter(Jitter::Full),
	};

	let retry_policy = policy_builder
		.base(config.base_for_backoff)
		.retry_bounds(config.initial_backoff, config.max_backoff)
		.build_with_max_retries(config.max_retries);

	if let Some(strategy) = custom_strategy {
		ClientBuilder::new(base_client).with(
			RetryTransientMiddleware::new_with_policy_and_strategy(retry_policy, strategy),
		)
	} else {
		ClientBuilder::new(base_client)
			.with(RetryTransientMiddleware::new_with_policy(retry_policy))
	}
	.build()
}

/// Performs a GET against `url`, retrying up to `retries` additional times.
///
/// A transport failure or a response rejected by `validate` counts as a failed
/// attempt. Retries are immediate. When every attempt fails the error of the
/// last attempt is returned.
///
/// # Arguments
/// * `client` - client to send the request with; it should carry no retry middleware
/// * `url` - absolute URL
/// * `retries` - additional attempts after the first one
/// * `validate` - structural checks (status, content type) turning a delivered
///   response into a retryable failure
pub async fn fetch_with_retry<E, V>(
	client: &ClientWithMiddleware,
	url: &str,
	retries: u32,
	validate: V,
) -> Result<Response, E>
where
	E: From<reqwest_middleware::Error> + std::fmt::Display,
	V: Fn(&Response) -> Result<(), E>,
{
	let mut attempt: u32 = 0;
	loop {
		let result = match client.get(url).send().await {
			Ok(response) => validate(&response).map(|_| response),
			Err(e) => Err(E::from(e)),
		};

		match result {
			Ok(response) => return Ok(response),
			Err(e) if attempt >= retries => return Err(e),
			Err(e) => {
				attempt += 1;
				tracing::debug!(url, attempt, error = %e, "retrying request");
			}
		}
	}
}
