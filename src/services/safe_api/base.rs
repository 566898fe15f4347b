//! State and plumbing shared by both Safe API adapters.

use alloy::primitives::B256;
use reqwest::{header::CONTENT_TYPE, Response};
use reqwest_middleware::ClientWithMiddleware;
use serde::{de::DeserializeOwned, Deserialize};
use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};
use tokio::sync::RwLock;

use crate::{
	models::{DetailedTx, PrefixedAddress},
	services::safe_api::SafeApiError,
	utils::{fetch_with_retry, logging::error::metadata, SAFE_API_RETRIES},
};

/// Paginated listing envelope used by both upstream APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
	pub results: Vec<T>,
	#[serde(default)]
	pub next: Option<String>,
}

/// Safe identity, upstream endpoint, HTTP client and the detail cache.
pub struct BaseApi {
	pub(crate) safe: PrefixedAddress,
	endpoint: Option<String>,
	client: Arc<ClientWithMiddleware>,
	retries: u32,
	cache: RwLock<HashMap<B256, DetailedTx>>,
}

impl BaseApi {
	/// Parses `safe` and looks up the default endpoint for its chain.
	///
	/// A chain without a known endpoint is not an error here; every fetch
	/// fails with [`SafeApiError::NoEndpoint`] instead.
	pub fn new(
		safe: &str,
		default_endpoint: fn(&str) -> Option<&'static str>,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, SafeApiError> {
		let safe: PrefixedAddress = safe.parse().map_err(|e| {
			SafeApiError::invalid_address(
				format!("invalid prefixed safe address '{}'", safe),
				Some(Box::new(e)),
				None,
			)
		})?;
		let endpoint = default_endpoint(&safe.prefix).map(str::to_string);

		Ok(Self {
			safe,
			endpoint,
			client,
			retries: SAFE_API_RETRIES,
			cache: RwLock::new(HashMap::new()),
		})
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
		self
	}

	pub fn with_retries(mut self, retries: u32) -> Self {
		self.retries = retries;
		self
	}

	pub fn endpoint(&self) -> Result<&str, SafeApiError> {
		self.endpoint
			.as_deref()
			.ok_or_else(|| SafeApiError::no_endpoint(&self.safe.prefix))
	}

	/// GETs `url` through the retry helper and decodes the JSON body.
	pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SafeApiError> {
		let response = fetch_with_retry(&self.client, url, self.retries, validate_response).await?;

		response.json::<T>().await.map_err(|e| {
			SafeApiError::response_parse(
				format!("failed to decode response: {}", e),
				Some(Box::new(e)),
				metadata([("url", url.to_string())]),
			)
		})
	}

	/// Follows `next` links from `first_url` and concatenates every page.
	///
	/// A `next` link pointing back to an already fetched page fails with
	/// [`SafeApiError::ResponseParse`].
	pub async fn fetch_pages<T: DeserializeOwned>(
		&self,
		first_url: String,
	) -> Result<Vec<T>, SafeApiError> {
		let mut results = Vec::new();
		let mut visited = HashSet::new();
		let mut next = Some(first_url);

		while let Some(url) = next {
			if !visited.insert(url.clone()) {
				return Err(SafeApiError::response_parse(
					"pagination loops back to an earlier page",
					None,
					metadata([
						("url", url),
						("pages", visited.len().to_string()),
					]),
				));
			}
			let page: Page<T> = self.fetch_json(&url).await?;
			results.extend(page.results);
			next = page.next;
		}

		Ok(results)
	}

	pub async fn cached(&self, safe_tx_hash: &B256) -> Option<DetailedTx> {
		self.cache.read().await.get(safe_tx_hash).cloned()
	}

	pub async fn cache(&self, tx: DetailedTx) {
		self.cache.write().await.insert(tx.safe_tx_hash, tx);
	}
}

/// Rejects non-2xx statuses and non-JSON bodies before any parsing happens.
fn validate_response(response: &Response) -> Result<(), SafeApiError> {
	let status = response.status();
	if !status.is_success() {
		return Err(SafeApiError::http_status(
			status.as_u16(),
			response.url().as_str(),
		));
	}

	let content_type = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("none");
	if !content_type.contains("application/json") {
		return Err(SafeApiError::content_type(
			content_type,
			response.url().as_str(),
		));
	}

	Ok(())
}
