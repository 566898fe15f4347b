//! Safe transaction service adapter.
//!
//! The transaction service returns flat multisig transaction objects; the
//! confirmation count of a listed transaction is the length of its
//! `confirmations` array, or zero when the array is missing or null.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
	models::{DetailedTx, ListedTx, Operation, SafeTx},
	services::safe_api::{base::Page, constants, BaseApi, SafeApi, SafeApiError},
	utils::deserialize_u64_lenient,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassicListedTx {
	safe_tx_hash: B256,
	#[serde(deserialize_with = "deserialize_u64_lenient")]
	nonce: u64,
	is_executed: bool,
	confirmations_required: u32,
	#[serde(default)]
	confirmations: Option<Vec<ClassicConfirmation>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassicDetailedTx {
	safe_tx_hash: B256,
	#[serde(deserialize_with = "deserialize_u64_lenient")]
	nonce: u64,
	is_executed: bool,
	confirmations_required: u32,
	#[serde(default)]
	confirmations: Option<Vec<ClassicConfirmation>>,
	to: Address,
	operation: Operation,
	#[serde(default)]
	proposer: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct ClassicConfirmation {
	owner: Address,
}

impl From<ClassicListedTx> for ListedTx {
	fn from(tx: ClassicListedTx) -> Self {
		ListedTx {
			safe_tx_hash: tx.safe_tx_hash,
			nonce: tx.nonce,
			is_executed: tx.is_executed,
			confirmations: tx.confirmations.map_or(0, |c| c.len() as u32),
			confirmations_required: tx.confirmations_required,
		}
	}
}

impl From<ClassicDetailedTx> for DetailedTx {
	fn from(tx: ClassicDetailedTx) -> Self {
		SafeTx {
			safe_tx_hash: tx.safe_tx_hash,
			nonce: tx.nonce,
			is_executed: tx.is_executed,
			confirmations_required: tx.confirmations_required,
			to: tx.to,
			operation: tx.operation,
			proposer: tx.proposer,
			confirmations: tx
				.confirmations
				.unwrap_or_default()
				.into_iter()
				.map(|c| c.owner)
				.collect(),
		}
	}
}

/// Adapter for `safe-transaction-*` services.
pub struct ClassicApi {
	base: BaseApi,
}

impl ClassicApi {
	pub fn new(safe: &str, client: Arc<ClientWithMiddleware>) -> Result<Self, SafeApiError> {
		Ok(Self {
			base: BaseApi::new(safe, constants::classic_api_url, client)?,
		})
	}

	/// Overrides the transaction service base URL (including any `/api` suffix).
	pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
		Self {
			base: self.base.with_endpoint(endpoint),
		}
	}

	pub fn with_retries(self, retries: u32) -> Self {
		Self {
			base: self.base.with_retries(retries),
		}
	}

	fn listing_url(&self, query: &str) -> Result<String, SafeApiError> {
		Ok(format!(
			"{}/v1/safes/{}/multisig-transactions/?{}",
			self.base.endpoint()?,
			self.base.safe.address,
			query
		))
	}
}

#[async_trait]
impl SafeApi for ClassicApi {
	async fn fetch_all(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		let url = self.listing_url("limit=100")?;
		let txs: Vec<ClassicListedTx> = self.base.fetch_pages(url).await?;
		Ok(txs.into_iter().map(ListedTx::from).collect())
	}

	async fn fetch_latest(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		let url = self.listing_url("ordering=-modified&limit=20")?;
		let page: Page<ClassicListedTx> = self.base.fetch_json(&url).await?;
		Ok(page.results.into_iter().map(ListedTx::from).collect())
	}

	async fn fetch_detailed(&self, safe_tx_hash: B256) -> Result<DetailedTx, SafeApiError> {
		if let Some(tx) = self.base.cached(&safe_tx_hash).await {
			return Ok(tx);
		}

		let url = format!(
			"{}/v1/multisig-transactions/{}/",
			self.base.endpoint()?,
			safe_tx_hash
		);
		let tx: DetailedTx = self.base.fetch_json::<ClassicDetailedTx>(&url).await?.into();
		self.base.cache(tx.clone()).await;

		Ok(tx)
	}
}
