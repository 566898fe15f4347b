//! Safe client gateway adapter.
//!
//! The gateway wraps transactions in typed envelopes. Listing items that are not
//! `TRANSACTION` entries (date labels, conflict headers) or whose execution info
//! is not `MULTISIG` (module transactions) are dropped. The safe tx hash is the
//! last `_`-separated segment of the gateway id `multisig_<safe>_<hash>`.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};

use crate::{
	models::{DetailedTx, ListedTx, Operation, SafeTx},
	services::safe_api::{base::Page, constants, BaseApi, SafeApi, SafeApiError},
	utils::{deserialize_u64_lenient, logging::error::metadata},
};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ListItem {
	#[serde(rename = "TRANSACTION")]
	Transaction { transaction: TxSummary },
	#[serde(other)]
	Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxSummary {
	id: String,
	tx_status: String,
	#[serde(default)]
	execution_info: Option<ExecutionInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ExecutionInfo {
	#[serde(rename = "MULTISIG", rename_all = "camelCase")]
	Multisig {
		#[serde(deserialize_with = "deserialize_u64_lenient")]
		nonce: u64,
		confirmations_required: u32,
		confirmations_submitted: u32,
	},
	#[serde(other)]
	Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxDetails {
	tx_status: String,
	tx_data: TxData,
	#[serde(default)]
	detailed_execution_info: Option<DetailedExecutionInfo>,
}

#[derive(Debug, Deserialize)]
struct TxData {
	to: AddressValue,
	operation: Operation,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum DetailedExecutionInfo {
	#[serde(rename = "MULTISIG", rename_all = "camelCase")]
	Multisig {
		#[serde(deserialize_with = "deserialize_u64_lenient")]
		nonce: u64,
		safe_tx_hash: B256,
		confirmations_required: u32,
		#[serde(default)]
		confirmations: Vec<Confirmation>,
		#[serde(default)]
		proposer: Option<AddressValue>,
	},
	#[serde(other)]
	Other,
}

#[derive(Debug, Deserialize)]
struct Confirmation {
	signer: AddressValue,
}

#[derive(Debug, Deserialize)]
struct AddressValue {
	value: Address,
}

fn is_executed(tx_status: &str) -> bool {
	matches!(tx_status, "SUCCESS" | "FAILED" | "CANCELLED")
}

fn hash_from_id(id: &str) -> Result<B256, SafeApiError> {
	id.rsplit('_')
		.next()
		.and_then(|hash| B256::from_str(hash).ok())
		.ok_or_else(|| {
			SafeApiError::response_parse(
				format!("cannot extract safe tx hash from id '{}'", id),
				None,
				None,
			)
		})
}

fn normalize_listed(items: Vec<ListItem>) -> Result<Vec<ListedTx>, SafeApiError> {
	let mut listed = Vec::with_capacity(items.len());

	for item in items {
		let ListItem::Transaction { transaction } = item else {
			continue;
		};
		let Some(ExecutionInfo::Multisig {
			nonce,
			confirmations_required,
			confirmations_submitted,
		}) = transaction.execution_info
		else {
			continue;
		};

		listed.push(ListedTx {
			safe_tx_hash: hash_from_id(&transaction.id)?,
			nonce,
			is_executed: is_executed(&transaction.tx_status),
			confirmations: confirmations_submitted,
			confirmations_required,
		});
	}

	Ok(listed)
}

impl TryFrom<TxDetails> for DetailedTx {
	type Error = SafeApiError;

	fn try_from(details: TxDetails) -> Result<Self, Self::Error> {
		match details.detailed_execution_info {
			Some(DetailedExecutionInfo::Multisig {
				nonce,
				safe_tx_hash,
				confirmations_required,
				confirmations,
				proposer,
			}) => Ok(SafeTx {
				safe_tx_hash,
				nonce,
				is_executed: is_executed(&details.tx_status),
				confirmations_required,
				to: details.tx_data.to.value,
				operation: details.tx_data.operation,
				proposer: proposer.map(|p| p.value),
				confirmations: confirmations.into_iter().map(|c| c.signer.value).collect(),
			}),
			_ => Err(SafeApiError::response_parse(
				"transaction is not a multisig transaction",
				None,
				None,
			)),
		}
	}
}

/// Adapter for the Safe client gateway.
pub struct AltApi {
	base: BaseApi,
	chain_id: Option<u64>,
}

impl AltApi {
	pub fn new(safe: &str, client: Arc<ClientWithMiddleware>) -> Result<Self, SafeApiError> {
		let base = BaseApi::new(safe, constants::alt_api_url, client)?;
		let chain_id = constants::chain_id(&base.safe.prefix);
		Ok(Self { base, chain_id })
	}

	/// Overrides the gateway base URL.
	pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
		Self {
			base: self.base.with_endpoint(endpoint),
			..self
		}
	}

	pub fn with_retries(self, retries: u32) -> Self {
		Self {
			base: self.base.with_retries(retries),
			..self
		}
	}

	/// `{endpoint}/v1/chains/{chain_id}`
	fn chain_url(&self) -> Result<String, SafeApiError> {
		let endpoint = self.base.endpoint()?;
		let chain_id = self
			.chain_id
			.ok_or_else(|| SafeApiError::no_endpoint(&self.base.safe.prefix))?;
		Ok(format!("{}/v1/chains/{}", endpoint, chain_id))
	}

	fn listing_url(&self) -> Result<String, SafeApiError> {
		Ok(format!(
			"{}/safes/{}/multisig-transactions/",
			self.chain_url()?,
			self.base.safe.address
		))
	}
}

#[async_trait]
impl SafeApi for AltApi {
	async fn fetch_all(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		let items: Vec<ListItem> = self.base.fetch_pages(self.listing_url()?).await?;
		normalize_listed(items)
	}

	async fn fetch_latest(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		let page: Page<ListItem> = self.base.fetch_json(&self.listing_url()?).await?;
		normalize_listed(page.results)
	}

	async fn fetch_detailed(&self, safe_tx_hash: B256) -> Result<DetailedTx, SafeApiError> {
		if let Some(tx) = self.base.cached(&safe_tx_hash).await {
			return Ok(tx);
		}

		let url = format!("{}/transactions/{}", self.chain_url()?, safe_tx_hash);
		let details: TxDetails = self.base.fetch_json(&url).await?;
		let tx = DetailedTx::try_from(details).map_err(|e| {
			SafeApiError::response_parse(
				"unexpected transaction details",
				Some(Box::new(e)),
				metadata([("safe_tx_hash", safe_tx_hash.to_string())]),
			)
		})?;
		self.base.cache(tx.clone()).await;

		Ok(tx)
	}
}
