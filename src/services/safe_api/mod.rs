//! Safe transaction APIs.
//!
//! Two upstream APIs expose the multisig transactions of a safe:
//!
//! - the Safe transaction service ([`ClassicApi`]), flat transaction objects
//! - the Safe client gateway ([`AltApi`]), wrapped transaction envelopes
//!
//! Both are normalised into [`ListedTx`]/[`DetailedTx`] behind the [`SafeApi`]
//! trait, and [`SafeApiWrapper`] selects between them per [`ApiMode`](crate::models::ApiMode).

use alloy::primitives::B256;
use async_trait::async_trait;

use crate::models::{DetailedTx, ListedTx};

mod alt;
mod base;
mod classic;
pub mod constants;
mod error;
mod wrapper;

pub use alt::AltApi;
pub use base::BaseApi;
pub use classic::ClassicApi;
pub use error::SafeApiError;
pub use wrapper::SafeApiWrapper;

/// Read access to the multisig transactions of one safe.
#[async_trait]
pub trait SafeApi: Send + Sync {
	/// Every known transaction, following pagination to the last page
	async fn fetch_all(&self) -> Result<Vec<ListedTx>, SafeApiError>;

	/// Most recently modified transactions, first page only
	async fn fetch_latest(&self) -> Result<Vec<ListedTx>, SafeApiError>;

	/// Full record of one transaction, served from cache when already fetched
	async fn fetch_detailed(&self, safe_tx_hash: B256) -> Result<DetailedTx, SafeApiError>;
}
