//! Mode-selecting composition of the two Safe API adapters.

use alloy::primitives::B256;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use std::{future::Future, sync::Arc};

use crate::{
	models::{ApiMode, DetailedTx, ListedTx},
	services::safe_api::{AltApi, ClassicApi, SafeApi, SafeApiError},
};

/// Serves [`SafeApi`] calls from the transaction service, the client gateway,
/// or the transaction service with the gateway as fallback.
///
/// In fallback mode a listing call for which both adapters fail yields an
/// empty list, so a poll cycle simply sees no changes. A failing detail call
/// returns the gateway's error.
pub struct SafeApiWrapper<C: SafeApi, A: SafeApi> {
	classic: C,
	alt: A,
	mode: ApiMode,
}

impl<C: SafeApi, A: SafeApi> SafeApiWrapper<C, A> {
	pub fn new(classic: C, alt: A, mode: ApiMode) -> Self {
		Self {
			classic,
			alt,
			mode,
		}
	}

	pub fn mode(&self) -> ApiMode {
		self.mode
	}

	/// Runs the call for the configured mode. The alternative call is only
	/// built when it is needed.
	async fn dispatch<'a, T, CF, AF>(
		&'a self,
		method: &'static str,
		classic: impl FnOnce(&'a C) -> CF,
		alt: impl FnOnce(&'a A) -> AF,
	) -> Result<T, SafeApiError>
	where
		CF: Future<Output = Result<T, SafeApiError>>,
		AF: Future<Output = Result<T, SafeApiError>>,
	{
		match self.mode {
			ApiMode::Classic => classic(&self.classic).await,
			ApiMode::Alt => alt(&self.alt).await,
			ApiMode::Fallback => match classic(&self.classic).await {
				Ok(result) => Ok(result),
				Err(e) => {
					tracing::error!(method, error = %e, "classic api call failed");
					tracing::warn!(method, "falling back to alternative api");
					alt(&self.alt).await
				}
			},
		}
	}

	/// Fallback-mode listing: both adapters failing is reported as no results.
	async fn dispatch_listing<'a, CF, AF>(
		&'a self,
		method: &'static str,
		classic: impl FnOnce(&'a C) -> CF,
		alt: impl FnOnce(&'a A) -> AF,
	) -> Result<Vec<ListedTx>, SafeApiError>
	where
		CF: Future<Output = Result<Vec<ListedTx>, SafeApiError>>,
		AF: Future<Output = Result<Vec<ListedTx>, SafeApiError>>,
	{
		match self.dispatch(method, classic, alt).await {
			Err(e) if self.mode == ApiMode::Fallback => {
				tracing::error!(method, error = %e, "alternative api call failed, returning no results");
				Ok(Vec::new())
			}
			result => result,
		}
	}
}

impl SafeApiWrapper<ClassicApi, AltApi> {
	/// Builds both adapters for `safe` with their built-in endpoints.
	pub fn from_address(
		safe: &str,
		mode: ApiMode,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, SafeApiError> {
		Ok(Self::new(
			ClassicApi::new(safe, client.clone())?,
			AltApi::new(safe, client)?,
			mode,
		))
	}
}

#[async_trait]
impl<C: SafeApi, A: SafeApi> SafeApi for SafeApiWrapper<C, A> {
	async fn fetch_all(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		self.dispatch_listing("fetch_all", |c| c.fetch_all(), |a| a.fetch_all())
			.await
	}

	async fn fetch_latest(&self) -> Result<Vec<ListedTx>, SafeApiError> {
		self.dispatch_listing("fetch_latest", |c| c.fetch_latest(), |a| a.fetch_latest())
			.await
	}

	async fn fetch_detailed(&self, safe_tx_hash: B256) -> Result<DetailedTx, SafeApiError> {
		self.dispatch(
			"fetch_detailed",
			|c| c.fetch_detailed(safe_tx_hash),
			|a| a.fetch_detailed(safe_tx_hash),
		)
		.await
	}
}
