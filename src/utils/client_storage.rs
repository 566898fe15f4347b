use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Shared, lazily populated client cache.
///
/// Keyed by a caller-chosen string (for HTTP clients, the debug form of the retry
/// policy) so that notifiers with identical policies reuse one connection pool.
#[derive(Default)]
pub struct ClientStorage<T> {
	pub clients: Arc<RwLock<HashMap<String, Arc<T>>>>,
}

impl<T> ClientStorage<T> {
	pub fn new() -> Self {
		Self {
			clients: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Returns the client stored under `key`, creating it with `create` on first use.
	pub async fn get_or_try_insert_with<E, F>(&self, key: &str, create: F) -> Result<Arc<T>, E>
	where
		F: FnOnce() -> Result<T, E>,
	{
		if let Some(client) = self.clients.read().await.get(key) {
			return Ok(client.clone());
		}

		let mut clients = self.clients.write().await;
		if let Some(client) = clients.get(key) {
			return Ok(client.clone());
		}

		let client = Arc::new(create()?);
		clients.insert(key.to_string(), client.clone());
		Ok(client)
	}

	pub async fn len(&self) -> usize {
		self.clients.read().await.len()
	}
}
