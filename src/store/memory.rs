//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{CacheKey, EvictOutcome, TokenStore},
};

/// Process-local token cache shared by every clone.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<CacheKey, TokenRecord>>>);
impl TokenStore for MemoryStore {
	fn fetch(&self, key: &CacheKey) -> Option<TokenRecord> {
		self.0.read().get(key).cloned()
	}

	fn save(&self, record: TokenRecord) {
		let key = CacheKey::for_record(&record);

		self.0.write().insert(key, record);
	}

	fn evict_if(&self, key: &CacheKey, access_token: &str) -> EvictOutcome {
		let mut guard = self.0.write();

		match guard.get(key) {
			Some(existing) if existing.access_token.matches(access_token) => {
				guard.remove(key);

				EvictOutcome::Evicted
			},
			Some(_) => EvictOutcome::Replaced,
			None => EvictOutcome::Missing,
		}
	}

	fn remove(&self, key: &CacheKey) -> Option<TokenRecord> {
		self.0.write().remove(key)
	}

	fn len(&self) -> usize {
		self.0.read().len()
	}
}
