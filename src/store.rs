//! Token cache contract and the built-in in-memory implementation.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet, TokenRecord},
};

/// Cache backend contract used by the token authority.
///
/// Calls are synchronous and must not block on I/O; the authority invokes them while holding its
/// flight registry lock.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the record cached under `key`, if any.
	fn fetch(&self, key: &CacheKey) -> Option<TokenRecord>;

	/// Inserts or replaces the record under its own key.
	fn save(&self, record: TokenRecord);

	/// Removes the record under `key` only if its access token equals `access_token`.
	fn evict_if(&self, key: &CacheKey, access_token: &str) -> EvictOutcome;

	/// Unconditionally removes the record under `key`.
	fn remove(&self, key: &CacheKey) -> Option<TokenRecord>;

	/// Number of cached records.
	fn len(&self) -> usize;

	/// Returns `true` when nothing is cached.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Result of a compare-and-evict attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictOutcome {
	/// The cached token matched and was removed.
	Evicted,
	/// A different token is cached; nothing was removed.
	Replaced,
	/// Nothing is cached under the key.
	Missing,
}

/// Cache key: scope fingerprint plus optional connected account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Fingerprint of the normalized scope set.
	pub scope_fingerprint: String,
	/// Connected account, or `None` for platform-level tokens.
	pub account: Option<AccountId>,
}
impl CacheKey {
	/// Builds a key for the provided scope/account pair.
	pub fn new(scope: &ScopeSet, account: Option<&AccountId>) -> Self {
		Self { scope_fingerprint: scope.fingerprint(), account: account.cloned() }
	}

	/// Builds the key a record is stored under.
	pub fn for_record(record: &TokenRecord) -> Self {
		Self::new(&record.scope, record.account.as_ref())
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.account {
			Some(account) => write!(f, "{}@{account}", self.scope_fingerprint),
			None => write!(f, "{}@-", self.scope_fingerprint),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cache_key_uses_scope_fingerprint_and_account() {
		let scope_a = ScopeSet::new(["/accounts.read", "/transfers.read"])
			.expect("First scope fixture should be valid.");
		let scope_b = ScopeSet::new(["/transfers.read", "/accounts.read"])
			.expect("Second scope fixture should be valid.");
		let account = AccountId::new("acct-1").expect("Account fixture should be valid.");

		assert_eq!(CacheKey::new(&scope_a, None), CacheKey::new(&scope_b, None));
		assert_ne!(CacheKey::new(&scope_a, None), CacheKey::new(&scope_a, Some(&account)));
		assert!(CacheKey::new(&scope_a, Some(&account)).to_string().ends_with("@acct-1"));
		assert!(CacheKey::new(&scope_a, None).to_string().ends_with("@-"));
	}
}
