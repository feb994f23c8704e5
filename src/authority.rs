//! Token minting, caching, and per-key mint coalescing.
//!
//! [`TokenAuthority`] owns the token cache of one client instance. A cached record is handed
//! out while `now < expires_at - safety_margin`; otherwise a client-credentials mint runs.
//! Concurrent acquisitions for the same key share a single in-flight mint: the first caller
//! registers a [`MintFlight`] and runs the exchange, later callers attach to the same flight
//! and observe its result (or failure). The flight is unregistered the moment the mint
//! settles, so a failure is never replayed to callers that arrive afterwards. Different keys
//! only contend on the short synchronous registry lookup.

mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, Credential, ScopeSet, TokenRecord},
	clock::{Clock, SystemClock},
	error::ConfigError,
	http::HttpTransport,
	oauth::{MintFacade, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::{DefaultMintStrategy, MintStrategy, ProviderDescriptor},
	store::{CacheKey, EvictOutcome, MemoryStore, TokenStore},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Authority specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenAuthority = TokenAuthority<ReqwestHttpClient, ReqwestTransportErrorMapper>;

type FlightMap = Mutex<HashMap<CacheKey, Arc<MintFlight>>>;

/// Default window before expiry in which a cached token is no longer handed out.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(5);

/// In-flight mint shared by every caller waiting on the same cache key.
#[derive(Debug)]
pub struct MintFlight {
	outcome: AsyncOnceCell<Result<TokenRecord>>,
}
impl Default for MintFlight {
	fn default() -> Self {
		Self { outcome: AsyncOnceCell::new() }
	}
}

enum Lookup {
	Hit(TokenRecord),
	Join(Arc<MintFlight>),
}

/// Mints, caches, and coalesces bearer tokens for one credential and provider.
///
/// Clones share the cache, the flight registry, and the metrics.
pub struct TokenAuthority<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	credential: Arc<Credential>,
	descriptor: Arc<ProviderDescriptor>,
	strategy: Arc<dyn MintStrategy>,
	store: Arc<dyn TokenStore>,
	clock: Arc<dyn Clock>,
	safety_margin: Duration,
	metrics: Arc<MintMetrics>,
	flights: Arc<FlightMap>,
}
impl<C, M> TokenAuthority<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an authority that reuses the caller-provided transport + mapper pair.
	///
	/// Defaults: [`DefaultMintStrategy`], an empty [`MemoryStore`], [`SystemClock`], and
	/// [`DEFAULT_SAFETY_MARGIN`].
	pub fn with_http_client(
		credential: Credential,
		descriptor: ProviderDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			credential: Arc::new(credential),
			descriptor: Arc::new(descriptor),
			strategy: Arc::new(DefaultMintStrategy),
			store: Arc::new(MemoryStore::default()),
			clock: Arc::new(SystemClock),
			safety_margin: DEFAULT_SAFETY_MARGIN,
			metrics: Default::default(),
			flights: Default::default(),
		}
	}

	/// Replaces the mint strategy.
	pub fn with_strategy(mut self, strategy: impl 'static + MintStrategy) -> Self {
		self.strategy = Arc::new(strategy);

		self
	}

	/// Replaces the token store. Records cached in the previous store are not carried over.
	pub fn with_store(mut self, store: impl 'static + TokenStore) -> Self {
		self.store = Arc::new(store);

		self
	}

	/// Replaces the clock used for freshness checks and relative expiries.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Overrides the safety margin; negative values are clamped to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Provider descriptor used for mints and resource URLs.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Client credential presented to the token endpoint.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// Shared transport.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Shared transport error mapper.
	pub fn transport_mapper(&self) -> &Arc<M> {
		&self.transport_mapper
	}

	/// Active safety margin.
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Mint and cache counters.
	pub fn metrics(&self) -> &MintMetrics {
		&self.metrics
	}

	/// Returns a token for `scope`/`account`, minting one when no fresh record is cached.
	///
	/// Mint failures leave the cache untouched and are shared with every caller that joined the
	/// same in-flight mint. Nothing is retried internally.
	pub async fn acquire(
		&self,
		scope: &ScopeSet,
		account: Option<&AccountId>,
	) -> Result<TokenRecord> {
		const KIND: OperationKind = OperationKind::Acquire;

		if scope.is_empty() {
			return Err(ConfigError::EmptyScope.into());
		}

		let key = CacheKey::new(scope, account);
		let flight = match self.lookup_or_join(&key) {
			Lookup::Hit(record) => {
				self.metrics.record_cache_hit();
				obs::observe(KIND, OperationOutcome::CacheHit, &key.to_string());

				return Ok(record);
			},
			Lookup::Join(flight) => flight,
		};
		let span = OperationSpan::new(KIND, "acquire");

		span.instrument(async {
			flight
				.outcome
				.get_or_init(|| self.mint_and_store(&key, scope, account, &flight))
				.await
				.clone()
		})
		.await
	}

	/// Returns the cached record for `scope`/`account` if it is still fresh, without minting.
	pub fn cached(&self, scope: &ScopeSet, account: Option<&AccountId>) -> Option<TokenRecord> {
		self.fresh(&CacheKey::new(scope, account))
	}

	/// Evicts the cached record for `scope`/`account` only if it still holds `rejected`'s
	/// token value, so a fresher token minted concurrently survives.
	pub fn evict(
		&self,
		scope: &ScopeSet,
		account: Option<&AccountId>,
		rejected: &TokenRecord,
	) -> EvictOutcome {
		self.store.evict_if(&CacheKey::new(scope, account), rejected.access_token.expose())
	}

	/// Number of cached records, fresh or not.
	pub fn cached_len(&self) -> usize {
		self.store.len()
	}

	fn fresh(&self, key: &CacheKey) -> Option<TokenRecord> {
		let now = self.clock.now();

		self.store.fetch(key).filter(|record| record.is_fresh_at(now, self.safety_margin))
	}

	fn lookup_or_join(&self, key: &CacheKey) -> Lookup {
		if let Some(record) = self.fresh(key) {
			return Lookup::Hit(record);
		}

		let mut flights = self.flights.lock();

		// A mint may have settled between the first lookup and taking the lock.
		if let Some(record) = self.fresh(key) {
			return Lookup::Hit(record);
		}

		Lookup::Join(flights.entry(key.clone()).or_default().clone())
	}

	async fn mint_and_store(
		&self,
		key: &CacheKey,
		scope: &ScopeSet,
		account: Option<&AccountId>,
		flight: &Arc<MintFlight>,
	) -> Result<TokenRecord> {
		let result = self.mint(key, scope, account).await;
		let mut flights = self.flights.lock();

		if let Ok(record) = &result {
			self.store.save(record.clone());
		}
		if flights.get(key).is_some_and(|current| Arc::ptr_eq(current, flight)) {
			flights.remove(key);
		}

		result
	}

	async fn mint(
		&self,
		key: &CacheKey,
		scope: &ScopeSet,
		account: Option<&AccountId>,
	) -> Result<TokenRecord> {
		const KIND: OperationKind = OperationKind::Mint;

		let span = OperationSpan::new(KIND, "mint");
		let detail = key.to_string();

		self.metrics.record_attempt();
		obs::observe(KIND, OperationOutcome::Attempt, &detail);

		let result = span
			.instrument(async {
				let facade = MintFacade::from_descriptor(
					&self.descriptor,
					&self.credential,
					self.strategy.as_ref(),
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
				)?;

				facade.mint(scope, account, self.clock.now()).await
			})
			.await;

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::observe(KIND, OperationOutcome::Success, &detail);
			},
			Err(e) => {
				self.metrics.record_failure();
				obs::observe(KIND, OperationOutcome::Failure, &e.to_string());
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl TokenAuthority<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an authority that provisions its own reqwest transport (redirects disabled).
	pub fn new(credential: Credential, descriptor: ProviderDescriptor) -> Result<Self> {
		Ok(Self::with_http_client(
			credential,
			descriptor,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Clone for TokenAuthority<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			credential: self.credential.clone(),
			descriptor: self.descriptor.clone(),
			strategy: self.strategy.clone(),
			store: self.store.clone(),
			clock: self.clock.clone(),
			safety_margin: self.safety_margin,
			metrics: self.metrics.clone(),
			flights: self.flights.clone(),
		}
	}
}
impl<C, M> Debug for TokenAuthority<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAuthority")
			.field("descriptor", &self.descriptor.id)
			.field("credential", &self.credential)
			.field("safety_margin", &self.safety_margin)
			.field("cached", &self.store.len())
			.finish()
	}
}
