//! Resource-oriented facade over the dispatcher.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	authority::TokenAuthority,
	dispatch::{ApiPayload, RequestDispatcher, RequestSpec},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	provider::ProviderDescriptor,
	resources::{Accounts, Cards, EnrichedAddresses, EnrichedProfiles, Transfers},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type MoovClient = Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Entry point for every resource API.
///
/// The client owns one [`TokenAuthority`] (and therefore one token cache); clones share it.
/// Resource handles such as [`Client::transfers`] borrow the client and are cheap to create.
pub struct Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: RequestDispatcher<C, M>,
}
impl<C, M> Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client over a caller-provided transport + mapper pair.
	pub fn with_http_client(
		credential: Credential,
		descriptor: ProviderDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self::with_authority(TokenAuthority::with_http_client(
			credential,
			descriptor,
			http_client,
			mapper,
		))
	}

	/// Creates a client around a pre-configured authority (custom store, clock, or margin).
	pub fn with_authority(authority: TokenAuthority<C, M>) -> Self {
		Self::from_dispatcher(RequestDispatcher::new(authority))
	}

	/// Creates a client around an existing dispatcher.
	pub fn from_dispatcher(dispatcher: RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Underlying dispatcher.
	pub fn dispatcher(&self) -> &RequestDispatcher<C, M> {
		&self.dispatcher
	}

	/// Underlying token authority.
	pub fn authority(&self) -> &TokenAuthority<C, M> {
		self.dispatcher.authority()
	}

	/// Accounts API.
	pub fn accounts(&self) -> Accounts<'_, C, M> {
		Accounts::new(&self.dispatcher)
	}

	/// Transfers API.
	pub fn transfers(&self) -> Transfers<'_, C, M> {
		Transfers::new(&self.dispatcher)
	}

	/// Cards API.
	pub fn cards(&self) -> Cards<'_, C, M> {
		Cards::new(&self.dispatcher)
	}

	/// Address autocomplete.
	pub fn enriched_addresses(&self) -> EnrichedAddresses<'_, C, M> {
		EnrichedAddresses::new(&self.dispatcher)
	}

	/// Profile enrichment.
	pub fn enriched_profiles(&self) -> EnrichedProfiles<'_, C, M> {
		EnrichedProfiles::new(&self.dispatcher)
	}

	/// Runs an arbitrary request; useful for endpoints without a typed wrapper.
	pub async fn execute(&self, spec: &RequestSpec) -> Result<ApiPayload> {
		self.dispatcher.execute(spec).await
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client for the production Moov API.
	pub fn new(credential: Credential) -> Result<Self> {
		Self::with_descriptor(credential, ProviderDescriptor::moov()?)
	}

	/// Creates a reqwest-backed client for a custom descriptor (sandbox, proxy, mock server).
	pub fn with_descriptor(credential: Credential, descriptor: ProviderDescriptor) -> Result<Self> {
		Ok(Self::with_authority(TokenAuthority::new(credential, descriptor)?))
	}
}
impl<C, M> Clone for Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { dispatcher: self.dispatcher.clone() }
	}
}
impl<C, M> Debug for Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client").field("dispatcher", &self.dispatcher).finish()
	}
}
