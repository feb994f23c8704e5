//! Authenticated request execution with a single retry after `401 Unauthorized`.
//!
//! Each call walks an explicit state machine:
//!
//! ```text
//! Pending -> TokenResolved -> RequestSent -> Succeeded
//!                                         -> Failed
//!                                         -> RetryingAfterAuthFailure -> TokenResolved -> ...
//! ```
//!
//! A `401` evicts the rejected token (only if the cache still holds it) and re-runs the whole
//! operation once with a freshly minted token. The retry reuses the same idempotency key. A
//! second `401` is surfaced as [`ApiError`](crate::error::ApiError).

mod metrics;
mod request;

pub use metrics::*;
pub use request::*;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	authority::TokenAuthority,
	error::{ApiError, CallStage, ConfigError},
	http::{HttpTransport, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport stack.
pub type ReqwestRequestDispatcher =
	RequestDispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper>;

const JSON: &str = "application/json";

/// Which attempt of an operation is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchAttempt {
	/// First try.
	Initial,
	/// The single re-try after the first attempt was answered with `401`.
	RetryAfterUnauthorized,
}
impl DispatchAttempt {
	/// Next attempt after a `401`, or `None` once the retry has been used.
	pub fn after_unauthorized(self) -> Option<Self> {
		match self {
			Self::Initial => Some(Self::RetryAfterUnauthorized),
			Self::RetryAfterUnauthorized => None,
		}
	}
}

/// Progress of one `execute` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
	/// Nothing has happened yet.
	Pending,
	/// A bearer token is available.
	TokenResolved,
	/// The HTTP request is in flight.
	RequestSent,
	/// The first attempt got `401`; the token was evicted.
	RetryingAfterAuthFailure,
	/// A 2xx response was decoded.
	Succeeded,
	/// An error is being surfaced.
	Failed,
}
impl DispatchState {
	/// Returns `true` if the machine may move from `self` to `next`.
	pub fn can_transition_to(self, next: Self) -> bool {
		use DispatchState::*;

		matches!(
			(self, next),
			(Pending, TokenResolved)
				| (Pending, Failed)
				| (TokenResolved, RequestSent)
				| (TokenResolved, Failed)
				| (RequestSent, Succeeded)
				| (RequestSent, Failed)
				| (RequestSent, RetryingAfterAuthFailure)
				| (RetryingAfterAuthFailure, TokenResolved)
				| (RetryingAfterAuthFailure, Failed)
		)
	}

	/// Returns `true` for `Succeeded` and `Failed`.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Succeeded | Self::Failed)
	}
}

struct StateCursor(DispatchState);
impl StateCursor {
	fn advance(&mut self, next: DispatchState) {
		debug_assert!(self.0.can_transition_to(next), "{:?} -> {next:?} is not allowed", self.0);

		self.0 = next;
	}
}

/// Executes [`RequestSpec`]s with tokens from a shared [`TokenAuthority`].
pub struct RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	authority: TokenAuthority<C, M>,
	metrics: Arc<DispatchMetrics>,
}
impl<C, M> RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a dispatcher that shares `authority`'s transport and cache.
	pub fn new(authority: TokenAuthority<C, M>) -> Self {
		Self { authority, metrics: Default::default() }
	}

	/// Underlying token authority.
	pub fn authority(&self) -> &TokenAuthority<C, M> {
		&self.authority
	}

	/// Request counters.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.metrics
	}

	/// Performs `spec`, retrying once with a fresh token after a `401`.
	pub async fn execute(&self, spec: &RequestSpec) -> Result<ApiPayload> {
		const KIND: OperationKind = OperationKind::Dispatch;

		let span = OperationSpan::new(KIND, "execute");
		let detail = format!("{} {}", spec.method, spec.path);

		self.metrics.record_call();
		obs::observe(KIND, OperationOutcome::Attempt, &detail);

		let result = span.instrument(self.run(spec, &detail)).await;

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

	async fn run(&self, spec: &RequestSpec, detail: &str) -> Result<ApiPayload> {
		let mut state = StateCursor(DispatchState::Pending);
		let mut attempt = DispatchAttempt::Initial;

		loop {
			let token = match self.authority.acquire(&spec.scopes, spec.account.as_ref()).await {
				Ok(token) => token,
				Err(e) => {
					state.advance(DispatchState::Failed);

					return Err(e);
				},
			};

			state.advance(DispatchState::TokenResolved);

			let outcome = match self.build_request(spec, &token) {
				Ok(request) => {
					state.advance(DispatchState::RequestSent);

					self.send(request).await
				},
				Err(e) => Err(e),
			};

			match outcome {
				Ok(payload) => {
					state.advance(DispatchState::Succeeded);

					return Ok(payload);
				},
				Err(e) if e.is_unauthorized() => match attempt.after_unauthorized() {
					Some(next) => {
						self.authority.evict(&spec.scopes, spec.account.as_ref(), &token);
						self.metrics.record_retry();
						obs::observe(OperationKind::Dispatch, OperationOutcome::Retry, detail);
						state.advance(DispatchState::RetryingAfterAuthFailure);

						attempt = next;
					},
					None => {
						state.advance(DispatchState::Failed);

						return Err(e);
					},
				},
				Err(e) => {
					state.advance(DispatchState::Failed);

					return Err(e);
				},
			}
		}
	}

	fn build_request(&self, spec: &RequestSpec, token: &TokenRecord) -> Result<HttpRequest> {
		let descriptor = self.authority.descriptor();
		let mut url = descriptor.api_url(&spec.path)?;

		if !spec.query.is_empty() {
			url.query_pairs_mut().extend_pairs(spec.query.iter());
		}

		let mut builder = oauth2::http::Request::builder()
			.method(spec.method.clone())
			.uri(url.as_str())
			.header(AUTHORIZATION, token.bearer())
			.header(ACCEPT, JSON);

		if spec.needs_account_header() {
			let platform = self
				.authority
				.credential()
				.platform_account
				.as_ref()
				.ok_or(ConfigError::MissingPlatformAccount)?;

			builder = builder.header(descriptor.quirks.account_header.as_str(), &**platform);
		}
		if let Some(key) = &spec.idempotency_key {
			builder = builder.header(descriptor.quirks.idempotency_header.as_str(), key.as_str());
		}
		for (name, value) in &spec.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		let body = match &spec.body {
			Some(body) => {
				builder = builder.header(CONTENT_TYPE, JSON);

				serde_json::to_vec(body).map_err(ConfigError::request_encode)?
			},
			None => Vec::new(),
		};

		builder.body(body).map_err(|e| ConfigError::http_request(e).into())
	}

	async fn send(&self, request: HttpRequest) -> Result<ApiPayload> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.authority.http_client().with_metadata(meta.clone());
		let response: HttpResponse = handle.call(request).await.map_err(|e| {
			self.authority.transport_mapper().map_transport_error(
				CallStage::Api,
				meta.take().as_ref(),
				e,
			)
		})?;
		let status = response.status();

		if status.is_success() {
			Ok(ApiPayload::from_body(response.body())?)
		} else {
			Err(ApiError::from_response(status.as_u16(), response.body()).into())
		}
	}
}
#[cfg(feature = "reqwest")]
impl RequestDispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a dispatcher over a fresh reqwest-backed authority.
	pub fn with_credential(
		credential: crate::auth::Credential,
		descriptor: crate::provider::ProviderDescriptor,
	) -> Result<Self> {
		Ok(Self::new(TokenAuthority::new(credential, descriptor)?))
	}
}
impl<C, M> Clone for RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { authority: self.authority.clone(), metrics: self.metrics.clone() }
	}
}
impl<C, M> Debug for RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDispatcher").field("authority", &self.authority).finish()
	}
}
