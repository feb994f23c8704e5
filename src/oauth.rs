//! Client-credentials mint facade over the `oauth2` crate, plus transport error mapping.

pub use oauth2;

// std
use std::io::ErrorKind;
// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, ExtraTokenFields,
	HttpClientError, RequestTokenError, StandardRevocableToken, StandardTokenResponse,
	TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{AccountId, Credential, ScopeSet, TokenRecord},
	error::{AuthenticationError, CallStage, ConfigError, TimeoutError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	provider::{ClientAuthMethod, MintErrorContext, MintErrorKind, MintStrategy, ProviderDescriptor},
};

type MintTokenResponse = StandardTokenResponse<MintTokenFields, BasicTokenType>;
type MintOAuthClient = oauth2::Client<
	BasicErrorResponse,
	MintTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type MintRequestError<E> = RequestTokenError<HttpClientError<E>, BasicErrorResponse>;

/// Maps HTTP transport failures into client [`Error`] values.
///
/// The same mapper serves token mints and resource calls; `stage` tells them apart so network
/// failures become [`AuthenticationError::Unreachable`] on mints and [`TransportError`] on
/// resource calls.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a client error.
	fn map_transport_error(
		&self,
		stage: CallStage,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Mapper for arbitrary transports.
///
/// Only I/O errors of kind [`ErrorKind::TimedOut`] are recognized as timeouts.
#[derive(Clone, Debug, Default)]
pub struct BasicTransportErrorMapper;
impl<E> TransportErrorMapper<E> for BasicTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(
		&self,
		stage: CallStage,
		_: Option<&ResponseMetadata>,
		err: HttpClientError<E>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => network_failure(stage, *inner),
			HttpClientError::Http(inner) => ConfigError::http_request(inner).into(),
			HttpClientError::Io(inner) => map_io_error(stage, inner),
			HttpClientError::Other(message) => other_failure(stage, message),
			_ => other_failure(stage, "unknown transport failure".into()),
		}
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		stage: CallStage,
		_: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(stage, *inner),
			HttpClientError::Http(inner) => ConfigError::http_request(inner).into(),
			HttpClientError::Io(inner) => map_io_error(stage, inner),
			HttpClientError::Other(message) => other_failure(stage, message),
			_ => other_failure(stage, "unknown transport failure".into()),
		}
	}
}

/// Extra token response fields understood by the mint facade.
///
/// Some deployments return an absolute RFC 3339 `expires_at` instead of (or next to)
/// `expires_in`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MintTokenFields {
	/// Absolute expiry instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<OffsetDateTime>,
}
impl ExtraTokenFields for MintTokenFields {}

/// Performs client-credentials exchanges for one descriptor/credential pair.
pub(crate) struct MintFacade<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: MintOAuthClient,
	descriptor: &'a ProviderDescriptor,
	strategy: &'a dyn MintStrategy,
	http_client: &'a C,
	error_mapper: &'a M,
}
impl<'a, C, M> MintFacade<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &'a ProviderDescriptor,
		credential: &Credential,
		strategy: &'a dyn MintStrategy,
		http_client: &'a C,
		error_mapper: &'a M,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client: MintOAuthClient = oauth2::Client::new(ClientId::new(credential.client_id.to_string()))
			.set_client_secret(ClientSecret::new(credential.client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, descriptor, strategy, http_client, error_mapper })
	}

	/// Mints a token for `scope`/`account`; `issued_at` anchors relative expiries.
	pub(crate) async fn mint(
		&self,
		scope: &ScopeSet,
		account: Option<&AccountId>,
		issued_at: OffsetDateTime,
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let mut form = BTreeMap::new();

		self.strategy.augment_token_request(&self.descriptor.quirks.account_param, account, &mut form);

		let mut request = self
			.oauth_client
			.exchange_client_credentials()
			.add_extra_param("scope", scope.join(self.descriptor.quirks.scope_delimiter));

		for (key, value) in form {
			if key != "grant_type" && key != "scope" {
				request = request.add_extra_param(key, value);
			}
		}

		let response = request
			.request_async(&handle)
			.await
			.map_err(|err| self.map_request_error(meta.take(), err))?;

		self.record_from_response(scope, account, issued_at, response)
	}

	fn record_from_response(
		&self,
		scope: &ScopeSet,
		account: Option<&AccountId>,
		issued_at: OffsetDateTime,
		response: MintTokenResponse,
	) -> Result<TokenRecord> {
		let relative = match response.expires_in() {
			Some(lifetime) => {
				let secs = i64::try_from(lifetime.as_secs())
					.map_err(|_| AuthenticationError::ExpiryOutOfRange)?;

				Some(
					issued_at
						.checked_add(Duration::seconds(secs))
						.ok_or(AuthenticationError::ExpiryOutOfRange)?,
				)
			},
			None => None,
		};
		let expires_at = match (relative, response.extra_fields().expires_at) {
			(Some(relative), Some(absolute)) => relative.min(absolute),
			(Some(instant), None) | (None, Some(instant)) => instant,
			(None, None) => return Err(AuthenticationError::MissingExpiry.into()),
		};

		if expires_at <= issued_at {
			return Err(AuthenticationError::NonPositiveExpiry.into());
		}

		if let Some(scopes) = response.scopes() {
			let delimiter = self.descriptor.quirks.scope_delimiter;
			let returned = ScopeSet::new(
				scopes
					.iter()
					.flat_map(|value| value.split(delimiter).map(str::to_owned).collect::<Vec<_>>())
					.filter(|value| !value.is_empty()),
			)
			.map_err(ConfigError::from)?;

			if !returned.covers(scope) {
				let missing = scope.iter().filter(|s| !returned.contains(s)).collect::<Vec<_>>();

				return Err(AuthenticationError::ScopeDenied {
					reason: format!("token endpoint omitted {}", missing.join(" ")),
					status: Some(200),
				}
				.into());
			}
		}

		TokenRecord::builder(scope.clone(), account.cloned())
			.access_token(response.access_token().secret().to_owned())
			.issued_at(issued_at)
			.expires_at(expires_at)
			.build()
			.map_err(|err| ConfigError::from(err).into())
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: MintRequestError<C::TransportError>,
	) -> Error {
		let status = meta.as_ref().and_then(|value| value.status);

		match err {
			RequestTokenError::ServerResponse(response) => {
				let mut ctx =
					MintErrorContext::default().with_oauth_error(response.error().as_ref());

				if let Some(description) = response.error_description() {
					ctx = ctx.with_error_description(description.clone());
				}
				if let Some(status) = status {
					ctx = ctx.with_http_status(status);
				}

				self.classify(ctx)
			},
			RequestTokenError::Request(error) =>
				self.error_mapper.map_transport_error(CallStage::Mint, meta.as_ref(), error),
			RequestTokenError::Parse(error, body) => match status {
				Some(code) if !(200..300).contains(&code) => self.classify(
					MintErrorContext::default()
						.with_http_status(code)
						.with_body_preview(String::from_utf8_lossy(&body)),
				),
				_ => AuthenticationError::MalformedResponse { source: Arc::new(error), status }
					.into(),
			},
			RequestTokenError::Other(message) => match status {
				Some(code) if !(200..300).contains(&code) => self.classify(
					MintErrorContext::default().with_http_status(code).with_body_preview(message),
				),
				_ => AuthenticationError::Rejected { reason: message, status }.into(),
			},
		}
	}

	fn classify(&self, ctx: MintErrorContext) -> Error {
		let reason = ctx.reason();
		let status = ctx.http_status;

		match self.strategy.classify_token_error(&ctx) {
			MintErrorKind::InvalidClient => AuthenticationError::InvalidClient { reason, status },
			MintErrorKind::ScopeDenied => AuthenticationError::ScopeDenied { reason, status },
			MintErrorKind::Rejected => AuthenticationError::Rejected { reason, status },
		}
		.into()
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(stage: CallStage, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TimeoutError { stage }.into();
	}

	network_failure(stage, err)
}

fn map_io_error(stage: CallStage, err: std::io::Error) -> Error {
	if err.kind() == ErrorKind::TimedOut {
		return TimeoutError { stage }.into();
	}

	match stage {
		CallStage::Mint => AuthenticationError::unreachable(err).into(),
		CallStage::Api => TransportError::from(err).into(),
	}
}

fn network_failure(stage: CallStage, err: impl 'static + Send + Sync + StdError) -> Error {
	match stage {
		CallStage::Mint => AuthenticationError::unreachable(err).into(),
		CallStage::Api => TransportError::network(err).into(),
	}
}

fn other_failure(stage: CallStage, message: String) -> Error {
	match stage {
		CallStage::Mint => AuthenticationError::unreachable(TransportError::Other(message)).into(),
		CallStage::Api => TransportError::Other(message).into(),
	}
}
