//! Client-level error types shared across the authority, dispatcher, and resource wrappers.
//!
//! Every error is `Clone` so a failed coalesced mint can be handed to each waiter; underlying
//! causes are kept behind [`Arc`].

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Token minting failed (credentials, scope, or token endpoint problems).
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// A resource endpoint answered with a non-2xx status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// A network call exceeded its deadline.
	#[error(transparent)]
	Timeout(#[from] TimeoutError),
	/// Transport failure (DNS, TCP, TLS) while calling a resource endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A successful response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// HTTP status attached to the failure, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(e) => Some(e.status),
			Self::Authentication(e) => e.status(),
			_ => None,
		}
	}

	/// Returns `true` for `401 Unauthorized` responses from a resource endpoint.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Api(ApiError { status: 401, .. }))
	}
}

/// Network call that produced a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallStage {
	/// Token endpoint exchange.
	Mint,
	/// Resource endpoint call.
	Api,
}
impl CallStage {
	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Mint => "mint",
			Self::Api => "api",
		}
	}
}
impl Display for CallStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token endpoint failures.
#[derive(Clone, Debug, ThisError)]
pub enum AuthenticationError {
	/// Client authentication failed or the credential is malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The provider refused to grant one or more requested scopes.
	#[error("Requested scopes were denied: {reason}.")]
	ScopeDenied {
		/// Provider- or client-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The token endpoint rejected the request for another reason.
	#[error("Token endpoint rejected the request: {reason}.")]
	Rejected {
		/// Provider- or client-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The token endpoint answered with a body that could not be parsed.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token response carried neither `expires_in` nor `expires_at`.
	#[error("Token endpoint response is missing an expiry.")]
	MissingExpiry,
	/// Token response carried an expiry at or before the mint instant.
	#[error("Token endpoint returned a non-positive lifetime.")]
	NonPositiveExpiry,
	/// Token response carried an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiryOutOfRange,
	/// Token endpoint could not be reached.
	#[error("Token endpoint is unreachable.")]
	Unreachable {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
	},
}
impl AuthenticationError {
	/// Wraps a transport-specific network error.
	pub fn unreachable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unreachable { source: Arc::new(src) }
	}

	/// HTTP status code returned by the token endpoint, when available.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::InvalidClient { status, .. }
			| Self::ScopeDenied { status, .. }
			| Self::Rejected { status, .. }
			| Self::MalformedResponse { status, .. } => *status,
			_ => None,
		}
	}
}

/// Non-2xx response from a resource endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("API request failed with status {status}: {}.", summarize(.message, .code, .body))]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Provider error code, when the payload was structured.
	pub code: Option<String>,
	/// Provider error message, when the payload was structured.
	pub message: Option<String>,
	/// Raw response body, kept when the payload was not structured JSON.
	pub body: Option<String>,
}
impl ApiError {
	/// Builds an error from a status code and raw response bytes.
	///
	/// Structured payloads (`{"code": .., "message": ..}` or `{"error": ..}`) populate
	/// [`code`](Self::code) and [`message`](Self::message); anything else is kept verbatim in
	/// [`body`](Self::body).
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		#[derive(Deserialize)]
		struct Payload {
			code: Option<JsonValue>,
			#[serde(alias = "error")]
			message: Option<String>,
		}

		let raw = (!body.is_empty()).then(|| String::from_utf8_lossy(body).into_owned());

		match serde_json::from_slice::<Payload>(body) {
			Ok(Payload { code, message }) if code.is_some() || message.is_some() => Self {
				status,
				code: code.map(|value| match value {
					JsonValue::String(s) => s,
					other => other.to_string(),
				}),
				message,
				body: None,
			},
			_ => Self { status, code: None, message: None, body: raw },
		}
	}
}

fn summarize<'a>(
	message: &'a Option<String>,
	code: &'a Option<String>,
	body: &'a Option<String>,
) -> &'a str {
	message.as_deref().or(code.as_deref()).or(body.as_deref()).unwrap_or("no details")
}

/// Deadline exceeded during a network call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("The {stage} request timed out.")]
pub struct TimeoutError {
	/// Call that timed out.
	pub stage: CallStage,
}

/// Transport-level failures (network, IO) on resource calls.
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[source] Arc<std::io::Error>),
	/// Transport reported a failure without a typed cause.
	#[error("HTTP client error occurred while calling the API: {0}.")]
	Other(String),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(Arc::new(e))
	}
}

/// Response body decoding failure.
#[derive(Clone, Debug, ThisError)]
#[error("Failed to decode the {target} response body.")]
pub struct DecodeError {
	/// Human-readable description of what was being decoded.
	pub target: &'static str,
	/// Path-aware parsing failure.
	#[source]
	pub source: Arc<serde_path_to_error::Error<serde_json::Error>>,
}
impl DecodeError {
	/// Wraps a path-aware decoding failure.
	pub fn new(target: &'static str, source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self { target, source: Arc::new(source) }
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest(#[source] Arc<oauth2::http::Error>),
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode(#[source] Arc<serde_json::Error>),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Request path cannot be joined onto the API base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identifier validation failed.
	#[error("Identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Token acquisition requires at least one scope.
	#[error("Token requests require at least one scope.")]
	EmptyScope,
	/// Account-scoped request without a configured platform account.
	#[error("Account-scoped requests require a platform account identifier on the credential.")]
	MissingPlatformAccount,
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}

	/// Wraps an `http` request builder failure.
	pub fn http_request(src: oauth2::http::Error) -> Self {
		Self::HttpRequest(Arc::new(src))
	}

	/// Wraps a JSON encoding failure.
	pub fn request_encode(src: serde_json::Error) -> Self {
		Self::RequestEncode(Arc::new(src))
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

impl From<crate::auth::ScopeValidationError> for Error {
	fn from(e: crate::auth::ScopeValidationError) -> Self {
		ConfigError::from(e).into()
	}
}
impl From<crate::provider::ProviderDescriptorError> for Error {
	fn from(e: crate::provider::ProviderDescriptorError) -> Self {
		ConfigError::from(e).into()
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		ConfigError::from(e).into()
	}
}
