//! Request descriptions and decoded response payloads.

// crates.io
use serde::de::DeserializeOwned;
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet},
	error::{ConfigError, DecodeError},
};

pub use oauth2::http::Method;

/// Everything the dispatcher needs to perform one resource call.
#[derive(Clone, Debug)]
pub struct RequestSpec {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the API base URL.
	pub path: String,
	/// Capability scopes the token must carry.
	pub scopes: ScopeSet,
	/// Connected account the call acts on.
	pub account: Option<AccountId>,
	/// JSON request body.
	pub body: Option<JsonValue>,
	/// Query parameters, in order.
	pub query: Vec<(String, String)>,
	/// Caller headers forwarded verbatim.
	pub headers: Vec<(String, String)>,
	/// Idempotency key sent under the descriptor's idempotency header.
	pub idempotency_key: Option<String>,
	/// Sends the platform account header even without a connected account.
	pub platform_scoped: bool,
}
impl RequestSpec {
	/// Creates a bodyless request for `path` requiring `scopes`.
	pub fn new(method: Method, path: impl Into<String>, scopes: ScopeSet) -> Self {
		Self {
			method,
			path: path.into(),
			scopes,
			account: None,
			body: None,
			query: Vec::new(),
			headers: Vec::new(),
			idempotency_key: None,
			platform_scoped: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>, scopes: ScopeSet) -> Self {
		Self::new(Method::GET, path, scopes)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>, scopes: ScopeSet) -> Self {
		Self::new(Method::POST, path, scopes)
	}

	/// Scopes the call (and its token) to a connected account.
	pub fn account(mut self, account: AccountId) -> Self {
		self.account = Some(account);

		self
	}

	/// Attaches an already-encoded JSON body.
	pub fn body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON request body.
	pub fn json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(ConfigError::request_encode)?;

		Ok(self.body(value))
	}

	/// Appends a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends a query parameter when `value` is present.
	pub fn query_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
		match value {
			Some(value) => self.query(name, value),
			None => self,
		}
	}

	/// Appends a header forwarded verbatim.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Uses `key` as the idempotency key; retries reuse the same value.
	pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
		self.idempotency_key = Some(key.into());

		self
	}

	/// Generates a random (UUID v4) idempotency key.
	pub fn with_generated_idempotency_key(self) -> Self {
		self.idempotency_key(Uuid::new_v4().to_string())
	}

	/// Marks the call as platform-scoped.
	pub fn platform_scoped(mut self) -> Self {
		self.platform_scoped = true;

		self
	}

	/// Whether the account header must be sent.
	pub fn needs_account_header(&self) -> bool {
		self.platform_scoped || self.account.is_some()
	}
}

/// Decoded body of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiPayload {
	/// JSON body.
	Json(JsonValue),
	/// No body (for example `204 No Content`).
	Empty,
}
impl ApiPayload {
	/// Parses a 2xx response body; blank bodies become [`ApiPayload::Empty`].
	pub fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Self::Empty);
		}

		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map(Self::Json)
			.map_err(|e| DecodeError::new("response", e))
	}

	/// Returns `true` for [`ApiPayload::Empty`].
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// Returns the JSON value, if any.
	pub fn into_json(self) -> Option<JsonValue> {
		match self {
			Self::Json(value) => Some(value),
			Self::Empty => None,
		}
	}

	/// Decodes the payload into `T`; an empty payload decodes as JSON `null`.
	pub fn decode<T>(self, target: &'static str) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let value = self.into_json().unwrap_or(JsonValue::Null);

		serde_path_to_error::deserialize(value).map_err(|e| DecodeError::new(target, e))
	}
}
