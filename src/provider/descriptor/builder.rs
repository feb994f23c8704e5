// std
use std::net::IpAddr;
// crates.io
use oauth2::http::HeaderName;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderId},
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// API base URL is mandatory.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Descriptor identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// A preset URL could not be parsed.
	#[error("Descriptor URL is invalid: {url}.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// API base URLs cannot carry query strings or fragments.
	#[error("The API base URL cannot carry a query or fragment: {url}.")]
	InvalidApiBase {
		/// API base URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// Header and form parameter names must be valid HTTP tokens.
	#[error("The {field} value `{value}` is not a valid name.")]
	InvalidName {
		/// Quirk field that failed validation.
		field: &'static str,
		/// Rejected value.
		value: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Base URL resource paths are resolved against.
	pub api_base: Option<Url>,
	/// Token endpoint used for client-credentials mints.
	pub token_endpoint: Option<Url>,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			api_base: None,
			token_endpoint: None,
			preferred_client_auth_method: ClientAuthMethod::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the API base URL. A missing trailing `/` is appended on build.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let mut api = self.api_base.ok_or(ProviderDescriptorError::MissingApiBase)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;

		if !api.path().ends_with('/') {
			let path = format!("{}/", api.path());

			api.set_path(&path);
		}

		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { api, token },
			preferred_client_auth_method: self.preferred_client_auth_method,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	///
	/// Builders call this automatically; descriptors loaded through serde should be validated
	/// before use.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("api", &self.endpoints.api)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if self.endpoints.api.query().is_some()
			|| self.endpoints.api.fragment().is_some()
			|| !self.endpoints.api.path().ends_with('/')
		{
			return Err(ProviderDescriptorError::InvalidApiBase {
				url: self.endpoints.api.to_string(),
			});
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)?;
		validate_name("account_param", &self.quirks.account_param)?;
		validate_name("account_header", &self.quirks.account_header)?;
		validate_name("idempotency_header", &self.quirks.idempotency_header)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ProviderDescriptorError> {
	if HeaderName::from_bytes(value.as_bytes()).is_ok() {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InvalidName { field, value: value.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id() -> ProviderId {
		ProviderId::new("test").expect("Provider identifier fixture should be valid.")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_appends_trailing_slash_to_api_base() {
		let descriptor = ProviderDescriptor::builder(id())
			.api_base(url("https://api.example.com/v2"))
			.token_endpoint(url("https://api.example.com/oauth2/token"))
			.build()
			.expect("Descriptor should build.");

		assert_eq!(descriptor.endpoints.api.as_str(), "https://api.example.com/v2/");
		assert_eq!(
			descriptor.api_url("accounts").expect("Path should join.").as_str(),
			"https://api.example.com/v2/accounts"
		);
	}

	#[test]
	fn plain_http_is_only_allowed_on_loopback() {
		let local = ProviderDescriptor::builder(id())
			.api_base(url("http://127.0.0.1:8080/"))
			.token_endpoint(url("http://localhost:8080/oauth2/token"))
			.build();

		assert!(local.is_ok(), "Loopback hosts should accept plain HTTP.");

		let err = ProviderDescriptor::builder(id())
			.api_base(url("http://api.example.com/"))
			.token_endpoint(url("https://api.example.com/oauth2/token"))
			.build()
			.expect_err("Remote plain HTTP should be rejected.");

		assert_eq!(
			err,
			ProviderDescriptorError::InsecureEndpoint {
				endpoint: "api",
				url: "http://api.example.com/".into()
			}
		);
	}

	#[test]
	fn builder_requires_both_endpoints() {
		assert_eq!(
			ProviderDescriptor::builder(id())
				.token_endpoint(url("https://api.example.com/oauth2/token"))
				.build()
				.expect_err("Missing API base should fail."),
			ProviderDescriptorError::MissingApiBase
		);
		assert_eq!(
			ProviderDescriptor::builder(id())
				.api_base(url("https://api.example.com/"))
				.build()
				.expect_err("Missing token endpoint should fail."),
			ProviderDescriptorError::MissingTokenEndpoint
		);
	}

	#[test]
	fn quirks_are_validated() {
		let quirks = ProviderQuirks { account_header: "bad header".into(), ..Default::default() };
		let err = ProviderDescriptor::builder(id())
			.api_base(url("https://api.example.com/"))
			.token_endpoint(url("https://api.example.com/oauth2/token"))
			.quirks(quirks)
			.build()
			.expect_err("Header names with spaces should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InvalidName { field: "account_header", .. }));

		let quirks = ProviderQuirks { scope_delimiter: '\n', ..Default::default() };

		assert!(
			ProviderDescriptor::builder(id())
				.api_base(url("https://api.example.com/"))
				.token_endpoint(url("https://api.example.com/oauth2/token"))
				.quirks(quirks)
				.build()
				.is_err()
		);
	}
}
