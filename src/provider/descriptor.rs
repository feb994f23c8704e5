//! Provider descriptor data structures shared by the authority and the dispatcher.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Wire-level naming toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId, error::ConfigError};

/// Production API base URL of the Moov platform.
pub const MOOV_API_URL: &str = "https://api.moov.io/";
/// Production token endpoint of the Moov platform.
pub const MOOV_TOKEN_URL: &str = "https://api.moov.io/oauth2/token";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Base URL every resource path is joined onto; always ends with `/`.
	pub api: Url,
	/// Token endpoint used for client-credentials mints.
	pub token: Url,
}

/// Immutable provider descriptor consumed by the authority and the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	#[serde(default)]
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Wire-level naming toggles.
	#[serde(default)]
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for the production Moov platform with default quirks.
	pub fn moov() -> Result<Self, ProviderDescriptorError> {
		let id = ProviderId::new("moov")?;

		Self::builder(id).api_base(parse(MOOV_API_URL)?).token_endpoint(parse(MOOV_TOKEN_URL)?).build()
	}

	/// Resolves a resource path (for example `accounts/{id}`) against the API base URL.
	pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		self.endpoints.api.join(path.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidPath { path: path.to_owned(), source }
		})
	}
}

fn parse(raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidUrl { url: raw.to_owned() })
}
