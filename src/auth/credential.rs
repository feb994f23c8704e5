//! Static client identity presented to the token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ClientId, TokenSecret},
};

/// Client-credentials identity, immutable for the lifetime of a client instance.
///
/// The optional platform account identifies the caller's own account; it is sent in the
/// account-scoping header of connected-account requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret; never logged.
	pub client_secret: TokenSecret,
	/// Platform account identifier used by the account-scoping header.
	pub platform_account: Option<AccountId>,
}
impl Credential {
	/// Creates a credential without a platform account.
	pub fn new(client_id: ClientId, client_secret: impl Into<String>) -> Self {
		Self { client_id, client_secret: TokenSecret::new(client_secret), platform_account: None }
	}

	/// Attaches the platform account identifier.
	pub fn with_platform_account(mut self, account: AccountId) -> Self {
		self.platform_account = Some(account);

		self
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("platform_account", &self.platform_account)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_secret() {
		let credential = Credential::new(
			ClientId::new("public-key").expect("Client identifier fixture should be valid."),
			"private-key",
		)
		.with_platform_account(AccountId::new("platform-1").expect("Account fixture should be valid."));
		let rendered = format!("{credential:?}");

		assert!(rendered.contains("public-key"));
		assert!(rendered.contains("platform-1"));
		assert!(!rendered.contains("private-key"));
	}
}
