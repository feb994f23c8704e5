// self
use crate::_prelude::*;

/// Provider-specific wire names that influence how tokens are requested and calls are scoped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing the `scope` parameter.
	pub scope_delimiter: char,
	/// Form parameter carrying the connected account on token requests.
	pub account_param: String,
	/// Header carrying the platform account on account-scoped API calls.
	pub account_header: String,
	/// Header carrying idempotency keys on mutating API calls.
	pub idempotency_header: String,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			scope_delimiter: ' ',
			account_param: "account_id".into(),
			account_header: "x-account-id".into(),
			idempotency_header: "x-idempotency-key".into(),
		}
	}
}
