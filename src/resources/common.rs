//! Shapes and scope helpers shared by several resources.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet},
	error::ConfigError,
};

/// Arbitrary key/value pairs attached to accounts and transfers.
pub type Metadata = BTreeMap<String, String>;

/// Postal address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	/// Street address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_line1: Option<String>,
	/// Unit number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_line2: Option<String>,
	/// City.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	/// Two-character state or province code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_or_province: Option<String>,
	/// Postal code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub postal_code: Option<String>,
	/// Two-character country code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
}

/// Phone number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
	/// Phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub number: Option<String>,
	/// Country calling code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country_code: Option<String>,
}

/// Monetary amount in the smallest unit of `currency` (cents for USD).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
	/// Integer quantity in minor units.
	pub value: i64,
	/// Three-letter ISO 4217 code.
	pub currency: String,
}
impl Amount {
	/// Amount in US cents.
	pub fn usd(cents: i64) -> Self {
		Self { value: cents, currency: "USD".into() }
	}
}

/// Flattens a serializable criteria struct into query pairs.
///
/// `null`, zero, and empty fields are skipped and arrays are comma-joined, matching how the API
/// reads list filters such as `accountIDs`.
pub(crate) fn encode_query<T>(criteria: &T) -> Result<Vec<(String, String)>, ConfigError>
where
	T: ?Sized + Serialize,
{
	let value = serde_json::to_value(criteria).map_err(ConfigError::request_encode)?;
	let JsonValue::Object(fields) = value else {
		return Ok(Vec::new());
	};
	let mut pairs = Vec::with_capacity(fields.len());

	for (name, field) in fields {
		let rendered = match field {
			JsonValue::Null => continue,
			JsonValue::Number(n) if n.as_f64() == Some(0.) => continue,
			JsonValue::String(s) if s.is_empty() => continue,
			JsonValue::Array(items) if items.is_empty() => continue,
			JsonValue::Array(items) =>
				items.iter().map(render_scalar).collect::<Vec<_>>().join(","),
			other => render_scalar(&other),
		};

		pairs.push((name, rendered));
	}

	Ok(pairs)
}

fn render_scalar(value: &JsonValue) -> String {
	match value {
		JsonValue::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Scope strings used by the resource wrappers.
pub mod scopes {
	// self
	use super::*;

	/// Creating connected accounts.
	pub const ACCOUNTS_WRITE: &str = "/accounts.write";
	/// Reading transfers.
	pub const TRANSFERS_READ: &str = "/transfers.read";
	/// Creating and updating transfers.
	pub const TRANSFERS_WRITE: &str = "/transfers.write";
	/// Profile and address enrichment.
	pub const PROFILE_ENRICHMENT_READ: &str = "/profile-enrichment.read";

	/// Builds a scope set from static scope strings.
	pub fn of(scopes: &[&str]) -> Result<ScopeSet> {
		Ok(ScopeSet::new(scopes.iter().copied())?)
	}

	/// `/accounts/{id}/profile.read`.
	pub fn profile_read(account: &AccountId) -> Result<ScopeSet> {
		account_scoped(account, "profile.read")
	}

	/// `/accounts/{id}/profile.write`.
	pub fn profile_write(account: &AccountId) -> Result<ScopeSet> {
		account_scoped(account, "profile.write")
	}

	/// `/accounts/{id}/cards.read`.
	pub fn cards_read(account: &AccountId) -> Result<ScopeSet> {
		account_scoped(account, "cards.read")
	}

	/// `/accounts/{id}/cards.write`.
	pub fn cards_write(account: &AccountId) -> Result<ScopeSet> {
		account_scoped(account, "cards.write")
	}

	fn account_scoped(account: &AccountId, capability: &str) -> Result<ScopeSet> {
		Ok(ScopeSet::new([format!("/accounts/{account}/{capability}")])?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn account_scopes_embed_the_account() {
		let account = AccountId::new("acct-7").expect("Account fixture should be valid.");

		assert_eq!(
			scopes::cards_write(&account).expect("Scope should build.").normalized(),
			"/accounts/acct-7/cards.write"
		);
		assert_eq!(
			scopes::of(&[scopes::TRANSFERS_WRITE, scopes::TRANSFERS_READ])
				.expect("Scope should build.")
				.len(),
			2
		);
	}

	#[test]
	fn query_encoding_skips_nulls_and_joins_lists() {
		let pairs = encode_query(&serde_json::json!({
			"accountIDs": ["a", "b"],
			"count": 20,
			"skip": 0,
			"search": "",
			"status": null,
			"includeCities": true,
			"excludeStates": []
		}))
		.expect("Criteria should encode.");

		assert_eq!(
			pairs,
			vec![
				("accountIDs".to_owned(), "a,b".to_owned()),
				("count".to_owned(), "20".to_owned()),
				("includeCities".to_owned(), "true".to_owned()),
			]
		);
	}

	#[test]
	fn addresses_skip_missing_fields() {
		let address = Address { city: Some("Boulder".into()), ..Default::default() };

		assert_eq!(
			serde_json::to_value(&address).expect("Address should serialize."),
			serde_json::json!({ "city": "Boulder" })
		);
	}
}
