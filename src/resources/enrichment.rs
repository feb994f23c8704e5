//! Address autocomplete and profile enrichment.

// self
use crate::{
	_prelude::*,
	dispatch::{RequestDispatcher, RequestSpec},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	resources::{Address, Phone, common, scopes},
};

/// Query for [`EnrichedAddresses::get`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedAddressCriteria {
	/// Partial or complete address to search.
	pub search: String,
	/// Maximum number of suggestions.
	pub max_results: Option<u32>,
	/// Restricts results to these cities (`city+state` entries).
	pub include_cities: Vec<String>,
	/// Restricts results to these states.
	pub include_states: Vec<String>,
	/// Restricts results to these zip codes.
	pub include_zipcodes: Vec<String>,
	/// Excludes these states.
	pub exclude_states: Vec<String>,
	/// Ranks these cities first.
	pub prefer_cities: Vec<String>,
	/// Ranks these states first.
	pub prefer_states: Vec<String>,
	/// Ranks these zip codes first.
	pub prefer_zipcodes: Vec<String>,
	/// Percentage of results drawn from the preferences.
	pub prefer_ratio: Option<u32>,
	/// `none` or an IP address to bias results geographically.
	pub prefer_geolocation: Option<String>,
	/// Expands a secondary address entry.
	pub selected: Option<String>,
	/// `all` includes non-postal addresses.
	pub source: Option<String>,
}
impl EnrichedAddressCriteria {
	/// Criteria searching for `search` with no other filters.
	pub fn new(search: impl Into<String>) -> Self {
		Self { search: search.into(), ..Default::default() }
	}
}

/// One address suggestion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedAddress {
	/// Street line of the address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_line1: Option<String>,
	/// Unit or suite line.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_line2: Option<String>,
	/// City.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	/// State or province code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_or_province: Option<String>,
	/// Postal code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub postal_code: Option<String>,
	/// Number of secondary addresses behind this entry.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub entries: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressSuggestions {
	Wrapped { suggestions: Vec<EnrichedAddress> },
	Bare(Vec<EnrichedAddress>),
}
impl From<AddressSuggestions> for Vec<EnrichedAddress> {
	fn from(value: AddressSuggestions) -> Self {
		match value {
			AddressSuggestions::Wrapped { suggestions } => suggestions,
			AddressSuggestions::Bare(suggestions) => suggestions,
		}
	}
}

/// Person or business details found for an email address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProfile {
	/// Individual details, if the email belongs to a person.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub individual: Option<EnrichedIndividual>,
	/// Business details, if the email belongs to a company.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub business: Option<EnrichedBusiness>,
}

/// Structured personal name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Middle name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub middle_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Name suffix (Jr., III, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suffix: Option<String>,
}

/// Person behind an enriched email address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedIndividual {
	/// Full name, split into parts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<Name>,
	/// Email address the lookup was made for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Known mailing address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
}

/// Company behind an enriched email address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBusiness {
	/// Registered legal name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub legal_business_name: Option<String>,
	/// Known business address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	/// Business email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Business phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<Phone>,
	/// Industry classification.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub industry_codes: Option<IndustryCodes>,
	/// Public website.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
}

/// Industry classification codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryCodes {
	/// NAICS code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub naics: Option<String>,
	/// SIC code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sic: Option<String>,
}

/// Address autocomplete.
pub struct EnrichedAddresses<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: &'a RequestDispatcher<C, M>,
}
impl<'a, C, M> EnrichedAddresses<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a dispatcher.
	pub fn new(dispatcher: &'a RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Suggests addresses matching `criteria`.
	pub async fn get(&self, criteria: &EnrichedAddressCriteria) -> Result<Vec<EnrichedAddress>> {
		let mut spec = RequestSpec::get(
			"enrichment/address",
			scopes::of(&[scopes::PROFILE_ENRICHMENT_READ])?,
		);

		spec.query.extend(common::encode_query(criteria)?);

		let suggestions: AddressSuggestions =
			self.dispatcher.execute(&spec).await?.decode("address suggestions")?;

		Ok(suggestions.into())
	}
}

/// Profile enrichment.
pub struct EnrichedProfiles<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: &'a RequestDispatcher<C, M>,
}
impl<'a, C, M> EnrichedProfiles<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a dispatcher.
	pub fn new(dispatcher: &'a RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Looks up the person or business behind `email`.
	pub async fn get(&self, email: &str) -> Result<EnrichedProfile> {
		let spec = RequestSpec::get(
			"enrichment/profile",
			scopes::of(&[scopes::PROFILE_ENRICHMENT_READ])?,
		)
		.query("email", email);

		Ok(self.dispatcher.execute(&spec).await?.decode("enriched profile")?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn criteria_only_send_populated_filters() {
		let criteria = EnrichedAddressCriteria {
			max_results: Some(5),
			include_states: vec!["CO".into(), "UT".into()],
			..EnrichedAddressCriteria::new("555 Main")
		};
		let pairs = common::encode_query(&criteria).expect("Criteria should encode.");

		assert_eq!(
			pairs,
			vec![
				("includeStates".to_owned(), "CO,UT".to_owned()),
				("maxResults".to_owned(), "5".to_owned()),
				("search".to_owned(), "555 Main".to_owned()),
			]
		);
	}

	#[test]
	fn suggestions_accept_wrapped_and_bare_lists() {
		let wrapped: AddressSuggestions =
			serde_json::from_str(r#"{"suggestions":[{"city":"Denver","entries":2}]}"#)
				.expect("Wrapped suggestions should decode.");
		let bare: AddressSuggestions = serde_json::from_str(r#"[{"city":"Boulder"}]"#)
			.expect("Bare suggestions should decode.");
		let wrapped: Vec<EnrichedAddress> = wrapped.into();
		let bare: Vec<EnrichedAddress> = bare.into();

		assert_eq!(wrapped[0].entries, Some(2));
		assert_eq!(bare[0].city.as_deref(), Some("Boulder"));
	}
}
