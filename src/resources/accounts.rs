//! Connected accounts.

// self
use crate::{
	_prelude::*,
	auth::AccountId,
	dispatch::{Method, RequestDispatcher, RequestSpec},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	resources::{Address, Metadata, Phone, scopes},
};

/// Entity type behind an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
	/// A person.
	Individual,
	/// A company.
	Business,
}

/// Details for an individual or a business.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// Present for individual accounts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub individual: Option<IndividualProfile>,
	/// Present for business accounts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub business: Option<BusinessProfile>,
}

/// Person behind an individual account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualProfile {
	/// Structured or plain name, as returned by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<JsonValue>,
	/// Contact phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<Phone>,
	/// Contact email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Mailing address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	/// Whether a birth date is on file.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub birth_date_provided: Option<bool>,
	/// Whether a government ID is on file.
	#[serde(default, rename = "governmentIDProvided", skip_serializing_if = "Option::is_none")]
	pub government_id_provided: Option<bool>,
}

/// Company behind a business account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
	/// Registered legal name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub legal_business_name: Option<String>,
	/// Trade name, when different from the legal name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub doing_business_as: Option<String>,
	/// For example `llc` or `soleProprietorship`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub business_type: Option<String>,
	/// Mailing address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	/// Contact phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<Phone>,
	/// Contact email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Public website.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
	/// Free-form description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Whether a tax ID is on file.
	#[serde(default, rename = "taxIDProvided", skip_serializing_if = "Option::is_none")]
	pub tax_id_provided: Option<bool>,
	/// NAICS/SIC/MCC codes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub industry_codes: Option<BTreeMap<String, String>>,
}

/// Support contact shown on card statements (business only).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSupport {
	/// Support phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<Phone>,
	/// Support email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Support mailing address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	/// Support website.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
}

/// Account-level settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
	/// Card payment settings, such as the statement descriptor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub card_payment: Option<JsonValue>,
}

/// A Moov account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	/// Account identifier.
	#[serde(rename = "accountID")]
	pub account_id: String,
	/// `sandbox` or `production`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mode: Option<String>,
	/// Whether the account is an individual or a business.
	pub account_type: AccountType,
	/// Name of the individual or business.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Individual or business profile.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile: Option<Profile>,
	/// Caller-defined key/value pairs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,
	/// Caller-side alias.
	#[serde(default, rename = "foreignID", skip_serializing_if = "Option::is_none")]
	pub foreign_id: Option<String>,
	/// Customer-facing support contacts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub customer_support: Option<CustomerSupport>,
	/// Account-level settings.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub settings: Option<AccountSettings>,
	/// Creation instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub created_on: Option<OffsetDateTime>,
	/// Last modification instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub updated_on: Option<OffsetDateTime>,
}

/// Payload for creating a connected account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
	/// Whether the account is an individual or a business.
	pub account_type: AccountType,
	/// Individual or business profile.
	pub profile: Profile,
	/// Caller-defined key/value pairs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,
	/// Terms-of-service acceptance token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub terms_of_service: Option<JsonValue>,
	/// Caller-side alias.
	#[serde(default, rename = "foreignID", skip_serializing_if = "Option::is_none")]
	pub foreign_id: Option<String>,
	/// Customer-facing support contacts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub customer_support: Option<CustomerSupport>,
	/// Account-level settings.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub settings: Option<AccountSettings>,
}

/// Partial account update; only the populated fields are sent.
///
/// The target account is addressed through the URL and never serialized into the body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
	/// Account being patched.
	#[serde(skip)]
	pub account_id: AccountId,
	/// Profile fields to change.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile: Option<Profile>,
	/// Replacement metadata.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,
	/// Terms-of-service acceptance token or manual record.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub terms_of_service: Option<JsonValue>,
	/// Caller-side identifier for cross-referencing.
	#[serde(rename = "foreignID", skip_serializing_if = "Option::is_none")]
	pub foreign_id: Option<String>,
	/// Customer-facing support contacts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub customer_support: Option<CustomerSupport>,
	/// Account-level settings.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub settings: Option<AccountSettings>,
}
impl AccountPatch {
	/// Empty patch for `account_id`.
	pub fn new(account_id: AccountId) -> Self {
		Self {
			account_id,
			profile: None,
			metadata: None,
			terms_of_service: None,
			foreign_id: None,
			customer_support: None,
			settings: None,
		}
	}
}

/// The Accounts API.
pub struct Accounts<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: &'a RequestDispatcher<C, M>,
}
impl<'a, C, M> Accounts<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a dispatcher.
	pub fn new(dispatcher: &'a RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Creates a new connected account.
	pub async fn create(&self, account: &NewAccount) -> Result<Account> {
		let spec = RequestSpec::post("accounts", scopes::of(&[scopes::ACCOUNTS_WRITE])?)
			.json(account)?
			.platform_scoped();

		Ok(self.dispatcher.execute(&spec).await?.decode("account")?)
	}

	/// Retrieves the account with the given identifier.
	pub async fn get(&self, account_id: &AccountId) -> Result<Account> {
		let spec = RequestSpec::get(format!("accounts/{account_id}"), scopes::profile_read(account_id)?)
			.account(account_id.clone());

		Ok(self.dispatcher.execute(&spec).await?.decode("account")?)
	}

	/// Replaces an account; requires the complete account object.
	pub async fn update(&self, account: &Account) -> Result<Account> {
		let account_id = AccountId::new(&account.account_id)?;
		let spec = RequestSpec::new(
			Method::PUT,
			format!("accounts/{account_id}"),
			scopes::profile_write(&account_id)?,
		)
		.json(account)?
		.account(account_id);

		Ok(self.dispatcher.execute(&spec).await?.decode("account")?)
	}

	/// Applies a partial update.
	pub async fn patch(&self, patch: &AccountPatch) -> Result<Account> {
		let account_id = &patch.account_id;
		let spec = RequestSpec::new(
			Method::PATCH,
			format!("accounts/{account_id}"),
			scopes::profile_write(account_id)?,
		)
		.json(patch)?
		.account(account_id.clone());

		Ok(self.dispatcher.execute(&spec).await?.decode("account")?)
	}
}
