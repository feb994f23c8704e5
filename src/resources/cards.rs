//! Cards linked to connected accounts.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, CardId},
	dispatch::{Method, RequestDispatcher, RequestSpec},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	resources::{Address, PaymentMethod, scopes},
};

/// Header asking the API to hold the link response until payment methods exist.
pub const WAIT_FOR_HEADER: &str = "x-wait-for";

/// Card expiry as two-digit strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiration {
	/// `01` through `12`.
	pub month: String,
	/// Last two digits of the year.
	pub year: String,
}

/// Verification results reported by the card networks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVerification {
	/// CVV check result.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cvv: Option<String>,
	/// Street line AVS result.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address_line1: Option<String>,
	/// Postal code AVS result.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub postal_code: Option<String>,
}

/// A linked card. Never carries the full card number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
	/// Card identifier.
	#[serde(rename = "cardID")]
	pub card_id: String,
	/// Stable hash of the card number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fingerprint: Option<String>,
	/// Card network brand (Visa, Mastercard, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brand: Option<String>,
	/// `debit`, `credit`, `prepaid`, or `unknown`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub card_type: Option<String>,
	/// Last four digits of the card number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_four_card_number: Option<String>,
	/// Bank identification number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bin: Option<String>,
	/// Expiry month and year.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration: Option<CardExpiration>,
	/// Cardholder name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub holder_name: Option<String>,
	/// Billing address used for AVS checks.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub billing_address: Option<Address>,
	/// Verification results returned by the network.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub card_verification: Option<CardVerification>,
	/// Issuing bank.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issuer: Option<String>,
	/// Country of the issuing bank.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issuer_country: Option<String>,
	/// Merchant account the card was linked under.
	#[serde(default, rename = "merchantAccountID", skip_serializing_if = "Option::is_none")]
	pub merchant_account_id: Option<String>,
	/// Whether the card is stored for recurring use.
	#[serde(default)]
	pub card_on_file: bool,
	/// Payment methods generated from the card.
	#[serde(default)]
	pub payment_methods: Vec<PaymentMethod>,
}

/// Raw card details submitted when linking a card.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCard {
	/// Full card number (PAN).
	pub card_number: String,
	/// Expiry month and year.
	pub expiration: CardExpiration,
	/// Card security code.
	pub card_cvv: String,
	/// Cardholder name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub holder_name: Option<String>,
	/// Billing address used for AVS checks.
	pub billing_address: Address,
	/// Whether the card is stored for future use.
	pub card_on_file: bool,
}
impl Debug for LinkCard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LinkCard")
			.field("card_number", &"<redacted>")
			.field("expiration", &self.expiration)
			.field("card_cvv", &"<redacted>")
			.field("holder_name", &self.holder_name)
			.field("billing_address", &self.billing_address)
			.field("card_on_file", &self.card_on_file)
			.finish()
	}
}

/// Fields of a linked card that may change after linking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCard {
	/// Replacement billing address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub billing_address: Option<Address>,
	/// Replacement expiry.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expiration: Option<CardExpiration>,
	/// New CVV; required by some issuers when the expiration changes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub card_cvv: Option<String>,
	/// Updates the stored-for-future-use flag.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub card_on_file: Option<bool>,
}

/// The Cards API.
pub struct Cards<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: &'a RequestDispatcher<C, M>,
}
impl<'a, C, M> Cards<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a dispatcher.
	pub fn new(dispatcher: &'a RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Retrieves one card.
	pub async fn get(&self, account_id: &AccountId, card_id: &CardId) -> Result<Card> {
		let spec = RequestSpec::get(
			format!("accounts/{account_id}/cards/{card_id}"),
			scopes::cards_read(account_id)?,
		)
		.account(account_id.clone());

		Ok(self.dispatcher.execute(&spec).await?.decode("card")?)
	}

	/// Lists the cards linked to an account.
	pub async fn list(&self, account_id: &AccountId) -> Result<Vec<Card>> {
		let spec = RequestSpec::get(
			format!("accounts/{account_id}/cards"),
			scopes::cards_read(account_id)?,
		)
		.account(account_id.clone());

		Ok(self.dispatcher.execute(&spec).await?.decode("cards")?)
	}

	/// Links a card; with `wait_for_payment_methods` the response lists the generated
	/// payment methods.
	pub async fn link(
		&self,
		account_id: &AccountId,
		card: &LinkCard,
		wait_for_payment_methods: bool,
	) -> Result<Card> {
		let mut spec = RequestSpec::post(
			format!("accounts/{account_id}/cards"),
			scopes::cards_write(account_id)?,
		)
		.json(card)?
		.account(account_id.clone());

		if wait_for_payment_methods {
			spec = spec.header(WAIT_FOR_HEADER, "payment-method");
		}

		Ok(self.dispatcher.execute(&spec).await?.decode("card")?)
	}

	/// Updates a linked card.
	pub async fn update(
		&self,
		account_id: &AccountId,
		card_id: &CardId,
		update: &UpdateCard,
	) -> Result<Card> {
		let spec = RequestSpec::new(
			Method::PATCH,
			format!("accounts/{account_id}/cards/{card_id}"),
			scopes::cards_write(account_id)?,
		)
		.json(update)?
		.account(account_id.clone());

		Ok(self.dispatcher.execute(&spec).await?.decode("card")?)
	}

	/// Disables a card; it can no longer be used for transfers.
	pub async fn disable(&self, account_id: &AccountId, card_id: &CardId) -> Result<()> {
		let spec = RequestSpec::new(
			Method::DELETE,
			format!("accounts/{account_id}/cards/{card_id}"),
			scopes::cards_write(account_id)?,
		)
		.account(account_id.clone());

		self.dispatcher.execute(&spec).await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn link_card() -> LinkCard {
		LinkCard {
			card_number: "4111111111111111".into(),
			expiration: CardExpiration { month: "01".into(), year: "30".into() },
			card_cvv: "123".into(),
			holder_name: Some("Jules Jackson".into()),
			billing_address: Address { postal_code: Some("80301".into()), ..Default::default() },
			card_on_file: false,
		}
	}

	#[test]
	fn link_card_debug_redacts_card_data() {
		let rendered = format!("{:?}", link_card());

		assert!(!rendered.contains("4111111111111111"));
		assert!(!rendered.contains("123\""));
		assert!(rendered.contains("Jules Jackson"));
	}

	#[test]
	fn link_card_serializes_camel_case() {
		let value = serde_json::to_value(link_card()).expect("Link card should serialize.");

		assert_eq!(value["cardNumber"], "4111111111111111");
		assert_eq!(value["cardCvv"], "123");
		assert_eq!(value["billingAddress"]["postalCode"], "80301");
		assert_eq!(value["cardOnFile"], false);
	}

	#[test]
	fn card_defaults_missing_collections() {
		let card: Card = serde_json::from_value(serde_json::json!({
			"cardID": "card-1",
			"brand": "Visa",
			"lastFourCardNumber": "1111"
		}))
		.expect("Card JSON should deserialize.");

		assert!(card.payment_methods.is_empty());
		assert!(!card.card_on_file);
	}
}
