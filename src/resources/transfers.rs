//! Transfers, transfer options, and refunds.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, RefundId, TransferId},
	dispatch::{Method, RequestDispatcher, RequestSpec},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	resources::{Amount, Metadata, common, scopes},
};

/// Lifecycle state of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferStatus {
	/// Accepted but not yet submitted.
	Created,
	/// Submitted and in flight.
	Pending,
	/// Funds settled.
	Completed,
	/// Rejected or returned.
	Failed,
	/// Reversed after completion.
	Reversed,
	/// Waiting on a balance or schedule.
	Queued,
	/// Canceled before submission.
	Canceled,
	/// A status this client does not know yet.
	#[serde(other)]
	Unknown,
}

/// Lifecycle state of a refund.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefundStatus {
	/// Accepted.
	Created,
	/// Sent to the network.
	Pending,
	/// Funds returned.
	Completed,
	/// Rejected by the network.
	Failed,
	/// A status this client does not know yet.
	#[serde(other)]
	Unknown,
}

/// Payment method reference, as listed by transfer options or used as a transfer leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
	/// Payment method identifier.
	#[serde(rename = "paymentMethodID")]
	pub payment_method_id: String,
	/// For example `moov-wallet`, `ach-debit-fund`, or `card-payment`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_method_type: Option<String>,
}

/// Account summary embedded in a transfer leg.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAccount {
	/// Account identifier.
	#[serde(rename = "accountID")]
	pub account_id: String,
	/// Contact email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Display name of the account.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
}

/// One side of a transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParty {
	/// Payment method identifier.
	#[serde(rename = "paymentMethodID")]
	pub payment_method_id: String,
	/// Payment method type (for example `ach-debit-fund`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_method_type: Option<String>,
	/// Owning account summary.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account: Option<TransferAccount>,
	/// Rail-specific details (bank account, card, wallet, ACH).
	#[serde(flatten)]
	pub details: BTreeMap<String, JsonValue>,
}

/// A transfer of funds between two payment methods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
	/// Transfer identifier.
	#[serde(rename = "transferID")]
	pub transfer_id: String,
	/// Creation instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub created_on: Option<OffsetDateTime>,
	/// Current status.
	pub status: TransferStatus,
	/// Money source.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<TransferParty>,
	/// Money destination.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub destination: Option<TransferParty>,
	/// Amount in minor units.
	pub amount: Amount,
	/// Description shown to the parties.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Caller-defined key/value pairs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,
	/// Platform fee taken from the transfer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facilitator_fee: Option<JsonValue>,
	/// Moov's fee, in cents.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub moov_fee: Option<i64>,
	/// Total refunded so far.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refunded_amount: Option<Amount>,
	/// Refunds issued against the transfer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refunds: Option<Vec<Refund>>,
}

/// Payload for creating a transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
	/// Money source.
	pub source: PaymentMethodRef,
	/// Money destination.
	pub destination: PaymentMethodRef,
	/// Amount in minor units.
	pub amount: Amount,
	/// Description shown to the parties.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Caller-defined key/value pairs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Metadata>,
	/// Platform fee taken on the transfer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub facilitator_fee: Option<JsonValue>,
}
impl NewTransfer {
	/// Transfer of `amount` from `source` to `destination` payment methods.
	pub fn new(
		source: impl Into<String>,
		destination: impl Into<String>,
		amount: Amount,
	) -> Self {
		Self {
			source: PaymentMethodRef::new(source),
			destination: PaymentMethodRef::new(destination),
			amount,
			description: None,
			metadata: None,
			facilitator_fee: None,
		}
	}

	/// Sets the description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the metadata.
	pub fn metadata(mut self, metadata: Metadata) -> Self {
		self.metadata = Some(metadata);

		self
	}
}

/// Payment method addressed by identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodRef {
	/// Payment method identifier.
	#[serde(rename = "paymentMethodID")]
	pub payment_method_id: String,
}
impl PaymentMethodRef {
	/// References `payment_method_id`.
	pub fn new(payment_method_id: impl Into<String>) -> Self {
		Self { payment_method_id: payment_method_id.into() }
	}
}

/// Acknowledgement returned when a transfer is created.
///
/// Asynchronous transfers only echo the identifier; synchronous ones include the final status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
	/// Transfer identifier.
	#[serde(rename = "transferID")]
	pub transfer_id: String,
	/// Creation instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub created_on: Option<OffsetDateTime>,
	/// Final status, for synchronous transfers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<TransferStatus>,
}

/// Filters for [`Transfers::list`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferListCriteria {
	/// Restricts to transfers touching these accounts.
	#[serde(rename = "accountIDs")]
	pub account_ids: Vec<AccountId>,
	/// Only transfers in this status.
	pub status: Option<TransferStatus>,
	/// Lower bound on the creation instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub start_date_time: Option<OffsetDateTime>,
	/// Upper bound on the creation instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub end_date_time: Option<OffsetDateTime>,
	/// Page size.
	pub count: Option<u32>,
	/// Items to skip.
	pub skip: Option<u32>,
}

/// One side of a transfer-options lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptionsTarget {
	/// Account to resolve payment methods for.
	#[serde(default, rename = "accountID", skip_serializing_if = "Option::is_none")]
	pub account_id: Option<String>,
	/// Specific payment method to check.
	#[serde(default, rename = "paymentMethodID", skip_serializing_if = "Option::is_none")]
	pub payment_method_id: Option<String>,
}

/// Request body for [`Transfers::transfer_options`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferOptionsCriteria {
	/// Account or payment method sending money.
	pub source: TransferOptionsTarget,
	/// Account or payment method receiving money.
	pub destination: TransferOptionsTarget,
	/// Amount in minor units.
	pub amount: Amount,
}

/// Payment methods usable for a prospective transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransferOptions {
	/// Payment methods usable as the source.
	#[serde(default)]
	pub source_options: Vec<PaymentMethod>,
	/// Payment methods usable as the destination.
	#[serde(default)]
	pub destination_options: Vec<PaymentMethod>,
}

/// A card refund against a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
	/// Refund identifier.
	#[serde(rename = "refundID")]
	pub refund_id: String,
	/// Creation instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub created_on: Option<OffsetDateTime>,
	/// Last modification instant.
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub updated_on: Option<OffsetDateTime>,
	/// Refund status.
	pub status: RefundStatus,
	/// Refunded amount.
	pub amount: Amount,
	/// Failure reason reported by the network.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub failure_code: Option<String>,
}

/// The Transfers API.
pub struct Transfers<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: &'a RequestDispatcher<C, M>,
}
impl<'a, C, M> Transfers<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps a dispatcher.
	pub fn new(dispatcher: &'a RequestDispatcher<C, M>) -> Self {
		Self { dispatcher }
	}

	/// Moves money between two payment methods.
	///
	/// Without an `idempotency_key` a fresh UUID v4 is generated for the call.
	pub async fn create(
		&self,
		transfer: &NewTransfer,
		idempotency_key: Option<&str>,
	) -> Result<TransferResponse> {
		let spec = with_idempotency_key(
			RequestSpec::post("transfers", scopes::of(&[scopes::TRANSFERS_WRITE])?).json(transfer)?,
			idempotency_key,
		);

		Ok(self.dispatcher.execute(&spec).await?.decode("transfer response")?)
	}

	/// Lists transfers matching `criteria`.
	pub async fn list(&self, criteria: &TransferListCriteria) -> Result<Vec<Transfer>> {
		let mut spec = RequestSpec::get("transfers", scopes::of(&[scopes::TRANSFERS_READ])?);

		spec.query.extend(common::encode_query(criteria)?);

		Ok(self.dispatcher.execute(&spec).await?.decode("transfers")?)
	}

	/// Retrieves one transfer.
	pub async fn get(&self, transfer_id: &TransferId) -> Result<Transfer> {
		let spec = RequestSpec::get(
			format!("transfers/{transfer_id}"),
			scopes::of(&[scopes::TRANSFERS_READ])?,
		)
		.platform_scoped();

		Ok(self.dispatcher.execute(&spec).await?.decode("transfer")?)
	}

	/// Replaces the metadata attached to a transfer.
	pub async fn update_metadata(
		&self,
		transfer_id: &TransferId,
		metadata: &Metadata,
	) -> Result<Transfer> {
		let spec = RequestSpec::new(
			Method::PATCH,
			format!("transfers/{transfer_id}"),
			scopes::of(&[scopes::TRANSFERS_WRITE])?,
		)
		.body(serde_json::json!({ "metadata": metadata }))
		.platform_scoped();

		Ok(self.dispatcher.execute(&spec).await?.decode("transfer")?)
	}

	/// Lists the payment methods usable between a source and a destination.
	pub async fn transfer_options(
		&self,
		criteria: &TransferOptionsCriteria,
	) -> Result<AvailableTransferOptions> {
		let spec = RequestSpec::post("transfer-options", scopes::of(&[scopes::TRANSFERS_READ])?)
			.json(criteria)?
			.platform_scoped();

		Ok(self.dispatcher.execute(&spec).await?.decode("transfer options")?)
	}

	/// Refunds a card transfer, in full when `amount` (cents) is `None`.
	pub async fn refund(
		&self,
		transfer_id: &TransferId,
		amount: Option<i64>,
		idempotency_key: Option<&str>,
	) -> Result<Refund> {
		let mut spec = RequestSpec::post(
			format!("transfers/{transfer_id}/refunds"),
			scopes::of(&[scopes::TRANSFERS_WRITE])?,
		);

		if let Some(amount) = amount {
			spec = spec.body(serde_json::json!({ "amount": amount }));
		}

		let spec = with_idempotency_key(spec, idempotency_key);

		Ok(self.dispatcher.execute(&spec).await?.decode("refund")?)
	}

	/// Lists the refunds of a transfer.
	pub async fn list_refunds(&self, transfer_id: &TransferId) -> Result<Vec<Refund>> {
		let spec = RequestSpec::get(
			format!("transfers/{transfer_id}/refunds"),
			scopes::of(&[scopes::TRANSFERS_READ])?,
		);

		Ok(self.dispatcher.execute(&spec).await?.decode("refunds")?)
	}

	/// Retrieves one refund.
	pub async fn get_refund(&self, transfer_id: &TransferId, refund_id: &RefundId) -> Result<Refund> {
		let spec = RequestSpec::get(
			format!("transfers/{transfer_id}/refunds/{refund_id}"),
			scopes::of(&[scopes::TRANSFERS_READ])?,
		);

		Ok(self.dispatcher.execute(&spec).await?.decode("refund")?)
	}
}

fn with_idempotency_key(spec: RequestSpec, key: Option<&str>) -> RequestSpec {
	match key {
		Some(key) => spec.idempotency_key(key),
		None => spec.with_generated_idempotency_key(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	use uuid::Uuid;
	// self
	use super::*;

	#[test]
	fn list_criteria_become_query_pairs() {
		let criteria = TransferListCriteria {
			account_ids: vec![
				AccountId::new("acct-1").expect("Account fixture should be valid."),
				AccountId::new("acct-2").expect("Account fixture should be valid."),
			],
			status: Some(TransferStatus::Pending),
			start_date_time: Some(macros::datetime!(2024-05-01 00:00 UTC)),
			count: Some(50),
			skip: Some(0),
			..Default::default()
		};
		let pairs = common::encode_query(&criteria).expect("Criteria should encode.");

		assert!(pairs.contains(&("accountIDs".into(), "acct-1,acct-2".into())));
		assert!(pairs.contains(&("status".into(), "pending".into())));
		assert!(pairs.contains(&("startDateTime".into(), "2024-05-01T00:00:00Z".into())));
		assert!(pairs.contains(&("count".into(), "50".into())));
		assert_eq!(pairs.len(), 4, "Unset and zero filters should be omitted.");
	}

	#[test]
	fn caller_keys_win_over_generated_ones() {
		let scopes = scopes::of(&[scopes::TRANSFERS_WRITE]).expect("Scopes should be valid.");
		let supplied =
			with_idempotency_key(RequestSpec::post("transfers", scopes.clone()), Some("order-42"));
		let generated = with_idempotency_key(RequestSpec::post("transfers", scopes), None);

		assert_eq!(supplied.idempotency_key.as_deref(), Some("order-42"));
		assert!(generated.idempotency_key.is_some_and(|key| Uuid::parse_str(&key).is_ok()));
	}

	#[test]
	fn unknown_statuses_do_not_fail_decoding() {
		let status: TransferStatus =
			serde_json::from_str(r#""settled""#).expect("Unknown status should decode.");

		assert_eq!(status, TransferStatus::Unknown);
	}

	#[test]
	fn transfer_legs_keep_rail_details() {
		let transfer: Transfer = serde_json::from_value(serde_json::json!({
			"transferID": "tr-1",
			"status": "completed",
			"amount": { "value": 1204, "currency": "USD" },
			"source": {
				"paymentMethodID": "pm-1",
				"paymentMethodType": "moov-wallet",
				"wallet": { "walletID": "w-1" }
			}
		}))
		.expect("Transfer JSON should deserialize.");
		let source = transfer.source.expect("Source leg should be present.");

		assert_eq!(source.payment_method_id, "pm-1");
		assert!(source.details.contains_key("wallet"));
		assert_eq!(transfer.amount, Amount::usd(1204));
	}
}
