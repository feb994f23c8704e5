//! Creates and lists transfers through the [`MoovClient`] facade, with both the token endpoint
//! and the API served by a local mock server.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use moov_client::{
	MoovClient,
	auth::{AccountId, ClientId, Credential, ProviderId},
	provider::ProviderDescriptor,
	resources::{Amount, NewTransfer, TransferListCriteria},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let create_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/transfers").header_exists("x-idempotency-key");
			then.status(202)
				.header("content-type", "application/json")
				.body("{\"transferID\":\"tr-demo\",\"createdOn\":\"2025-03-01T09:00:00Z\"}");
		})
		.await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/transfers").query_param("accountIDs", "demo-customer");
			then.status(200).header("content-type", "application/json").body(
				"[{\"transferID\":\"tr-demo\",\"status\":\"pending\",\"amount\":{\"value\":2500,\"currency\":\"USD\"}}]",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-moov")?)
		.api_base(Url::parse(&format!("http://{}/", server.address()))?)
		.token_endpoint(Url::parse(&format!("http://{}/oauth2/token", server.address()))?)
		.build()?;
	let credential = Credential::new(ClientId::new("demo-public-key")?, "demo-private-key")
		.with_platform_account(AccountId::new("demo-platform")?);
	let client = MoovClient::with_descriptor(credential, descriptor)?;
	let created = client
		.transfers()
		.create(&NewTransfer::new("pm-wallet", "pm-card", Amount::usd(2500)).description("Demo"), None)
		.await?;
	let listed = client
		.transfers()
		.list(&TransferListCriteria {
			account_ids: vec![AccountId::new("demo-customer")?],
			..Default::default()
		})
		.await?;

	println!("Created {}; {} transfer(s) listed.", created.transfer_id, listed.len());
	println!(
		"Mints: {}, dispatches: {}.",
		client.authority().metrics().attempts(),
		client.dispatcher().metrics().calls()
	);

	create_mock.assert_async().await;
	list_mock.assert_async().await;

	Ok(())
}
