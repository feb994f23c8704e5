//! Mints a scoped token against a local mock token endpoint and shows that repeated acquisitions
//! for the same scope set are served from the authority's cache.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use moov_client::{
	auth::{AccountId, ClientId, Credential, ProviderId, ScopeSet},
	authority::ReqwestTokenAuthority,
	provider::ProviderDescriptor,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-moov")?)
		.api_base(Url::parse(&format!("http://{}/", server.address()))?)
		.token_endpoint(Url::parse(&format!("http://{}/oauth2/token", server.address()))?)
		.build()?;
	let credential = Credential::new(ClientId::new("demo-public-key")?, "demo-private-key")
		.with_platform_account(AccountId::new("demo-platform")?);
	let authority = ReqwestTokenAuthority::new(credential, descriptor)?;
	let scopes = ScopeSet::new(["/accounts.read", "/transfers.read"])?;
	let first = authority.acquire(&scopes, None).await?;
	let second = authority.acquire(&scopes, None).await?;

	println!(
		"Token for [{scopes}] expires at {}; second lookup reused it: {}.",
		first.expires_at,
		first.access_token == second.access_token
	);

	token_mock.assert_async().await;

	Ok(())
}
