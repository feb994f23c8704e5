//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	fmt::{Display, Formatter, Result as FmtResult},
	future::{self, Future},
	io::{Error as IoError, ErrorKind},
	pin::Pin,
	sync::Arc,
};
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
use url::Url;
// self
use moov_client::{
	auth::{AccountId, ClientId, Credential, ProviderId, ScopeSet},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		BasicTransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{StatusCode, header::CONTENT_TYPE},
		},
	},
	provider::ProviderDescriptor,
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const PLATFORM_ACCOUNT: &str = "platform-acct";
pub const TOKEN_PATH: &str = "/oauth2/token";

pub fn credential() -> Credential {
	bare_credential().with_platform_account(account(PLATFORM_ACCOUNT))
}

/// Credential without a platform account.
pub fn bare_credential() -> Credential {
	Credential::new(ClientId::new(CLIENT_ID).expect("Client fixture should be valid."), CLIENT_SECRET)
}

pub fn account(id: &str) -> AccountId {
	AccountId::new(id).expect("Account fixture should be valid.")
}

pub fn scope(values: &[&str]) -> ScopeSet {
	ScopeSet::new(values.iter().copied()).expect("Scope fixture should be valid.")
}

/// Plain-HTTP loopback URL on the mock server; its TLS certificate is self-signed.
pub fn mock_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&format!("http://{}{path}", server.address())).expect("Mock URL should parse.")
}

/// Descriptor pointing both endpoints at the mock server.
pub fn descriptor_for(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder(ProviderId::new("mock-moov").expect("Provider fixture should be valid."))
		.api_base(mock_url(server, "/"))
		.token_endpoint(mock_url(server, TOKEN_PATH))
		.build()
		.expect("Mock descriptor should build.")
}

/// Descriptor for the scripted transport; nothing is ever sent over the network.
pub fn scripted_descriptor() -> ProviderDescriptor {
	ProviderDescriptor::builder(ProviderId::new("scripted").expect("Provider fixture should be valid."))
		.api_base(Url::parse("https://api.moov.test/").expect("Scripted API base should parse."))
		.token_endpoint(
			Url::parse("https://api.moov.test/oauth2/token").expect("Scripted token URL should parse."),
		)
		.build()
		.expect("Scripted descriptor should build.")
}

pub fn token_body(token: &str, expires_in: u64) -> String {
	format!(r#"{{"access_token":"{token}","token_type":"bearer","expires_in":{expires_in}}}"#)
}

#[derive(Debug)]
pub struct ScriptExhausted;
impl Display for ScriptExhausted {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scripted transport has no response left.")
	}
}
impl std::error::Error for ScriptExhausted {}

/// One scripted transport outcome.
#[derive(Clone, Debug)]
pub enum Step {
	Respond { status: u16, body: String },
	Fail(ErrorKind),
}
impl Step {
	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self::Respond { status, body: body.into() }
	}

	pub fn token(token: &str, expires_in: u64) -> Self {
		Self::json(200, token_body(token, expires_in))
	}
}

/// Captured request, reduced to what the assertions need.
#[derive(Clone, Debug)]
pub struct SentRequest {
	pub method: String,
	pub uri: String,
	pub headers: Vec<(String, String)>,
	pub body: String,
}
impl SentRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	pub fn is_mint(&self) -> bool {
		self.uri.ends_with(TOKEN_PATH)
	}
}

/// Transport replaying a fixed sequence of outcomes and recording every request.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
	steps: Arc<Mutex<VecDeque<Step>>>,
	sent: Arc<Mutex<Vec<SentRequest>>>,
}
impl ScriptedTransport {
	pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		Self { steps: Arc::new(Mutex::new(steps.into_iter().collect())), sent: Default::default() }
	}

	pub fn push(&self, step: Step) {
		self.steps.lock().push_back(step);
	}

	pub fn sent(&self) -> Vec<SentRequest> {
		self.sent.lock().clone()
	}

	pub fn mint_count(&self) -> usize {
		self.sent.lock().iter().filter(|request| request.is_mint()).count()
	}

	pub fn api_count(&self) -> usize {
		self.sent.lock().iter().filter(|request| !request.is_mint()).count()
	}

	fn next(&self, request: HttpRequest) -> Option<Step> {
		self.sent.lock().push(SentRequest {
			method: request.method().to_string(),
			uri: request.uri().to_string(),
			headers: request
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), value.to_str().unwrap_or_default().to_owned())
				})
				.collect(),
			body: String::from_utf8_lossy(request.body()).into_owned(),
		});

		self.steps.lock().pop_front()
	}
}
impl HttpTransport for ScriptedTransport {
	type Handle = ScriptedHandle;
	type TransportError = ScriptExhausted;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ScriptedHandle { transport: self.clone(), slot }
	}
}

pub struct ScriptedHandle {
	transport: ScriptedTransport,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
	type Error = HttpClientError<ScriptExhausted>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		self.slot.take();

		let outcome = match self.transport.next(request) {
			Some(Step::Respond { status, body }) => {
				self.slot.store(ResponseMetadata { status: Some(status) });

				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Scripted status should be valid.");
				response.headers_mut().insert(
					CONTENT_TYPE,
					"application/json".parse().expect("Content type should parse."),
				);

				Ok(response)
			},
			Some(Step::Fail(kind)) => Err(HttpClientError::Io(IoError::from(kind))),
			None => Err(HttpClientError::Reqwest(Box::new(ScriptExhausted))),
		};

		Box::pin(future::ready(outcome))
	}
}

pub type ScriptedAuthority =
	moov_client::authority::TokenAuthority<ScriptedTransport, BasicTransportErrorMapper>;
pub type ScriptedDispatcher =
	moov_client::dispatch::RequestDispatcher<ScriptedTransport, BasicTransportErrorMapper>;

pub fn scripted_authority(transport: &ScriptedTransport) -> ScriptedAuthority {
	ScriptedAuthority::with_http_client(
		credential(),
		scripted_descriptor(),
		transport.clone(),
		BasicTransportErrorMapper,
	)
}
