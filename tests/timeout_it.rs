mod support;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use moov_client::{
	authority::ReqwestTokenAuthority,
	dispatch::{ReqwestRequestDispatcher, RequestSpec},
	error::{CallStage, Error, TimeoutError},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
};
use support::*;

fn authority(server: &MockServer, timeout: StdDuration) -> ReqwestTokenAuthority {
	ReqwestTokenAuthority::with_http_client(
		credential(),
		descriptor_for(server),
		ReqwestHttpClient::with_timeout(timeout).expect("Timed client should build."),
		ReqwestTransportErrorMapper,
	)
}

#[tokio::test]
async fn slow_token_endpoints_time_out_without_caching() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(1_000))
				.body(token_body("late-token", 3600));
		})
		.await;
	let authority = authority(&server, StdDuration::from_millis(100));
	let err = authority
		.acquire(&scope(&["/accounts.read"]), None)
		.await
		.expect_err("Slow mint should time out.");

	assert!(matches!(err, Error::Timeout(TimeoutError { stage: CallStage::Mint })));
	assert_eq!(authority.cached_len(), 0);
	assert_eq!(authority.metrics().failures(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn slow_api_calls_time_out_and_keep_the_token() {
	let server = MockServer::start_async().await;
	let _tokens = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("fast-token", 3600));
		})
		.await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/ping");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(1_000))
				.body("{}");
		})
		.await;
	let dispatcher = ReqwestRequestDispatcher::new(authority(&server, StdDuration::from_millis(200)));
	let spec = RequestSpec::get("ping", scope(&["/ping.read"]));
	let err = dispatcher.execute(&spec).await.expect_err("Slow API call should time out.");

	assert!(matches!(err, Error::Timeout(TimeoutError { stage: CallStage::Api })));
	assert!(
		dispatcher.authority().cached(&scope(&["/ping.read"]), None).is_some(),
		"A timeout must not evict the token."
	);
	assert_eq!(dispatcher.metrics().retries(), 0);

	api.assert_calls_async(1).await;
}
