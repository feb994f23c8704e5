mod support;

// std
use std::{io::ErrorKind, time::Instant};
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime, macros};
// self
use moov_client::{
	authority::ReqwestTokenAuthority,
	clock::ManualClock,
	error::{AuthenticationError, CallStage, ConfigError, Error, TimeoutError},
	store::EvictOutcome,
};
use support::*;

const START: OffsetDateTime = macros::datetime!(2025-03-01 09:00 UTC);

#[tokio::test]
async fn back_to_back_acquires_mint_once() {
	let transport = ScriptedTransport::new([Step::token("tok-1", 3600)]);
	let authority = scripted_authority(&transport);
	let scopes = scope(&["/accounts.read"]);
	let first = authority.acquire(&scopes, None).await.expect("First acquire should mint.");
	let second = authority.acquire(&scopes, None).await.expect("Second acquire should hit the cache.");

	assert_eq!(first.access_token.expose(), "tok-1");
	assert_eq!(second.access_token.expose(), "tok-1");
	assert_eq!(transport.mint_count(), 1);
	assert_eq!(authority.metrics().attempts(), 1);
	assert_eq!(authority.metrics().cache_hits(), 1);
}

#[tokio::test]
async fn relative_expiry_is_anchored_at_mint_time() {
	let transport = ScriptedTransport::new([Step::token("tok-1", 3600)]);
	let clock = ManualClock::new(START);
	let authority = scripted_authority(&transport).with_clock(clock);
	let record = authority
		.acquire(&scope(&["/accounts.read"]), None)
		.await
		.expect("Acquire should mint.");

	assert_eq!(record.issued_at, START);
	assert_eq!(record.expires_at, START + Duration::seconds(3600));
}

#[tokio::test]
async fn absolute_expiry_is_taken_verbatim() {
	let transport = ScriptedTransport::new([Step::json(
		200,
		r#"{"access_token":"tok-abs","token_type":"bearer","expires_at":"2025-03-01T09:30:00Z"}"#,
	)]);
	let authority = scripted_authority(&transport).with_clock(ManualClock::new(START));
	let record = authority
		.acquire(&scope(&["/accounts.read"]), None)
		.await
		.expect("Absolute expiry should be accepted.");

	assert_eq!(record.expires_at, macros::datetime!(2025-03-01 09:30 UTC));
}

#[tokio::test]
async fn expired_tokens_are_reminted_once() {
	let transport = ScriptedTransport::new([Step::token("tok-1", 60), Step::token("tok-2", 60)]);
	let clock = ManualClock::new(START);
	let authority = scripted_authority(&transport).with_clock(clock.clone());
	let scopes = scope(&["/transfers.read"]);
	let first = authority.acquire(&scopes, None).await.expect("First mint should succeed.");

	// Inside the default five second safety margin.
	clock.advance(Duration::seconds(56));

	let second = authority.acquire(&scopes, None).await.expect("Re-mint should succeed.");
	let third = authority.acquire(&scopes, None).await.expect("Fresh token should be cached.");

	assert_eq!(first.access_token.expose(), "tok-1");
	assert_eq!(second.access_token.expose(), "tok-2");
	assert_eq!(third.access_token.expose(), "tok-2");
	assert_eq!(transport.mint_count(), 2);
	assert_eq!(authority.cached_len(), 1, "The re-mint should replace the stale entry.");
}

#[tokio::test]
async fn scope_sets_and_accounts_are_cached_independently() {
	let transport = ScriptedTransport::new([
		Step::token("tok-read", 3600),
		Step::token("tok-write", 3600),
		Step::token("tok-acct", 3600),
	]);
	let authority = scripted_authority(&transport);
	let read = scope(&["/accounts.read"]);
	let write = scope(&["/accounts.write"]);
	let acct = account("acct-9");
	let a = authority.acquire(&read, None).await.expect("Read scope should mint.");
	let b = authority.acquire(&write, None).await.expect("Write scope should mint.");
	let c = authority.acquire(&read, Some(&acct)).await.expect("Account scope should mint.");

	assert_eq!(a.access_token.expose(), "tok-read");
	assert_eq!(b.access_token.expose(), "tok-write");
	assert_eq!(c.access_token.expose(), "tok-acct");
	assert_eq!(authority.cached_len(), 3);
	assert!(
		authority.cached(&scope(&["/accounts.read", "/accounts.read"]), None).is_some(),
		"Duplicate scopes should resolve to the same entry."
	);
}

#[tokio::test]
async fn mint_request_carries_scope_and_account() {
	let transport = ScriptedTransport::new([Step::token("tok-1", 3600)]);
	let authority = scripted_authority(&transport);
	let acct = account("acct-42");

	authority
		.acquire(&scope(&["/accounts/acct-42/cards.read", "/ping.read"]), Some(&acct))
		.await
		.expect("Acquire should mint.");

	let sent = transport.sent();
	let mint = &sent[0];

	assert_eq!(mint.method, "POST");
	assert!(mint.is_mint());
	assert!(mint.body.contains("grant_type=client_credentials"));
	assert!(mint.body.contains("scope=%2Faccounts%2Facct-42%2Fcards.read+%2Fping.read"));
	assert!(mint.body.contains("account_id=acct-42"));
	assert!(
		mint.header("authorization").is_some_and(|value| value.starts_with("Basic ")),
		"Client credentials should default to HTTP Basic."
	);
}

#[tokio::test]
async fn failed_mints_leave_the_stale_entry_alone() {
	let transport = ScriptedTransport::new([
		Step::token("tok-1", 60),
		Step::json(500, r#"{"error":"server_error"}"#),
	]);
	let clock = ManualClock::new(START);
	let authority = scripted_authority(&transport).with_clock(clock.clone());
	let scopes = scope(&["/accounts.read"]);

	authority.acquire(&scopes, None).await.expect("First mint should succeed.");
	clock.advance(Duration::seconds(120));

	let err = authority.acquire(&scopes, None).await.expect_err("Second mint should fail.");

	assert!(matches!(
		err,
		Error::Authentication(AuthenticationError::Rejected { status: Some(500), .. })
	));
	assert_eq!(authority.cached_len(), 1, "The stale record should not be removed by a failure.");
	assert!(authority.cached(&scopes, None).is_none(), "The stale record should not be handed out.");
	assert_eq!(authority.metrics().failures(), 1);
}

#[tokio::test]
async fn token_endpoint_failures_are_classified() {
	let transport = ScriptedTransport::new([
		Step::json(401, r#"{"error":"invalid_client","error_description":"bad secret"}"#),
		Step::json(400, r#"{"error":"invalid_scope"}"#),
		Step::json(200, r#"{"access_token":"tok","token_type":"bearer"}"#),
		Step::json(200, r#"{"access_token":"tok","token_type":"bearer","expires_in":60,"scope":"/a"}"#),
		Step::json(200, r#"{"token_type":"bearer","expires_in":60}"#),
	]);
	let authority = scripted_authority(&transport);
	let scopes = scope(&["/a", "/b"]);
	let invalid_client = authority.acquire(&scopes, None).await.expect_err("401 should fail.");
	let scope_denied = authority.acquire(&scopes, None).await.expect_err("invalid_scope should fail.");
	let missing_expiry = authority.acquire(&scopes, None).await.expect_err("No expiry should fail.");
	let narrowed = authority.acquire(&scopes, None).await.expect_err("Narrowed scope should fail.");
	let malformed = authority.acquire(&scopes, None).await.expect_err("No token should fail.");

	assert!(matches!(
		invalid_client,
		Error::Authentication(AuthenticationError::InvalidClient { status: Some(401), .. })
	));
	assert!(matches!(
		scope_denied,
		Error::Authentication(AuthenticationError::ScopeDenied { status: Some(400), .. })
	));
	assert!(matches!(missing_expiry, Error::Authentication(AuthenticationError::MissingExpiry)));
	assert!(matches!(
		narrowed,
		Error::Authentication(AuthenticationError::ScopeDenied { status: Some(200), .. })
	));
	assert!(matches!(
		malformed,
		Error::Authentication(AuthenticationError::MalformedResponse { .. })
	));
	assert_eq!(authority.cached_len(), 0);
}

#[tokio::test]
async fn non_positive_lifetimes_are_rejected() {
	let transport = ScriptedTransport::new([Step::token("tok", 0)]);
	let authority = scripted_authority(&transport);
	let err = authority
		.acquire(&scope(&["/accounts.read"]), None)
		.await
		.expect_err("Zero lifetime should fail.");

	assert!(matches!(err, Error::Authentication(AuthenticationError::NonPositiveExpiry)));
}

#[tokio::test]
async fn transport_failures_surface_with_the_mint_stage() {
	let transport = ScriptedTransport::new([Step::Fail(ErrorKind::TimedOut), Step::Fail(ErrorKind::ConnectionRefused)]);
	let authority = scripted_authority(&transport);
	let scopes = scope(&["/accounts.read"]);
	let timeout = authority.acquire(&scopes, None).await.expect_err("Timeout should fail.");
	let refused = authority.acquire(&scopes, None).await.expect_err("Refusal should fail.");

	assert!(matches!(timeout, Error::Timeout(TimeoutError { stage: CallStage::Mint })));
	assert!(matches!(refused, Error::Authentication(AuthenticationError::Unreachable { .. })));
	assert_eq!(authority.cached_len(), 0);
}

#[tokio::test]
async fn empty_scope_sets_are_rejected_locally() {
	let transport = ScriptedTransport::default();
	let authority = scripted_authority(&transport);
	let err = authority.acquire(&scope(&[]), None).await.expect_err("Empty scope should fail.");

	assert!(matches!(err, Error::Config(ConfigError::EmptyScope)));
	assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn eviction_only_removes_the_rejected_token() {
	let transport = ScriptedTransport::new([Step::token("tok-1", 3600)]);
	let authority = scripted_authority(&transport);
	let scopes = scope(&["/accounts.read"]);
	let record = authority.acquire(&scopes, None).await.expect("Acquire should mint.");
	let mut stale = record.clone();

	stale.access_token = moov_client::auth::TokenSecret::new("tok-0");

	assert_eq!(authority.evict(&scopes, None, &stale), EvictOutcome::Replaced);
	assert_eq!(authority.evict(&scopes, None, &record), EvictOutcome::Evicted);
	assert_eq!(authority.evict(&scopes, None, &record), EvictOutcome::Missing);
}

#[tokio::test]
async fn concurrent_acquires_share_one_mint() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(200))
				.body(token_body("shared-token", 900));
		})
		.await;
	let authority = ReqwestTokenAuthority::new(credential(), descriptor_for(&server))
		.expect("Authority should build.");
	let scopes = scope(&["/transfers.write"]);
	let results = futures_join(&authority, &scopes).await;

	for result in &results {
		let record = result.as_ref().expect("Every waiter should observe the shared mint.");

		assert_eq!(record.access_token.expose(), "shared-token");
		assert_eq!(record.expires_at, results[0].as_ref().expect("First result should be Ok.").expires_at);
	}

	mock.assert_calls_async(1).await;
	assert_eq!(authority.metrics().attempts(), 1);
}

#[tokio::test]
async fn concurrent_failures_reach_every_waiter_without_caching() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(200))
				.body(r#"{"error":"invalid_client"}"#);
		})
		.await;
	let authority = ReqwestTokenAuthority::new(credential(), descriptor_for(&server))
		.expect("Authority should build.");
	let scopes = scope(&["/transfers.write"]);
	let results = futures_join(&authority, &scopes).await;

	for result in results {
		assert!(matches!(
			result,
			Err(Error::Authentication(AuthenticationError::InvalidClient { .. }))
		));
	}

	mock.assert_calls_async(1).await;
	assert_eq!(authority.cached_len(), 0);
}

#[tokio::test]
async fn a_slow_mint_does_not_block_other_keys() {
	let server = MockServer::start_async().await;
	let slow = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).form_urlencoded_tuple("scope", "/transfers.write");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(800))
				.body(token_body("slow-token", 900));
		})
		.await;
	let fast = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).form_urlencoded_tuple("scope", "/transfers.read");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("fast-token", 900));
		})
		.await;
	let authority = ReqwestTokenAuthority::new(credential(), descriptor_for(&server))
		.expect("Authority should build.");
	let write = scope(&["/transfers.write"]);
	let read = scope(&["/transfers.read"]);
	let started = Instant::now();
	let ((slow_result, slow_elapsed), (fast_result, fast_elapsed)) = tokio::join!(
		timed_acquire(&authority, &write, started),
		timed_acquire(&authority, &read, started)
	);

	assert_eq!(
		slow_result.expect("Slow mint should succeed.").access_token.expose(),
		"slow-token"
	);
	assert_eq!(
		fast_result.expect("Fast mint should succeed.").access_token.expose(),
		"fast-token"
	);
	assert!(
		fast_elapsed < std::time::Duration::from_millis(400),
		"Fast key should not wait for the slow mint, took {fast_elapsed:?}."
	);
	assert!(slow_elapsed >= std::time::Duration::from_millis(800));

	slow.assert_calls_async(1).await;
	fast.assert_calls_async(1).await;
}

async fn timed_acquire(
	authority: &ReqwestTokenAuthority,
	scopes: &moov_client::auth::ScopeSet,
	started: Instant,
) -> (moov_client::error::Result<moov_client::auth::TokenRecord>, std::time::Duration) {
	let result = authority.acquire(scopes, None).await;

	(result, started.elapsed())
}

async fn futures_join(
	authority: &ReqwestTokenAuthority,
	scopes: &moov_client::auth::ScopeSet,
) -> Vec<moov_client::error::Result<moov_client::auth::TokenRecord>> {
	let (a, b, c, d, e) = tokio::join!(
		authority.acquire(scopes, None),
		authority.acquire(scopes, None),
		authority.acquire(scopes, None),
		authority.acquire(scopes, None),
		authority.acquire(scopes, None),
	);

	vec![a, b, c, d, e]
}
