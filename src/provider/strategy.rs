//! Mint strategy hooks that customize token requests.
//!
//! Implementations decorate outgoing token requests and normalize error mapping without tying
//! the authority to any particular HTTP client.

// self
use crate::{_prelude::*, auth::AccountId};

/// Strategy hook that allows deployments to decorate token requests and classify errors.
///
/// Implementors must be `Send + Sync`; the hooks use crate-owned data so downstream crates never
/// depend on reqwest-specific structures. Only
/// [`classify_token_error`](Self::classify_token_error) is required.
pub trait MintStrategy
where
	Self: Send + Sync,
{
	/// Maps a failed token response into the authentication taxonomy.
	fn classify_token_error(&self, ctx: &MintErrorContext) -> MintErrorKind;

	/// Adds custom form parameters before a mint is dispatched.
	///
	/// `account_param` is the descriptor's configured parameter name. The default implementation
	/// sends the connected account, when present, under that name.
	fn augment_token_request(
		&self,
		account_param: &str,
		account: Option<&AccountId>,
		form: &mut BTreeMap<String, String>,
	) {
		if let Some(account) = account {
			form.insert(account_param.to_owned(), account.to_string());
		}
	}
}

/// Canonical token failure categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintErrorKind {
	/// Client authentication failed.
	InvalidClient,
	/// The provider refused one or more requested scopes.
	ScopeDenied,
	/// Any other rejection.
	Rejected,
}

/// Context passed to strategies when classifying token errors.
///
/// Only primitive data (status code, OAuth fields, body preview) is kept so strategies stay
/// decoupled from the HTTP client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MintErrorContext {
	/// HTTP status code returned by the token endpoint, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl MintErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}

	/// Best available human-readable reason for the failure.
	pub fn reason(&self) -> String {
		self.error_description
			.clone()
			.or_else(|| self.oauth_error.clone())
			.or_else(|| self.body_preview.clone().filter(|body| !body.is_empty()))
			.or_else(|| self.http_status.map(|status| format!("HTTP {status}")))
			.unwrap_or_else(|| "unknown token endpoint failure".into())
	}
}

/// Default strategy that applies RFC 6749 heuristics.
///
/// Structured OAuth fields (`error`, `error_description`) win, then body text hints, and finally
/// the HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultMintStrategy;
impl Display for DefaultMintStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-mint-strategy")
	}
}
impl MintStrategy for DefaultMintStrategy {
	fn classify_token_error(&self, ctx: &MintErrorContext) -> MintErrorKind {
		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= MintErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(MintErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<MintErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<MintErrorKind> {
	if value.eq_ignore_ascii_case("invalid_client") || value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(MintErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
		|| value.eq_ignore_ascii_case("access_denied")
	{
		Some(MintErrorKind::ScopeDenied)
	} else if value.eq_ignore_ascii_case("invalid_request")
		|| value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("unsupported_grant_type")
	{
		Some(MintErrorKind::Rejected)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<MintErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_client") || text.contains("unauthorized_client") =>
			Some(MintErrorKind::InvalidClient),
		text if text.contains("invalid_scope") || text.contains("insufficient_scope") =>
			Some(MintErrorKind::ScopeDenied),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> MintErrorKind {
	match status {
		Some(401) => MintErrorKind::InvalidClient,
		Some(403) => MintErrorKind::ScopeDenied,
		_ => MintErrorKind::Rejected,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn structured_fields_take_precedence() {
		let strategy = DefaultMintStrategy;
		let ctx = MintErrorContext::default().with_http_status(400).with_oauth_error("invalid_client");

		assert_eq!(strategy.classify_token_error(&ctx), MintErrorKind::InvalidClient);

		let ctx = MintErrorContext::default().with_http_status(401).with_oauth_error("invalid_scope");

		assert_eq!(strategy.classify_token_error(&ctx), MintErrorKind::ScopeDenied);
	}

	#[test]
	fn body_and_status_fallbacks() {
		let strategy = DefaultMintStrategy;
		let ctx = MintErrorContext::default()
			.with_http_status(400)
			.with_body_preview("<p>insufficient_scope for /cards.write</p>");

		assert_eq!(strategy.classify_token_error(&ctx), MintErrorKind::ScopeDenied);
		assert_eq!(
			strategy.classify_token_error(&MintErrorContext::default().with_http_status(401)),
			MintErrorKind::InvalidClient
		);
		assert_eq!(
			strategy.classify_token_error(&MintErrorContext::default().with_http_status(403)),
			MintErrorKind::ScopeDenied
		);
		assert_eq!(
			strategy.classify_token_error(&MintErrorContext::default().with_http_status(500)),
			MintErrorKind::Rejected
		);
	}

	#[test]
	fn default_augmentation_sends_the_account() {
		let strategy = DefaultMintStrategy;
		let account = AccountId::new("acct-9").expect("Account fixture should be valid.");
		let mut form = BTreeMap::new();

		strategy.augment_token_request("account_id", None, &mut form);

		assert!(form.is_empty());

		strategy.augment_token_request("account_id", Some(&account), &mut form);

		assert_eq!(form.get("account_id").map(String::as_str), Some("acct-9"));
	}

	#[test]
	fn previews_are_truncated_and_reasons_fall_back() {
		let ctx = MintErrorContext::default().with_body_preview("x".repeat(300));

		assert_eq!(ctx.body_preview.as_ref().map(|body| body.chars().count()), Some(257));
		assert_eq!(MintErrorContext::default().with_http_status(502).reason(), "HTTP 502");
		assert_eq!(
			MintErrorContext::default()
				.with_oauth_error("invalid_client")
				.with_error_description("bad secret")
				.reason(),
			"bad secret"
		);
	}
}
