//! Immutable bearer token records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet, token::secret::TokenSecret},
};

/// Lifecycle status for a token record at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is valid and outside the safety margin.
	Active,
	/// Token is still valid but inside the safety margin; it must not be handed out.
	Expiring,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Bearer token minted for one scope set and optional connected account.
///
/// Records are owned by the token store and are never mutated; an expired or rejected record is
/// replaced by a freshly minted one.
#[derive(Clone)]
pub struct TokenRecord {
	/// Normalized scopes the token was requested for.
	pub scope: ScopeSet,
	/// Connected account the token is scoped to, if any.
	pub account: Option<AccountId>,
	/// Bearer token value; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Mint instant.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry instant.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for the provided scope/account pair.
	pub fn builder(scope: ScopeSet, account: Option<AccountId>) -> TokenRecordBuilder {
		TokenRecordBuilder::new(scope, account)
	}

	/// Computes the lifecycle status at `instant`, treating the final `margin` before expiry as
	/// [`TokenStatus::Expiring`].
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> TokenStatus {
		if instant < self.issued_at {
			return TokenStatus::Pending;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}
		if instant >= self.expires_at - margin {
			return TokenStatus::Expiring;
		}

		TokenStatus::Active
	}

	/// Returns `true` when the token may be handed out at `instant`, i.e.
	/// `instant < expires_at - margin`.
	///
	/// Pending records count as fresh; a provider clock slightly ahead of ours must not force a
	/// re-mint.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), TokenStatus::Active | TokenStatus::Pending)
	}

	/// Value for the `Authorization` header.
	pub fn bearer(&self) -> String {
		self.access_token.bearer_value()
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("scope", &self.scope)
			.field("account", &self.account)
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	scope: ScopeSet,
	account: Option<AccountId>,
	access_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	fn new(scope: ScopeSet, account: Option<AccountId>) -> Self {
		Self { scope, account, access_token: None, issued_at: None, expires_at: None, expires_in: None }
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant. Takes precedence over [`expires_in`](Self::expires_in).
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord {
			scope: self.scope,
			account: self.account,
			access_token,
			issued_at,
			expires_at,
		})
	}
}
