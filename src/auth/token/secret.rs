//! Opaque strings (bearer tokens, client secrets) that must stay out of logs.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Sensitive string; `Debug` and `Display` print a placeholder instead of the value.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(Arc<str>);
impl TokenSecret {
	/// Wraps a sensitive value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Arc::from(value.into()))
	}

	/// Plain value, for placing on the wire only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `Authorization` header value carrying this secret as a bearer token.
	pub fn bearer_value(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// Compares against a raw value without exposing `self`.
	pub fn matches(&self, candidate: &str) -> bool {
		*self.0 == *candidate
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
