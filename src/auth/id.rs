//! Strongly typed identifiers for accounts, resources, and OAuth clients.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (account, client, provider, ...).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (account, client, provider, ...).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (account, client, provider, ...).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { AccountId, "Identifier of a platform or connected account.", "Account" }
def_id! { ClientId, "OAuth client identifier used for the client-credentials grant.", "Client" }
def_id! { ProviderId, "Identifier for a provider descriptor.", "Provider" }
def_id! { TransferId, "Identifier of a transfer.", "Transfer" }
def_id! { RefundId, "Identifier of a card transfer refund.", "Refund" }
def_id! { CardId, "Identifier of a linked card.", "Card" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_padding_and_blank_values() {
		assert!(AccountId::new(" acct-123").is_err(), "Leading whitespace must be rejected.");
		assert!(AccountId::new("acct-123 ").is_err(), "Trailing whitespace must be rejected.");

		let account =
			AccountId::new("acct-123").expect("Account fixture should be considered valid.");

		assert_eq!(account.as_ref(), "acct-123");
		assert_eq!(format!("{account:?}"), "Account(acct-123)");
		assert!(ClientId::new("").is_err());
		assert!(TransferId::new("with space").is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let payload = "\"ec7e1848-dc80-4ab0-8827-dd7fc0737b43\"";
		let card: CardId =
			serde_json::from_str(payload).expect("Card identifier should deserialize successfully.");

		assert_eq!(card.as_ref(), "ec7e1848-dc80-4ab0-8827-dd7fc0737b43");
		assert!(serde_json::from_str::<CardId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<CardId>("\"\"").is_err());
	}

	#[test]
	fn unicode_whitespace_and_length_limits() {
		let nbsp = format!("acct{}id", '\u{00A0}');

		assert!(AccountId::new(&nbsp).is_err());

		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		AccountId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(matches!(
			AccountId::new(&too_long),
			Err(IdentifierError::TooLong { kind: "Account", max: IDENTIFIER_MAX_LEN })
		));
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<AccountId, u8> = HashMap::from_iter([(
			AccountId::new("acct-123").expect("Account used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("acct-123"), Some(&7));
	}
}
