//! Strongly typed identifiers used to address authenticators and resources.

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

const IDENTIFIER_MAX_LEN: usize = 256;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (account, login, service, host).
		kind: &'static str,
	},
	/// The identifier contains control characters.
	#[error("{kind} identifier contains control characters.")]
	ContainsControl {
		/// Kind of identifier (account, login, service, host).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (account, login, service, host).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { AccountId, "Organization account that scopes every authenticator and resource.", "Account" }
def_id! { Login, "Login of a user or host authenticating with an API key.", "Login" }
def_id! { ServiceId, "Service identifier of a non-default authenticator (e.g. `authn-jwt`).", "Service" }
def_id! { HostId, "Host identity presented to a JWT authenticator.", "Host" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_control) {
		return Err(IdentifierError::ContainsControl { kind });
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
	fn identifiers_reject_control_characters_and_empty_values() {
		assert_eq!(
			AccountId::new("\nacme"),
			Err(IdentifierError::ContainsControl { kind: "Account" })
		);
		assert!(Login::new("host/app\t").is_err(), "Tabs must be rejected.");
		assert_eq!(ServiceId::new(""), Err(IdentifierError::Empty { kind: "Service" }));

		let login = Login::new("host/app").expect("Login fixture should be considered valid.");

		assert_eq!(login.as_ref(), "host/app");

		let spaced = HostId::new("my app").expect("Spaces are legal in resource names.");

		assert_eq!(spaced.as_ref(), "my app");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let account: AccountId =
			serde_json::from_str("\"acme\"").expect("Account should deserialize successfully.");

		assert_eq!(account.as_ref(), "acme");
		assert!(serde_json::from_str::<HostId>("\"with\\u0000nul\"").is_err());
	}

	#[test]
	fn length_limit_is_inclusive() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		HostId::new(&exact).expect("Exact length should succeed.");

		assert!(HostId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}
}
