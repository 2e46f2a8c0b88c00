//! Secret wrapper that redacts sensitive material.

// crates.io
use base64::{Engine, prelude::BASE64_STANDARD};
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping API keys, assertions, and tokens out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Renders the value as a `Token token="<base64>"` authorization header.
	pub fn authorization_header(&self) -> String {
		format!("Token token=\"{}\"", BASE64_STANDARD.encode(self.0.as_bytes()))
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn authorization_header_base64_encodes_token() {
		let secret = Secret::new("token1");

		assert_eq!(secret.authorization_header(), "Token token=\"dG9rZW4x\"");
	}
}
