//! Best-effort lifetime hints read from signed token envelopes.
//!
//! Tokens stay opaque to callers. When a token happens to be a JSON envelope whose
//! `payload` is base64 JSON carrying `iat` and `exp`, the cache uses that window instead of
//! the configured default; anything else falls back silently.

// crates.io
use base64::{
	Engine,
	prelude::{BASE64_STANDARD, BASE64_URL_SAFE_NO_PAD},
};
// self
use crate::{_prelude::*, authn::Secret};

/// Failures raised while reading claims from a token envelope.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The token is not a JSON envelope with a `payload` field.
	#[error("Token is not a signed JSON envelope.")]
	NotAnEnvelope,
	/// The payload is not valid base64.
	#[error("Token payload is not valid base64.")]
	Encoding(#[from] base64::DecodeError),
	/// The decoded payload does not carry the expected claims.
	#[error("Token payload claims are malformed.")]
	Malformed(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Timing claims carried by a token envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Subject the token was issued to.
	#[serde(default)]
	pub sub: Option<String>,
	/// Issued-at, in seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, in seconds since the Unix epoch.
	pub exp: i64,
}
impl TokenClaims {
	/// Decodes the claims of an envelope token.
	pub fn decode(token: &Secret) -> Result<Self, ClaimsError> {
		#[derive(Deserialize)]
		struct Envelope {
			payload: String,
		}

		let envelope = serde_json::from_str::<Envelope>(token.expose())
			.map_err(|_| ClaimsError::NotAnEnvelope)?;
		let trimmed = envelope.payload.trim_end_matches('=');
		let raw = BASE64_URL_SAFE_NO_PAD
			.decode(trimmed)
			.or_else(|_| BASE64_STANDARD.decode(&envelope.payload))?;
		let mut de = serde_json::Deserializer::from_slice(&raw);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Validity window declared by the issuer, `None` if it does not fit a [`Duration`].
	pub fn lifetime(&self) -> Option<Duration> {
		self.exp.checked_sub(self.iat).map(Duration::seconds)
	}
}

/// Upper bound for a lifetime read from token claims.
pub const MAX_HINTED_LIFETIME: Duration = Duration::days(1);

/// Lifetime to arm the expiration timer with for `token`.
///
/// Uses the token's own window minus `margin` when it is positive, capped at
/// [`MAX_HINTED_LIFETIME`]; otherwise `default`.
pub fn token_lifetime(token: &Secret, default: Duration, margin: Duration) -> Duration {
	let hinted = TokenClaims::decode(token)
		.ok()
		.and_then(|claims| claims.lifetime())
		.and_then(|lifetime| lifetime.checked_sub(margin));

	match hinted {
		Some(hinted) if hinted.is_positive() => hinted.min(MAX_HINTED_LIFETIME),
		_ => default,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn envelope(payload: &str) -> Secret {
		let encoded = BASE64_URL_SAFE_NO_PAD.encode(payload);

		Secret::new(format!("{{\"protected\":\"e30\",\"payload\":\"{encoded}\",\"signature\":\"sig\"}}"))
	}

	#[test]
	fn envelope_claims_drive_lifetime() {
		let token = envelope("{\"sub\":\"admin\",\"iat\":1700000000,\"exp\":1700000480}");
		let claims = TokenClaims::decode(&token).expect("Envelope fixture should decode.");

		assert_eq!(claims.sub.as_deref(), Some("admin"));
		assert_eq!(claims.lifetime(), Some(Duration::seconds(480)));
		assert_eq!(
			token_lifetime(&token, Duration::seconds(60), Duration::seconds(30)),
			Duration::seconds(450)
		);
	}

	#[test]
	fn opaque_or_malformed_tokens_use_default() {
		let default = Duration::seconds(90);

		assert_eq!(token_lifetime(&Secret::new("token1"), default, Duration::ZERO), default);

		let missing_exp = envelope("{\"iat\":1700000000}");
		let err = TokenClaims::decode(&missing_exp).expect_err("Claims without exp are malformed.");

		assert!(matches!(err, ClaimsError::Malformed(_)));
		assert_eq!(token_lifetime(&missing_exp, default, Duration::ZERO), default);

		let too_short = envelope("{\"iat\":1700000000,\"exp\":1700000010}");

		assert_eq!(token_lifetime(&too_short, default, Duration::seconds(30)), default);
	}

	#[test]
	fn extreme_claims_never_overflow() {
		let default = Duration::seconds(90);
		let margin = Duration::seconds(30);
		let far_future = envelope(&format!("{{\"iat\":0,\"exp\":{}}}", i64::MAX));

		assert_eq!(token_lifetime(&far_future, default, margin), MAX_HINTED_LIFETIME);

		let far_past = envelope(&format!("{{\"iat\":1,\"exp\":{}}}", i64::MIN));

		assert_eq!(TokenClaims::decode(&far_past).expect("Claims should decode.").lifetime(), None);
		assert_eq!(token_lifetime(&far_past, default, margin), default);

		let regular = envelope("{\"iat\":1700000000,\"exp\":1700000480}");

		assert_eq!(token_lifetime(&regular, default, Duration::MIN), default);
	}
}
