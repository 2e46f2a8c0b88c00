//! Client configuration shared by the token cache and the resource APIs.
//!
//! [`ClientConfig`] is immutable once built. [`ClientConfigBuilder::build`] validates the
//! appliance URL and durations so the cache never has to deal with a zero-length token
//! lifetime or a URL that cannot carry path segments.

/// Builder that validates [`ClientConfig`] values.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, id::AccountId};

/// Validated connection settings for one identity against one appliance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Base URL of the appliance API (e.g. `https://conjur.example.com/api`).
	pub appliance_url: Url,
	/// Organization account.
	pub account: AccountId,
	/// Lifetime assumed for a token when the response carries no usable hint.
	pub token_ttl: Duration,
	/// Safety margin subtracted from a token's own lifetime hint.
	pub refresh_margin: Duration,
}
impl ClientConfig {
	/// Lifetime applied when the authentication response carries no hint.
	pub const DEFAULT_TOKEN_TTL: Duration = Duration::seconds(450);
	/// Margin subtracted from hinted lifetimes so tokens are replaced before the server
	/// stops honoring them.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(30);

	/// Creates a builder for the provided appliance URL and account.
	pub fn builder(appliance_url: impl AsRef<str>, account: impl AsRef<str>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(appliance_url, account)
	}

	/// Returns a URL below the appliance root with the given path segments appended.
	///
	/// Segments are percent-encoded individually, so identifiers such as `host/app` stay a
	/// single segment.
	pub fn endpoint<'a, I>(&self, segments: I) -> Result<Url, ConfigError>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut url = self.appliance_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeBase { url: self.appliance_url.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoint_encodes_each_segment() {
		let config = ClientConfig::builder("https://conjur.example.com/api/", "acme")
			.build()
			.expect("Config fixture should build.");
		let url = config
			.endpoint(["authn", "acme", "host/app", "authenticate"])
			.expect("Endpoint should be derivable from a base URL.");

		assert_eq!(url.as_str(), "https://conjur.example.com/api/authn/acme/host%2Fapp/authenticate");
	}

	#[test]
	fn endpoint_without_base_path() {
		let config = ClientConfig::builder("https://conjur.example.com", "acme")
			.build()
			.expect("Config fixture should build.");
		let url = config
			.endpoint(["resources", "acme", "user", "bacon", ""])
			.expect("Endpoint should be derivable from a base URL.");

		assert_eq!(url.as_str(), "https://conjur.example.com/resources/acme/user/bacon/");
	}
}
