// self
use crate::{_prelude::*, config::ClientConfig, error::ConfigError, id::AccountId};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Raw appliance URL, parsed on [`build`](Self::build).
	pub appliance_url: String,
	/// Raw account name, validated on [`build`](Self::build).
	pub account: String,
	/// Fallback token lifetime.
	pub token_ttl: Duration,
	/// Margin subtracted from hinted lifetimes.
	pub refresh_margin: Duration,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with default durations.
	pub fn new(appliance_url: impl AsRef<str>, account: impl AsRef<str>) -> Self {
		Self {
			appliance_url: appliance_url.as_ref().to_owned(),
			account: account.as_ref().to_owned(),
			token_ttl: ClientConfig::DEFAULT_TOKEN_TTL,
			refresh_margin: ClientConfig::DEFAULT_REFRESH_MARGIN,
		}
	}

	/// Overrides the fallback token lifetime.
	pub fn token_ttl(mut self, ttl: Duration) -> Self {
		self.token_ttl = ttl;

		self
	}

	/// Overrides the margin subtracted from hinted lifetimes. Negative values clamp to zero.
	pub fn refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let appliance_url = Url::parse(&self.appliance_url)
			.map_err(|source| ConfigError::InvalidApplianceUrl { source })?;

		if appliance_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeBase { url: self.appliance_url });
		}
		if !self.token_ttl.is_positive() {
			return Err(ConfigError::NonPositiveDuration { field: "token_ttl" });
		}

		let account = AccountId::new(&self.account)?;

		Ok(ClientConfig {
			appliance_url,
			account,
			token_ttl: self.token_ttl,
			refresh_margin: self.refresh_margin,
		})
	}
}
