//! Credential suppliers that produce the material presented during authentication.
//!
//! The cache and the fetcher only see [`CredentialSupplier`]. The two built-in variants are
//! [`ApiKeyCredential`] (a static login + API key pair) and [`JwtCredential`] (an assertion
//! produced on demand by a pluggable [`JwtProvider`]).

/// Static login + API key credentials.
pub mod api_key;
/// JWT credentials backed by pluggable providers.
pub mod jwt;

pub use api_key::*;
pub use jwt::*;

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	authn::Secret,
	config::ClientConfig,
	error::{ConfigError, SupplierError},
	id::ServiceId,
};

/// Capability that describes where to authenticate and what to present.
///
/// Implementations must be `Send + Sync` so one supplier can back a cache shared across
/// threads. [`payload`](Self::payload) is called once per fetch attempt and must return
/// consistent material for that attempt.
pub trait CredentialSupplier: Send + Sync {
	/// Authenticator route the payload is presented to.
	fn route(&self) -> AuthnRoute;

	/// Produces the current credential material.
	fn payload(&self) -> Result<CredentialPayload, SupplierError>;
}

/// Path components of an authentication endpoint.
///
/// Renders as `authn[-<subtype>][/{service}]/{account}[/{identity}][/{qualifier}]/authenticate`
/// below the appliance URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthnRoute {
	/// Authenticator subtype (`jwt`, `k8s`, ...); `None` selects the API-key authenticator.
	pub subtype: Option<Cow<'static, str>>,
	/// Service identifier for non-default authenticators.
	pub service_id: Option<ServiceId>,
	/// Identity segment following the account.
	pub identity: Option<String>,
	/// Trailing qualifier segment some authenticators expect.
	pub qualifier: Option<String>,
}
impl AuthnRoute {
	/// Route of the default API-key authenticator.
	pub fn api_key(login: impl Into<String>) -> Self {
		Self { subtype: None, service_id: None, identity: Some(login.into()), qualifier: None }
	}

	/// Route of an `authn-<subtype>` authenticator scoped to a service.
	pub fn service(subtype: impl Into<Cow<'static, str>>, service_id: ServiceId) -> Self {
		Self {
			subtype: Some(subtype.into()),
			service_id: Some(service_id),
			identity: None,
			qualifier: None,
		}
	}

	/// Sets the identity segment.
	pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
		self.identity = Some(identity.into());

		self
	}

	/// Sets the qualifier segment.
	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = Some(qualifier.into());

		self
	}

	/// Renders the authenticator segment (`authn` or `authn-<subtype>`).
	pub fn authenticator(&self) -> Cow<'static, str> {
		match &self.subtype {
			Some(subtype) => Cow::Owned(format!("authn-{subtype}")),
			None => Cow::Borrowed("authn"),
		}
	}

	/// Resolves the full authentication URL for the configured appliance + account.
	pub fn endpoint(&self, config: &ClientConfig) -> Result<Url, ConfigError> {
		let authenticator = self.authenticator();
		let mut segments = Vec::with_capacity(6);

		segments.push(&*authenticator);

		if let Some(service_id) = &self.service_id {
			segments.push(service_id.as_ref());
		}

		segments.push(config.account.as_ref());

		if let Some(identity) = &self.identity {
			segments.push(identity);
		}
		if let Some(qualifier) = &self.qualifier {
			segments.push(qualifier);
		}

		segments.push("authenticate");

		config.endpoint(segments)
	}
}

/// Material sent as the body of an authentication request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialPayload {
	/// Raw secret bytes (API-key authenticator).
	Secret(Secret),
	/// A single form field carrying an assertion (e.g. `jwt=<value>`).
	Assertion {
		/// Form field name.
		field: &'static str,
		/// Assertion value, form-urlencoded on the wire.
		value: Secret,
	},
}
impl CredentialPayload {
	/// Content type matching [`into_body`](Self::into_body).
	pub fn content_type(&self) -> &'static str {
		match self {
			Self::Secret(_) => "text/plain",
			Self::Assertion { .. } => "application/x-www-form-urlencoded",
		}
	}

	/// Encodes the payload as a request body.
	pub fn into_body(self) -> Vec<u8> {
		match self {
			Self::Secret(secret) => secret.expose().as_bytes().to_vec(),
			Self::Assertion { field, value } => url::form_urlencoded::Serializer::new(String::new())
				.append_pair(field, value.expose())
				.finish()
				.into_bytes(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ClientConfig {
		ClientConfig::builder("https://conjur.example.com", "acme")
			.build()
			.expect("Config fixture should build.")
	}

	#[test]
	fn service_route_renders_all_segments() {
		let service_id = ServiceId::new("sid").expect("Service fixture should be valid.");
		let url = AuthnRoute::service("jwt", service_id)
			.with_identity("hid")
			.with_qualifier("extra")
			.endpoint(&config())
			.expect("Route should resolve against a base URL.");

		assert_eq!(url.as_str(), "https://conjur.example.com/authn-jwt/sid/acme/hid/extra/authenticate");
	}

	#[test]
	fn assertion_body_is_form_encoded() {
		let payload = CredentialPayload::Assertion {
			field: "jwt",
			value: Secret::new("this is a nice provider"),
		};

		assert_eq!(payload.content_type(), "application/x-www-form-urlencoded");
		assert_eq!(payload.into_body(), b"jwt=this+is+a+nice+provider".to_vec());
	}
}
