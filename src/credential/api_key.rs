// self
use crate::{
	_prelude::*,
	authn::Secret,
	credential::{AuthnRoute, CredentialPayload, CredentialSupplier},
	error::SupplierError,
	id::Login,
};

/// Static login + API key pair, fixed for the lifetime of the cache.
#[derive(Clone, Debug)]
pub struct ApiKeyCredential {
	/// Login of the user or host.
	pub login: Login,
	/// API key presented as the raw request body.
	pub api_key: Secret,
}
impl ApiKeyCredential {
	/// Creates a credential from a validated login and API key.
	pub fn new(login: Login, api_key: impl Into<String>) -> Self {
		Self { login, api_key: Secret::new(api_key) }
	}
}
impl CredentialSupplier for ApiKeyCredential {
	fn route(&self) -> AuthnRoute {
		AuthnRoute::api_key(self.login.as_ref())
	}

	fn payload(&self) -> Result<CredentialPayload, SupplierError> {
		Ok(CredentialPayload::Secret(self.api_key.clone()))
	}
}
