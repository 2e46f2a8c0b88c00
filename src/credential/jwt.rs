//! JWT assertions produced on demand by pluggable providers.

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	authn::Secret,
	credential::{AuthnRoute, CredentialPayload, CredentialSupplier},
	error::SupplierError,
	id::{HostId, ServiceId},
};

/// Source of the JWT presented to an `authn-jwt` authenticator.
///
/// The provider may return a constant or refresh the assertion through the caller's own
/// infrastructure; the cache only asks for the current value once per fetch.
pub trait JwtProvider: Send + Sync {
	/// Returns the current assertion.
	fn jwt(&self) -> Result<String, SupplierError>;
}
impl<F> JwtProvider for F
where
	F: Fn() -> Result<String, SupplierError> + Send + Sync,
{
	fn jwt(&self) -> Result<String, SupplierError> {
		self()
	}
}

/// Provider returning the same assertion every time.
#[derive(Clone, Debug)]
pub struct ConstantJwtProvider(Secret);
impl ConstantJwtProvider {
	/// Wraps a fixed assertion.
	pub fn new(jwt: impl Into<String>) -> Self {
		Self(Secret::new(jwt))
	}
}
impl JwtProvider for ConstantJwtProvider {
	fn jwt(&self) -> Result<String, SupplierError> {
		Ok(self.0.expose().to_owned())
	}
}

/// Provider that re-reads an assertion file on every call, e.g. a projected Kubernetes
/// service-account token.
#[derive(Clone, Debug)]
pub struct FileJwtProvider {
	path: PathBuf,
}
impl FileJwtProvider {
	/// Default Kubernetes service-account token location.
	pub const KUBERNETES_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

	/// Reads assertions from `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Reads assertions from [`Self::KUBERNETES_TOKEN_PATH`].
	pub fn kubernetes() -> Self {
		Self::new(Self::KUBERNETES_TOKEN_PATH)
	}
}
impl JwtProvider for FileJwtProvider {
	fn jwt(&self) -> Result<String, SupplierError> {
		let raw = std::fs::read_to_string(&self.path).map_err(|e| SupplierError::Io {
			path: self.path.display().to_string(),
			source: Arc::new(e),
		})?;

		Ok(raw.trim().to_owned())
	}
}

/// Credential presenting a provider's JWT to an `authn-jwt` service.
#[derive(Clone, Debug)]
pub struct JwtCredential<P> {
	/// Assertion source.
	pub provider: P,
	/// JWT authenticator service identifier.
	pub service_id: ServiceId,
	/// Optional host identity appended after the account.
	pub host_id: Option<HostId>,
}
impl<P> JwtCredential<P>
where
	P: JwtProvider,
{
	/// Form field carrying the assertion.
	pub const FIELD: &str = "jwt";

	/// Creates a credential that lets the server derive the identity from the token.
	pub fn new(provider: P, service_id: ServiceId) -> Self {
		Self { provider, service_id, host_id: None }
	}

	/// Pins the host identity instead of letting the server derive it.
	pub fn with_host_id(mut self, host_id: HostId) -> Self {
		self.host_id = Some(host_id);

		self
	}
}
impl<P> CredentialSupplier for JwtCredential<P>
where
	P: JwtProvider,
{
	fn route(&self) -> AuthnRoute {
		let route = AuthnRoute::service("jwt", self.service_id.clone());

		match &self.host_id {
			Some(host_id) => route.with_identity(host_id.as_ref()),
			None => route,
		}
	}

	fn payload(&self) -> Result<CredentialPayload, SupplierError> {
		let jwt = self.provider.jwt()?;

		if jwt.is_empty() {
			return Err(SupplierError::EmptyAssertion);
		}

		Ok(CredentialPayload::Assertion { field: Self::FIELD, value: Secret::new(jwt) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::ClientConfig;

	fn config() -> ClientConfig {
		ClientConfig::builder("https://conjur.example.com", "acme")
			.build()
			.expect("Config fixture should build.")
	}

	fn service_id() -> ServiceId {
		ServiceId::new("sid").expect("Service fixture should be valid.")
	}

	#[test]
	fn host_id_is_optional_in_route() {
		let credential = JwtCredential::new(ConstantJwtProvider::new("jwt"), service_id());
		let url = credential.route().endpoint(&config()).expect("Route should resolve.");

		assert_eq!(url.as_str(), "https://conjur.example.com/authn-jwt/sid/acme/authenticate");

		let credential = credential.with_host_id(HostId::new("hid").expect("Host should be valid."));
		let url = credential.route().endpoint(&config()).expect("Route should resolve.");

		assert_eq!(url.as_str(), "https://conjur.example.com/authn-jwt/sid/acme/hid/authenticate");
	}

	#[test]
	fn closure_providers_propagate_failures() {
		let credential = JwtCredential::new(
			|| -> Result<String, SupplierError> { Err(SupplierError::provider("vault sealed")) },
			service_id(),
		);
		let err = credential.payload().expect_err("Provider failures must surface.");

		assert!(matches!(err, SupplierError::Provider { .. }));

		let credential =
			JwtCredential::new(|| -> Result<String, SupplierError> { Ok(String::new()) }, service_id());

		assert!(matches!(credential.payload(), Err(SupplierError::EmptyAssertion)));
	}

	#[test]
	fn file_provider_trims_and_reports_missing_files() {
		let path = std::env::temp_dir().join(format!("conjur-authn-jwt-{}", std::process::id()));

		std::fs::write(&path, "header.payload.signature\n").expect("Fixture file should be written.");

		let provider = FileJwtProvider::new(&path);

		assert_eq!(provider.jwt().expect("Fixture file should be readable."), "header.payload.signature");

		std::fs::remove_file(&path).expect("Fixture file should be removable.");

		assert!(matches!(provider.jwt(), Err(SupplierError::Io { .. })));
	}
}
