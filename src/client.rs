//! Client handle and resource permission checks.
//!
//! [`Client`] bundles the configuration, the transport, and the identity's
//! [`TokenCache`]. Resources obtained from it authenticate every request with the cached
//! token; permission checks are plain request/response calls with no caching of their own.

// self
use crate::{
	_prelude::*,
	authn::Secret,
	cache::TokenCache,
	config::ClientConfig,
	credential::CredentialSupplier,
	error::{ConfigError, ProtocolError},
	http::{HttpRequest, HttpResponse, HttpTransport},
};
#[cfg(feature = "reqwest")] use crate::{credential::ApiKeyCredential, id::Login};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Well-known resource kinds.
pub mod kind {
	/// Human user.
	pub const USER: &str = "user";
	/// Machine identity.
	pub const HOST: &str = "host";
	/// Group of roles.
	pub const GROUP: &str = "group";
	/// Collection of hosts.
	pub const LAYER: &str = "layer";
	/// Loaded policy document.
	pub const POLICY: &str = "policy";
	/// Secret variable.
	pub const VARIABLE: &str = "variable";
	/// Protected web service.
	pub const WEBSERVICE: &str = "webservice";
}

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAuthnClient = Client<ReqwestHttpClient>;

/// Entry point for one identity against one appliance.
pub struct Client<C>
where
	C: ?Sized + HttpTransport,
{
	config: Arc<ClientConfig>,
	http: Arc<C>,
	authenticator: TokenCache<C>,
}
impl<C> Client<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		supplier: Arc<dyn CredentialSupplier>,
		http: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let http = http.into();
		let authenticator = TokenCache::new(&config, supplier, http.clone())?;

		Ok(Self { config: Arc::new(config), http, authenticator })
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Token cache shared by every request made through this client.
	pub fn authenticator(&self) -> &TokenCache<C> {
		&self.authenticator
	}

	/// Returns a handle to the resource `kind`/`name` in the client's account.
	pub fn resource(&self, kind: impl Into<String>, name: impl Into<String>) -> Resource<C> {
		Resource { client: self.clone(), kind: kind.into(), name: name.into() }
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(config: ClientConfig, supplier: Arc<dyn CredentialSupplier>) -> Result<Self, ConfigError> {
		Self::with_http_client(config, supplier, ReqwestHttpClient::new()?)
	}

	/// Shorthand for a client authenticating with a login + API key pair.
	pub fn with_api_key(
		config: ClientConfig,
		login: Login,
		api_key: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::new(config, Arc::new(ApiKeyCredential::new(login, api_key)))
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http: self.http.clone(),
			authenticator: self.authenticator.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("appliance_url", &self.config.appliance_url.as_str())
			.field("account", &self.config.account)
			.finish()
	}
}

/// A resource addressed by account, kind, and name.
pub struct Resource<C>
where
	C: ?Sized + HttpTransport,
{
	client: Client<C>,
	kind: String,
	name: String,
}
impl<C> Resource<C>
where
	C: ?Sized + HttpTransport,
{
	/// Resource kind (see [`kind`]).
	pub fn kind(&self) -> &str {
		&self.kind
	}

	/// Resource name within its kind.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Fully qualified identifier, `account:kind:name`.
	pub fn id(&self) -> String {
		format!("{}:{}:{}", self.client.config.account, self.kind, self.name)
	}

	/// Checks whether the authenticated identity holds `privilege` on this resource,
	/// blocking the calling thread.
	pub fn check_blocking(&self, privilege: &str) -> Result<bool> {
		let token = self.client.authenticator.token_blocking()?;
		let response = self.client.http.execute_blocking(self.check_request(&token, privilege)?)?;

		self.permission_from_response(response, || self.client.authenticator.invalidate_blocking())
	}

	/// Checks whether the authenticated identity holds `privilege` on this resource.
	pub async fn check(&self, privilege: &str) -> Result<bool> {
		let token = self.client.authenticator.token().await?;
		let response = self.client.http.execute(self.check_request(&token, privilege)?).await?;
		let rejected = matches!(response.status, 401);
		let permitted = self.permission_from_response(response, || {});

		if rejected {
			self.client.authenticator.invalidate().await;
		}

		permitted
	}

	fn check_request(&self, token: &Secret, privilege: &str) -> Result<HttpRequest> {
		let account = self.client.config.account.as_ref();
		let segments = ["resources", account, self.kind.as_str(), self.name.as_str(), ""];
		let mut url = self.client.config.endpoint(segments)?;

		url.query_pairs_mut().append_pair("check", "true").append_pair("privilege", privilege);

		Ok(HttpRequest::get(url).with_header("authorization", token.authorization_header()))
	}

	/// 2xx grants, 403 denies. A 401 means the cached token is no longer honored, so
	/// `on_rejected` gets a chance to invalidate it.
	fn permission_from_response(
		&self,
		response: HttpResponse,
		on_rejected: impl FnOnce(),
	) -> Result<bool> {
		match response.status {
			403 => Ok(false),
			401 => {
				on_rejected();

				Err(Error::AuthenticationRejected { status: 401 })
			},
			_ if response.is_success() => Ok(true),
			status => Err(ProtocolError::UnexpectedStatus { status }.into()),
		}
	}
}
impl<C> Debug for Resource<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Resource").field("id", &self.id()).finish()
	}
}
