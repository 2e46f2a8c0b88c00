//! One-shot authentication exchange.
//!
//! [`TokenFetcher`] turns the supplier's current material into exactly one `POST` against
//! the authenticator route and classifies the response. It neither caches nor retries;
//! [`crate::cache::TokenCache`] decides when a fetch is worth making.

// self
use crate::{
	_prelude::*,
	authn::Secret,
	config::ClientConfig,
	credential::CredentialSupplier,
	error::{ConfigError, ProtocolError},
	http::{HttpRequest, HttpResponse, HttpTransport},
};

/// Request/response adapter for one identity's authentication endpoint.
pub struct TokenFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	http: Arc<C>,
	supplier: Arc<dyn CredentialSupplier>,
	endpoint: Url,
}
impl<C> TokenFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	/// Resolves the supplier's route against `config` and binds the transport.
	pub fn new(
		config: &ClientConfig,
		supplier: Arc<dyn CredentialSupplier>,
		http: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let endpoint = supplier.route().endpoint(config)?;

		Ok(Self { http: http.into(), supplier, endpoint })
	}

	/// Authentication URL every fetch posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Performs one authentication exchange without blocking the calling thread.
	pub async fn fetch(&self) -> Result<Secret> {
		let request = self.request()?;
		let response = self.http.execute(request).await?;

		token_from_response(response)
	}

	/// Performs one authentication exchange, blocking the calling thread.
	pub fn fetch_blocking(&self) -> Result<Secret> {
		let request = self.request()?;
		let response = self.http.execute_blocking(request)?;

		token_from_response(response)
	}

	fn request(&self) -> Result<HttpRequest> {
		let payload = self.supplier.payload()?;

		Ok(HttpRequest::post(self.endpoint.clone(), payload.content_type(), payload.into_body()))
	}
}
impl<C> Debug for TokenFetcher<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenFetcher").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

fn token_from_response(response: HttpResponse) -> Result<Secret> {
	match response.status {
		401 | 403 => Err(Error::AuthenticationRejected { status: response.status }),
		_ if !response.is_success() =>
			Err(ProtocolError::UnexpectedStatus { status: response.status }.into()),
		_ if response.body.is_empty() => Err(ProtocolError::EmptyBody.into()),
		_ => String::from_utf8(response.body)
			.map(Secret::new)
			.map_err(|_| ProtocolError::InvalidUtf8.into()),
	}
}
