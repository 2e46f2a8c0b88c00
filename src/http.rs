//! Transport primitives for authentication and resource requests.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. It exposes one
//! suspending and one blocking entry point so the token cache can stay on the caller's
//! execution model: async callers never block a worker thread and blocking callers never
//! need a runtime. [`ReqwestHttpClient`] is the default implementation.

// std
#[cfg(feature = "reqwest")] use std::sync::OnceLock;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{Method as ReqwestMethod, blocking::Client as ReqwestBlockingClient, redirect::Policy};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients able to serve both calling conventions.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by a
/// client, its token cache, and any number of resources. Neither entry point retries; a
/// failed request is reported once and the caller decides what to do next.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` without blocking the calling thread.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;

	/// Executes `request`, blocking the calling thread until the response arrives.
	fn execute_blocking(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// HTTP methods used by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
}
impl Method {
	/// Returns the method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-neutral outbound request.
#[derive(Clone)]
pub struct HttpRequest {
	/// Request method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(&'static str, String)>,
	/// Raw request body.
	pub body: Vec<u8>,
}
impl HttpRequest {
	/// Builds a `GET` request without a body.
	pub fn get(url: Url) -> Self {
		Self { method: Method::Get, url, headers: Vec::new(), body: Vec::new() }
	}

	/// Builds a `POST` request carrying `body` as `content_type`.
	pub fn post(url: Url, content_type: &str, body: Vec<u8>) -> Self {
		Self {
			method: Method::Post,
			url,
			headers: vec![("content-type", content_type.to_owned())],
			body,
		}
	}

	/// Appends a header.
	pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Header values and bodies carry credentials.
		f.debug_struct("HttpRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>())
			.field("body_len", &self.body.len())
			.finish()
	}
}

/// Status and body of a completed request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Default transport backed by reqwest.
///
/// The async client is used by [`HttpTransport::execute`]. The blocking client is built on
/// first use so purely async callers never start its background runtime; like every
/// `reqwest::blocking` client it must not be used or dropped from inside an async runtime.
/// Redirects are never followed because authentication endpoints answer directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	blocking: Arc<OnceLock<ReqwestBlockingClient>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a transport with redirect following disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self::with_client(client))
	}

	/// Wraps an existing async reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, blocking: Default::default() }
	}

	fn blocking_client(&self) -> Result<&ReqwestBlockingClient, TransportError> {
		if let Some(client) = self.blocking.get() {
			return Ok(client);
		}

		let client = ReqwestBlockingClient::builder().redirect(Policy::none()).build()?;

		Ok(self.blocking.get_or_init(|| client))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.client.clone();

		Box::pin(async move {
			let mut builder = client.request(reqwest_method(request.method), request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}

			let response = builder.body(request.body).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}

	fn execute_blocking(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		let client = self.blocking_client()?;
		let mut builder = client.request(reqwest_method(request.method), request.url);

		for (name, value) in request.headers {
			builder = builder.header(name, value);
		}

		let response = builder.body(request.body).send()?;
		let status = response.status().as_u16();
		let body = response.bytes()?.to_vec();

		Ok(HttpResponse { status, body })
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> ReqwestMethod {
	match method {
		Method::Get => ReqwestMethod::GET,
		Method::Post => ReqwestMethod::POST,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_debug_hides_header_values() {
		let url = Url::parse("https://conjur.example.com/resources").expect("URL should parse.");
		let request = HttpRequest::get(url).with_header("authorization", "Token token=\"c2VjcmV0\"");
		let rendered = format!("{request:?}");

		assert!(rendered.contains("authorization"));
		assert!(!rendered.contains("c2VjcmV0"));
	}

	#[test]
	fn success_range_is_2xx() {
		assert!(HttpResponse::new(204, Vec::new()).is_success());
		assert!(!HttpResponse::new(302, Vec::new()).is_success());
		assert!(!HttpResponse::new(403, Vec::new()).is_success());
	}
}
