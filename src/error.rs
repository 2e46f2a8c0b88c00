//! Error types shared by the token cache, the fetcher, and the client surface.
//!
//! Every variant is `Clone` because one fetch outcome is handed to all callers that waited
//! on it; boxed sources therefore live behind [`Arc`].

// self
use crate::{_prelude::*, id::IdentifierError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport-level failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Connectivity(#[from] TransportError),
	/// The server answered, but not with something usable.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// The credential supplier could not produce authentication material.
	#[error(transparent)]
	CredentialSupplier(#[from] SupplierError),

	/// The server refused the presented credentials.
	#[error("Authentication was rejected with HTTP {status}.")]
	AuthenticationRejected {
		/// HTTP status code returned by the server.
		status: u16,
	},
}
impl Error {
	/// Stable label used for span fields and metric labels.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Config(_) => "config",
			Self::Connectivity(_) => "connectivity",
			Self::Protocol(_) => "protocol",
			Self::CredentialSupplier(_) => "credential_supplier",
			Self::AuthenticationRejected { .. } => "authentication_rejected",
		}
	}
}

/// Configuration and validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// Appliance URL cannot be parsed.
	#[error("Appliance URL is invalid.")]
	InvalidApplianceUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Appliance URL cannot carry path segments (e.g. `mailto:`).
	#[error("Appliance URL `{url}` cannot be used as a base URL.")]
	CannotBeBase {
		/// Offending URL.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Token lifetimes must be strictly positive.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Configuration field that failed validation.
		field: &'static str,
	},
	/// An account, login, or service identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}

/// Transport-level failures (network, I/O).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying I/O failure surfaced during transport.
	#[error("I/O error occurred while calling the server.")]
	Io {
		/// Original I/O error.
		#[source]
		source: Arc<std::io::Error>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Malformed or unexpected responses.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProtocolError {
	/// Authentication succeeded but the response body was empty.
	#[error("Authentication response body is empty.")]
	EmptyBody,
	/// Authentication succeeded but the response body is not UTF-8.
	#[error("Authentication response body is not valid UTF-8.")]
	InvalidUtf8,
	/// Status code outside of what the endpoint is documented to return.
	#[error("Server returned unexpected HTTP {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the server.
		status: u16,
	},
}

/// Failures raised while producing credential material.
#[derive(Clone, Debug, ThisError)]
pub enum SupplierError {
	/// A pluggable provider reported a failure.
	#[error("Credential provider failed: {message}.")]
	Provider {
		/// Provider-supplied message.
		message: String,
	},
	/// A provider produced an empty assertion.
	#[error("Credential provider returned an empty assertion.")]
	EmptyAssertion,
	/// A file-backed provider could not read its source.
	#[error("Credential file `{path}` could not be read.")]
	Io {
		/// Path that failed to read.
		path: String,
		/// Original I/O error.
		#[source]
		source: Arc<std::io::Error>,
	},
}
impl SupplierError {
	/// Builds a provider failure from any displayable message.
	pub fn provider(message: impl Into<String>) -> Self {
		Self::Provider { message: message.into() }
	}
}
