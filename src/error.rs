//! Cache-level error types shared across the store, fetchers, and configuration.

// self
use crate::{_prelude::*, config::SettingsError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs that touch more than the refresh path.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token endpoint exchange failed.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Failures raised while obtaining a new token from the issuing endpoint.
///
/// A fetch error aborts the refresh attempt that raised it; the cache never retries internally
/// and never evicts the previously stored record because of it.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint did not answer within the configured request timeout.
	#[error("Token endpoint did not respond within the configured timeout.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}: {body}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body preview.
		body: String,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Success response did not carry a usable `access_token`.
	#[error("Token endpoint response is missing the access_token field.")]
	MissingToken,
	/// Fetcher-specific failure without a structured source.
	#[error("Token endpoint is unavailable: {message}.")]
	Unavailable {
		/// Fetcher-supplied message summarizing the failure.
		message: String,
	},
}
impl FetchError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Builds an [`FetchError::Unavailable`] from a plain message.
	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::Unavailable { message: message.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for FetchError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Settings failed validation.
	#[error(transparent)]
	Settings(#[from] SettingsError),
	/// Credential payload could not be encoded as JSON.
	#[error("Credential payload could not be encoded.")]
	RequestEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Token cannot be represented as an HTTP header value.
	#[error("Token contains characters that are not valid in an Authorization header.")]
	InvalidBearerHeader,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}
