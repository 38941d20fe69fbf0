//! Request signing contracts that let downstream crates attach the cached token to arbitrary
//! HTTP clients.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{AUTHORIZATION, HeaderValue};
// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::token::TokenSecret;

/// Describes how to attach a [`TokenSecret`] to an outbound request without constraining the
/// HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects authorization state derived from `token`.
	fn attach_token(&self, request: Request, token: &TokenSecret) -> Result<Request, Error>;
}

/// Signer that sets the `Authorization: Bearer <token>` header on reqwest request builders.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, ConfigError> for BearerSigner {
	fn attach_token(
		&self,
		request: reqwest::RequestBuilder,
		token: &TokenSecret,
	) -> Result<reqwest::RequestBuilder, ConfigError> {
		Ok(request.header(AUTHORIZATION, bearer_header_value(token)?))
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::blocking::RequestBuilder, ConfigError> for BearerSigner {
	fn attach_token(
		&self,
		request: reqwest::blocking::RequestBuilder,
		token: &TokenSecret,
	) -> Result<reqwest::blocking::RequestBuilder, ConfigError> {
		Ok(request.header(AUTHORIZATION, bearer_header_value(token)?))
	}
}

/// Builds a sensitive `Bearer <token>` header value.
#[cfg(feature = "reqwest")]
pub fn bearer_header_value(token: &TokenSecret) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
		.map_err(|_| ConfigError::InvalidBearerHeader)?;

	value.set_sensitive(true);

	Ok(value)
}
