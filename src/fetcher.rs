//! Fetcher contracts for obtaining a new token from the issuing endpoint.
//!
//! The cache depends on nothing but [`TokenFetcher`] (blocking) or [`AsyncTokenFetcher`]
//! (cooperative) so tests and downstream crates can plug in any transport. The `reqwest` feature
//! adds [`HttpTokenFetcher`] and [`AsyncHttpTokenFetcher`], which post the configured credential
//! payload as JSON and read the `access_token` field from the response.

#[cfg(feature = "reqwest")] pub mod http;

#[cfg(feature = "reqwest")] pub use http::*;

// crates.io
use serde_json::{Map as JsonObject, Value as JsonValue};
// self
use crate::{
	_prelude::*,
	config::AuthTokenSettings,
	error::{ConfigError, FetchError},
	token::TokenSecret,
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Boxed future returned by [`AsyncTokenFetcher::fetch_token`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, FetchError>> + 'a + Send>>;

/// Blocking token source invoked by [`TokenCache`](crate::cache::TokenCache) while it holds
/// exclusive access to the store.
///
/// Implementations must bound their own latency (e.g., with a request timeout); every other
/// caller waiting on the store waits on this call too.
pub trait TokenFetcher
where
	Self: Send + Sync,
{
	/// Performs one exchange with the issuing endpoint.
	fn fetch_token(&self) -> Result<TokenSecret, FetchError>;
}
impl<F> TokenFetcher for F
where
	F: Send + Sync + Fn() -> Result<TokenSecret, FetchError>,
{
	fn fetch_token(&self) -> Result<TokenSecret, FetchError> {
		self()
	}
}

/// Cooperative token source invoked by
/// [`AsyncTokenCache`](crate::cache::AsyncTokenCache) under its single-flight guard.
pub trait AsyncTokenFetcher
where
	Self: Send + Sync,
{
	/// Performs one exchange with the issuing endpoint.
	fn fetch_token(&self) -> FetchFuture<'_>;
}

/// JSON credential payload posted to the issuing endpoint.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequestBody<'a> {
	/// Account name.
	pub user_name: &'a str,
	/// Account password.
	pub password: &'a str,
	/// Application name.
	pub app_name: &'a str,
	/// Secret name.
	pub secret_name: &'a str,
	/// Redirect URL.
	pub redirect_url: &'a str,
	/// Vault configuration path.
	pub vault_config_path: &'a str,
}
impl<'a> TokenRequestBody<'a> {
	/// Borrows the payload fields from validated settings.
	pub fn from_settings(settings: &'a AuthTokenSettings) -> Self {
		Self {
			user_name: &settings.user_name,
			password: settings.password.expose(),
			app_name: &settings.app_name,
			secret_name: &settings.secret_name,
			redirect_url: &settings.redirect_url,
			vault_config_path: &settings.vault_config_path,
		}
	}

	/// Encodes the payload as a JSON request body.
	pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
		serde_json::to_vec(self).map_err(|source| ConfigError::RequestEncode { source })
	}
}
impl Debug for TokenRequestBody<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequestBody")
			.field("user_name", &self.user_name)
			.field("password", &"<redacted>")
			.field("app_name", &self.app_name)
			.field("secret_name", &self.secret_name)
			.field("redirect_url", &self.redirect_url)
			.field("vault_config_path", &self.vault_config_path)
			.finish()
	}
}

/// Maps an HTTP status + body from the issuing endpoint onto a token or a [`FetchError`].
///
/// Only `200 OK` is accepted. The body must be a JSON object; any other JSON shape is a
/// [`FetchError::MalformedResponse`]. Its `access_token` member must be a non-blank string or a
/// number (taken as its decimal text); anything else is a [`FetchError::MissingToken`].
pub fn parse_token_response(status: u16, body: &[u8]) -> Result<TokenSecret, FetchError> {
	if status != 200 {
		return Err(FetchError::Status { status, body: body_preview(body) });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let mut response: JsonObject<String, JsonValue> =
		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| FetchError::MalformedResponse { source })?;
	let token = match response.remove("access_token") {
		Some(JsonValue::String(token)) => token,
		Some(JsonValue::Number(token)) => token.to_string(),
		_ => return Err(FetchError::MissingToken),
	};
	let token = TokenSecret::new(token);

	if token.is_blank() {
		return Err(FetchError::MissingToken);
	}

	Ok(token)
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	match text.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.into_owned(),
	}
}
