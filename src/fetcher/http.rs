//! `reqwest`-backed fetchers that post the credential payload to the issuing endpoint.
//!
//! Both fetchers encode the payload once at construction, refuse to follow redirects (the token
//! endpoint must answer directly), and carry the connect + request timeouts from
//! [`AuthTokenSettings`] so a hung endpoint cannot stall the callers queued behind a refresh.

// crates.io
use reqwest::{
	header::{ACCEPT, CONTENT_TYPE},
	redirect::Policy,
};
// self
use crate::{
	_prelude::*,
	config::AuthTokenSettings,
	error::{ConfigError, FetchError},
	fetcher::{self, AsyncTokenFetcher, FetchFuture, TokenFetcher, TokenRequestBody},
	token::TokenSecret,
};

const APPLICATION_JSON: &str = "application/json";

/// Blocking fetcher built on [`reqwest::blocking::Client`].
///
/// Do not construct or drop it from inside an async runtime; use [`AsyncHttpTokenFetcher`] there.
#[derive(Clone)]
pub struct HttpTokenFetcher {
	client: reqwest::blocking::Client,
	endpoint: Url,
	body: Arc<[u8]>,
}
impl HttpTokenFetcher {
	/// Validates `settings` and builds a client with its timeouts.
	pub fn new(settings: &AuthTokenSettings) -> Result<Self, ConfigError> {
		settings.validate()?;

		let client = reqwest::blocking::Client::builder()
			.connect_timeout(settings.connect_timeout())
			.timeout(settings.request_timeout())
			.redirect(Policy::none())
			.build()?;

		Self::with_client(settings, client)
	}

	/// Reuses a caller-provided client; the caller owns its timeout configuration.
	pub fn with_client(
		settings: &AuthTokenSettings,
		client: reqwest::blocking::Client,
	) -> Result<Self, ConfigError> {
		let body = TokenRequestBody::from_settings(settings).to_json()?;

		Ok(Self { client, endpoint: settings.auth_url.clone(), body: body.into() })
	}

	/// Returns the endpoint this fetcher posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
impl TokenFetcher for HttpTokenFetcher {
	fn fetch_token(&self) -> Result<TokenSecret, FetchError> {
		let response = self
			.client
			.post(self.endpoint.clone())
			.header(CONTENT_TYPE, APPLICATION_JSON)
			.header(ACCEPT, APPLICATION_JSON)
			.body(self.body.to_vec())
			.send()?;
		let status = response.status().as_u16();
		let body = response.bytes()?;

		fetcher::parse_token_response(status, &body)
	}
}
impl Debug for HttpTokenFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenFetcher").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

/// Async fetcher built on [`ReqwestClient`](reqwest::Client).
#[derive(Clone)]
pub struct AsyncHttpTokenFetcher {
	client: reqwest::Client,
	endpoint: Url,
	body: Arc<[u8]>,
}
impl AsyncHttpTokenFetcher {
	/// Validates `settings` and builds a client with its timeouts.
	pub fn new(settings: &AuthTokenSettings) -> Result<Self, ConfigError> {
		settings.validate()?;

		let client = reqwest::Client::builder()
			.connect_timeout(settings.connect_timeout())
			.timeout(settings.request_timeout())
			.redirect(Policy::none())
			.build()?;

		Self::with_client(settings, client)
	}

	/// Reuses a caller-provided client; the caller owns its timeout configuration.
	pub fn with_client(
		settings: &AuthTokenSettings,
		client: reqwest::Client,
	) -> Result<Self, ConfigError> {
		let body = TokenRequestBody::from_settings(settings).to_json()?;

		Ok(Self { client, endpoint: settings.auth_url.clone(), body: body.into() })
	}

	/// Returns the endpoint this fetcher posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
impl AsyncTokenFetcher for AsyncHttpTokenFetcher {
	fn fetch_token(&self) -> FetchFuture<'_> {
		Box::pin(async move {
			let response = self
				.client
				.post(self.endpoint.clone())
				.header(CONTENT_TYPE, APPLICATION_JSON)
				.header(ACCEPT, APPLICATION_JSON)
				.body(self.body.to_vec())
				.send()
				.await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?;

			fetcher::parse_token_response(status, &body)
		})
	}
}
impl Debug for AsyncHttpTokenFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AsyncHttpTokenFetcher").field("endpoint", &self.endpoint.as_str()).finish()
	}
}
