//! Bearer credential provider contract consumed by request-sending components.

// self
use crate::{
	_prelude::*,
	cache::{AsyncTokenCache, TokenCache},
	error::FetchError,
	ext::RequestSignerExt,
	fetcher::{AsyncTokenFetcher, FetchFuture, TokenFetcher},
	token::TokenSecret,
};

/// Synchronous source of the bearer credential for outgoing requests.
pub trait BearerTokenProvider
where
	Self: Send + Sync,
{
	/// Returns the current token, refreshing it when necessary.
	fn bearer_token(&self) -> Result<TokenSecret, FetchError>;
}
impl<F> BearerTokenProvider for TokenCache<F>
where
	F: TokenFetcher,
{
	fn bearer_token(&self) -> Result<TokenSecret, FetchError> {
		self.get_token()
	}
}

/// Cooperative source of the bearer credential for outgoing requests.
pub trait AsyncBearerTokenProvider
where
	Self: Send + Sync,
{
	/// Returns the current token, refreshing it when necessary.
	fn bearer_token(&self) -> FetchFuture<'_>;
}
impl<F> AsyncBearerTokenProvider for AsyncTokenCache<F>
where
	F: AsyncTokenFetcher,
{
	fn bearer_token(&self) -> FetchFuture<'_> {
		Box::pin(self.get_token())
	}
}

/// Obtains the provider's current token and hands it to `signer` for `request`.
pub fn sign_request<P, S, R, E>(provider: &P, signer: &S, request: R) -> Result<R>
where
	P: ?Sized + BearerTokenProvider,
	S: ?Sized + RequestSignerExt<R, E>,
	Error: From<E>,
{
	let token = provider.bearer_token()?;

	Ok(signer.attach_token(request, &token)?)
}
