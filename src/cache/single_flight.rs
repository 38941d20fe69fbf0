//! Cooperative variant of the cache for async runtimes.
//!
//! Instead of blocking a thread on exclusive access while the fetch is in flight,
//! [`AsyncTokenCache`] queues stale-observing callers on an async single-flight guard. The guard
//! holder re-checks the store, awaits the fetcher, and writes the result through a short
//! exclusive section that never spans an `.await`. Waiters re-check once they get the guard and
//! pick up the fresh record instead of fetching again.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	cache::{self, CacheMetrics},
	error::FetchError,
	fetcher::AsyncTokenFetcher,
	obs::{self, AccessTier, RefreshSpan},
	store::TokenStore,
	token::{TokenRecord, TokenSecret},
};
#[cfg(feature = "reqwest")]
use crate::{config::AuthTokenSettings, error::ConfigError, fetcher::AsyncHttpTokenFetcher};

/// Async token cache sharing the same [`TokenStore`] contract as
/// [`TokenCache`](crate::cache::TokenCache).
///
/// Store access still goes through the blocking `parking_lot` guards, held only for a record
/// clone or a single write. A blocking [`TokenCache`](crate::cache::TokenCache) over the same
/// store holds exclusive access for its whole fetch, so sharing a store with one can park a
/// runtime worker for up to that fetcher's request timeout. Give async caches a dedicated store,
/// or share it only with other async caches.
pub struct AsyncTokenCache<F>
where
	F: AsyncTokenFetcher,
{
	store: Arc<TokenStore>,
	fetcher: F,
	ttl: Duration,
	metrics: Arc<CacheMetrics>,
	in_flight: AsyncMutex<()>,
}
impl<F> AsyncTokenCache<F>
where
	F: AsyncTokenFetcher,
{
	/// Creates a cache over `store` that grants each fetched token `ttl` of validity.
	///
	/// `store` should not be shared with a blocking
	/// [`TokenCache`](crate::cache::TokenCache); see the type-level docs.
	pub fn new(store: Arc<TokenStore>, fetcher: F, ttl: Duration) -> Self {
		Self { store, fetcher, ttl, metrics: Default::default(), in_flight: AsyncMutex::new(()) }
	}

	/// Returns the current token, refreshing it first when it is absent or expired.
	///
	/// Dropping the returned future before it resolves releases the single-flight guard and
	/// leaves the store untouched.
	pub async fn get_token(&self) -> Result<TokenSecret, FetchError> {
		if let Some(token) = cache::read_optimistic(&self.store) {
			return Ok(self.served(AccessTier::Optimistic, token));
		}
		if let Some(token) = cache::read_shared(&self.store) {
			return Ok(self.served(AccessTier::Shared, token));
		}

		let _single_flight = self.in_flight.lock().await;

		if let Some(token) = cache::read_shared(&self.store) {
			return Ok(self.served(AccessTier::Exclusive, token));
		}

		let span = RefreshSpan::new("get_token_async");

		span.instrument(self.refresh()).await
	}

	/// Resets the shared store to its empty state.
	pub fn clear(&self) {
		self.store.clear();
	}

	/// Returns the shared store.
	pub fn store(&self) -> &Arc<TokenStore> {
		&self.store
	}

	/// Returns the fetcher used for refreshes.
	pub fn fetcher(&self) -> &F {
		&self.fetcher
	}

	/// Returns the validity window granted to each fetched token.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the lookup and refresh counters.
	pub fn metrics(&self) -> &Arc<CacheMetrics> {
		&self.metrics
	}

	async fn refresh(&self) -> Result<TokenSecret, FetchError> {
		obs::refresh_started();
		self.metrics.record_fetch_attempt();

		let started = Instant::now();

		match self.fetcher.fetch_token().await {
			Ok(token) => {
				self.store_fetched(token.clone(), started);

				Ok(token)
			},
			Err(err) => {
				cache::fail(&err, &self.metrics, started);

				Err(err)
			},
		}
	}

	fn store_fetched(&self, token: TokenSecret, started: Instant) {
		let record = TokenRecord::issued(token, OffsetDateTime::now_utc(), self.ttl);
		let mut guard = self.store.acquire_exclusive();

		cache::commit(&self.store, &mut guard, record, &self.metrics, started);
	}

	fn served(&self, tier: AccessTier, token: TokenSecret) -> TokenSecret {
		cache::record_hit(tier, &self.metrics);

		token
	}
}
#[cfg(feature = "reqwest")]
impl AsyncTokenCache<AsyncHttpTokenFetcher> {
	/// Builds a cache over `store` backed by an async reqwest fetcher for `settings`.
	pub fn from_settings(
		store: Arc<TokenStore>,
		settings: &AuthTokenSettings,
	) -> Result<Self, ConfigError> {
		let fetcher = AsyncHttpTokenFetcher::new(settings)?;

		Ok(Self::new(store, fetcher, settings.token_ttl()))
	}
}
impl<F> Debug for AsyncTokenCache<F>
where
	F: AsyncTokenFetcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AsyncTokenCache")
			.field("store", &self.store)
			.field("ttl", &self.ttl)
			.field("metrics", &self.metrics)
			.finish()
	}
}
