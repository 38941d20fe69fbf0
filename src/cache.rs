//! Self-refreshing token cache with tiered access and single-flight refreshes.
//!
//! [`TokenCache::get_token`] answers from the cheapest tier that can prove the cached token is
//! still valid:
//!
//! 1. an optimistic snapshot validated against the store's write version;
//! 2. a re-check under shared access, since another caller may have refreshed in the meantime;
//! 3. escalation to exclusive access, upgrading in place when this caller is the only shared holder
//!    and otherwise waiting for exclusive access and re-checking once more;
//! 4. a single fetcher call under exclusive access, after which the new record is written with
//!    `expires_at = fetch completion + ttl`.
//!
//! Callers that queue behind a refresh observe the fresh record in step 2 or 3 and never call the
//! fetcher themselves. A failed fetch leaves the previous record in place and returns the error
//! to the caller that triggered it; the next caller to observe staleness tries again.

mod metrics;
mod single_flight;

pub use metrics::CacheMetrics;
pub use single_flight::AsyncTokenCache;

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	error::FetchError,
	fetcher::TokenFetcher,
	obs::{self, AccessTier, LookupOutcome, RefreshSpan},
	store::{ExclusiveGuard, TokenStore},
	token::{TokenRecord, TokenSecret},
};
#[cfg(feature = "reqwest")]
use crate::{config::AuthTokenSettings, error::ConfigError, fetcher::HttpTokenFetcher};

#[cfg(feature = "reqwest")]
/// Cache specialized for the crate's blocking reqwest fetcher.
pub type HttpTokenCache = TokenCache<HttpTokenFetcher>;

/// Blocking token cache shared by every caller that needs the current credential.
///
/// Clone the [`Arc<TokenStore>`] (not the cache) into other caches that must observe the same
/// record; all of them then refresh through whichever fetcher wins exclusive access first.
pub struct TokenCache<F>
where
	F: TokenFetcher,
{
	store: Arc<TokenStore>,
	fetcher: F,
	ttl: Duration,
	metrics: Arc<CacheMetrics>,
}
impl<F> TokenCache<F>
where
	F: TokenFetcher,
{
	/// Creates a cache over `store` that grants each fetched token `ttl` of validity.
	pub fn new(store: Arc<TokenStore>, fetcher: F, ttl: Duration) -> Self {
		Self { store, fetcher, ttl, metrics: Default::default() }
	}

	/// Returns the current token, refreshing it first when it is absent or expired.
	pub fn get_token(&self) -> Result<TokenSecret, FetchError> {
		if let Some(token) = read_optimistic(&self.store) {
			return Ok(self.served(AccessTier::Optimistic, token));
		}

		let shared = self.store.acquire_shared();

		if let Some(token) = shared.valid_value_at(OffsetDateTime::now_utc()).cloned() {
			drop(shared);

			return Ok(self.served(AccessTier::Shared, token));
		}

		let mut exclusive = match shared.try_upgrade() {
			Ok(exclusive) => exclusive,
			Err(shared) => {
				drop(shared);
				obs::upgrade_contended();

				let exclusive = self.store.acquire_exclusive();

				if let Some(token) = exclusive.valid_value_at(OffsetDateTime::now_utc()).cloned() {
					drop(exclusive);

					return Ok(self.served(AccessTier::Exclusive, token));
				}

				exclusive
			},
		};

		self.refresh(&mut exclusive)
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

	fn refresh(&self, guard: &mut ExclusiveGuard<'_>) -> Result<TokenSecret, FetchError> {
		let _span = RefreshSpan::new("get_token").entered();

		obs::refresh_started();
		self.metrics.record_fetch_attempt();

		let started = Instant::now();

		match self.fetcher.fetch_token() {
			Ok(token) => {
				let record =
					TokenRecord::issued(token.clone(), OffsetDateTime::now_utc(), self.ttl);

				commit(&self.store, guard, record, &self.metrics, started);

				Ok(token)
			},
			Err(err) => {
				fail(&err, &self.metrics, started);

				Err(err)
			},
		}
	}

	fn served(&self, tier: AccessTier, token: TokenSecret) -> TokenSecret {
		record_hit(tier, &self.metrics);

		token
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<HttpTokenFetcher> {
	/// Builds a cache over `store` backed by a blocking reqwest fetcher for `settings`.
	pub fn from_settings(
		store: Arc<TokenStore>,
		settings: &AuthTokenSettings,
	) -> Result<Self, ConfigError> {
		let fetcher = HttpTokenFetcher::new(settings)?;

		Ok(Self::new(store, fetcher, settings.token_ttl()))
	}
}
impl<F> Debug for TokenCache<F>
where
	F: TokenFetcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("store", &self.store)
			.field("ttl", &self.ttl)
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Returns the cached token when an optimistic snapshot validates and is unexpired.
pub(crate) fn read_optimistic(store: &TokenStore) -> Option<TokenSecret> {
	let (snapshot, stamp) = store.snapshot_optimistic();

	if !store.validate(stamp) {
		return None;
	}

	snapshot.valid_value_at(OffsetDateTime::now_utc()).cloned()
}

/// Returns the cached token when it is valid under a briefly held shared guard.
pub(crate) fn read_shared(store: &TokenStore) -> Option<TokenSecret> {
	store.acquire_shared().valid_value_at(OffsetDateTime::now_utc()).cloned()
}

pub(crate) fn record_hit(tier: AccessTier, metrics: &CacheMetrics) {
	metrics.record_hit(tier);
	obs::cached_token_served(tier);
	obs::record_lookup(tier, LookupOutcome::Hit);
}

pub(crate) fn commit(
	store: &TokenStore,
	guard: &mut ExclusiveGuard<'_>,
	record: TokenRecord,
	metrics: &CacheMetrics,
	started: Instant,
) {
	let expires_at = record.expires_at;

	store.write(guard, record);
	metrics.record_fetch_success();
	obs::refresh_succeeded(expires_at);
	obs::record_refresh_duration(LookupOutcome::Refreshed, started.elapsed());
	obs::record_store_version(store.version());
	obs::record_lookup(AccessTier::Exclusive, LookupOutcome::Refreshed);
}

pub(crate) fn fail(err: &FetchError, metrics: &CacheMetrics, started: Instant) {
	metrics.record_fetch_failure();
	obs::refresh_failed(err);
	obs::record_refresh_duration(LookupOutcome::Failed, started.elapsed());
	obs::record_lookup(AccessTier::Exclusive, LookupOutcome::Failed);
}

#[cfg(test)]
mod tests {
	// std
	use std::{sync::Barrier, thread};
	// self
	use super::*;
	use crate::_preludet::*;

	fn seed(store: &TokenStore, value: &str, expires_at: OffsetDateTime) {
		let mut guard = store.acquire_exclusive();

		store.write(&mut guard, TokenRecord::new(TokenSecret::new(value), expires_at));
	}

	#[test]
	fn returns_cached_token_without_fetching() {
		let (cache, store) = build_test_cache(CountingFetcher::returning("should-not-be-called"));

		seed(&store, "cached-token-123", OffsetDateTime::now_utc() + Duration::seconds(60));

		let token = cache.get_token().expect("Cached token should be served.");

		assert_eq!(token.expose(), "cached-token-123");
		assert_eq!(cache.fetcher().calls(), 0);
		assert_eq!(cache.metrics().hits(AccessTier::Optimistic), 1);
	}

	#[test]
	fn expired_token_triggers_single_fetch() {
		let (cache, store) = build_test_cache(CountingFetcher::returning("fresh-token-456"));

		seed(&store, "expired-token", OffsetDateTime::now_utc() - Duration::seconds(5));

		let token = cache.get_token().expect("Expired token should be refreshed.");

		assert_eq!(token.expose(), "fresh-token-456");
		assert_eq!(cache.fetcher().calls(), 1);
		assert_eq!(
			store.current().value.as_ref().map(TokenSecret::expose),
			Some("fresh-token-456")
		);

		let again = cache.get_token().expect("Fresh token should now be cached.");

		assert_eq!(again.expose(), "fresh-token-456");
		assert_eq!(cache.fetcher().calls(), 1);
	}

	#[test]
	fn caller_waiting_for_exclusive_access_rechecks_before_fetching() {
		let (cache, store) = build_test_cache(CountingFetcher::returning("should-not-be-called"));

		seed(&store, "expired-token", OffsetDateTime::now_utc() - Duration::seconds(5));

		let upgradable = store.acquire_shared();

		assert!(upgradable.is_upgradable());

		let cache = Arc::new(cache);
		let waiter = {
			let cache = cache.clone();

			thread::spawn(move || cache.get_token())
		};

		// Let the waiter fail its upgrade and park on exclusive access.
		thread::sleep(std::time::Duration::from_millis(100));

		let mut exclusive = upgradable
			.try_upgrade()
			.expect("Upgradable holder should upgrade once the waiter released its read.");

		store.write(
			&mut exclusive,
			TokenRecord::issued(
				TokenSecret::new("refreshed-elsewhere"),
				OffsetDateTime::now_utc(),
				Duration::seconds(10),
			),
		);
		drop(exclusive);

		let token = waiter
			.join()
			.expect("Waiter thread should not panic.")
			.expect("Waiter should observe the refreshed token.");

		assert_eq!(token.expose(), "refreshed-elsewhere");
		assert_eq!(cache.fetcher().calls(), 0);
		assert_eq!(cache.metrics().hits(AccessTier::Exclusive), 1);
		assert_eq!(cache.metrics().hits(AccessTier::Shared), 0);
	}

	#[test]
	fn empty_store_triggers_fetch() {
		let (cache, _store) = build_test_cache(CountingFetcher::returning("first-token-789"));
		let token = cache.get_token().expect("Empty store should be filled.");

		assert_eq!(token.expose(), "first-token-789");
		assert_eq!(cache.metrics().fetch_attempts(), 1);
		assert_eq!(cache.metrics().fetch_successes(), 1);
	}

	#[test]
	fn fetched_token_expires_after_ttl() {
		let (cache, store) = build_test_cache(CountingFetcher::returning("new-token"));

		cache.get_token().expect("Fetch should succeed.");

		let now = OffsetDateTime::now_utc();
		let expires_at = store.current().expires_at;

		assert!(expires_at > now + Duration::seconds(8), "Expiry {expires_at} is too early.");
		assert!(expires_at < now + Duration::seconds(12), "Expiry {expires_at} is too late.");
	}

	#[test]
	fn failed_fetch_from_empty_store_keeps_it_empty() {
		let (cache, store) = build_test_cache(CountingFetcher::failing("down"));
		let err = cache.get_token().expect_err("Fetch failures must propagate.");

		assert!(matches!(err, FetchError::Unavailable { ref message } if message == "down"));
		assert!(store.current().is_empty());
		assert_eq!(store.version(), 0);
		assert_eq!(cache.metrics().fetch_failures(), 1);
	}

	#[test]
	fn failed_fetch_keeps_stale_record() {
		let (cache, store) = build_test_cache(CountingFetcher::failing("down"));
		let expired_at = OffsetDateTime::now_utc() - Duration::seconds(5);

		seed(&store, "stale-token", expired_at);

		let before = store.current();

		cache.get_token().expect_err("Fetch failures must propagate.");

		assert_eq!(store.current(), before);
		assert!(!store.current().is_valid_at(OffsetDateTime::now_utc()));

		cache.get_token().expect_err("Stale record must trigger another attempt.");

		assert_eq!(cache.fetcher().calls(), 2);
	}

	#[test]
	fn clear_resets_to_empty_store_behavior() {
		let (cache, store) = build_test_cache(CountingFetcher::returning("after-clear"));

		seed(&store, "some-token", OffsetDateTime::now_utc() + Duration::seconds(60));
		cache.clear();

		assert!(store.current().is_empty());
		let token = cache.get_token().expect("Cleared store should refetch.");

		assert_eq!(token.expose(), "after-clear");
		assert_eq!(cache.fetcher().calls(), 1);
	}

	#[test]
	fn concurrent_callers_share_one_fetch() {
		const CALLERS: usize = 10;

		let (cache, _store) = build_test_cache(
			CountingFetcher::returning("concurrent-token")
				.with_delay(std::time::Duration::from_millis(100)),
		);
		let cache = Arc::new(cache);
		let barrier = Arc::new(Barrier::new(CALLERS));
		let handles = (0..CALLERS)
			.map(|_| {
				let cache = cache.clone();
				let barrier = barrier.clone();

				thread::spawn(move || {
					barrier.wait();

					cache.get_token()
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			let token = handle
				.join()
				.expect("Caller thread should not panic.")
				.expect("Every caller should receive a token.");

			assert_eq!(token.expose(), "concurrent-token");
		}

		assert_eq!(cache.fetcher().calls(), 1);
		assert_eq!(cache.metrics().fetch_attempts(), 1);
	}

	#[test]
	fn caches_over_one_store_share_refreshes() {
		let store = Arc::new(TokenStore::new());
		let ttl = Duration::minutes(1);
		let first = TokenCache::new(store.clone(), CountingFetcher::returning("shared"), ttl);
		let second = TokenCache::new(store.clone(), CountingFetcher::returning("unused"), ttl);

		assert_eq!(first.get_token().expect("First cache should fetch.").expose(), "shared");
		assert_eq!(second.get_token().expect("Second cache should reuse.").expose(), "shared");
		assert_eq!(second.fetcher().calls(), 0);
	}
}
