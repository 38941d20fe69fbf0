//! Concurrent, self-refreshing bearer credential cache with a lock-free fast path, tiered
//! shared/exclusive escalation, and single-flight refreshes against a token-issuing endpoint.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod error;
pub mod ext;
pub mod fetcher;
pub mod obs;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		thread,
	};
	// self
	use crate::{
		cache::TokenCache, error::FetchError, fetcher::TokenFetcher, store::TokenStore,
		token::TokenSecret,
	};

	/// Scripted fetcher that counts invocations and optionally sleeps to widen race windows.
	#[derive(Debug)]
	pub struct CountingFetcher {
		calls: AtomicUsize,
		delay: std::time::Duration,
		outcome: std::result::Result<String, String>,
	}
	impl CountingFetcher {
		/// Builds a fetcher that always returns `token`.
		pub fn returning(token: impl Into<String>) -> Self {
			Self {
				calls: AtomicUsize::new(0),
				delay: std::time::Duration::ZERO,
				outcome: Ok(token.into()),
			}
		}

		/// Builds a fetcher that always fails with [`FetchError::Unavailable`].
		pub fn failing(message: impl Into<String>) -> Self {
			Self {
				calls: AtomicUsize::new(0),
				delay: std::time::Duration::ZERO,
				outcome: Err(message.into()),
			}
		}

		/// Sleeps for `delay` inside every fetch before answering.
		pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
			self.delay = delay;

			self
		}

		/// Returns how many times the fetcher has been invoked.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenFetcher for CountingFetcher {
		fn fetch_token(&self) -> std::result::Result<TokenSecret, FetchError> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if !self.delay.is_zero() {
				thread::sleep(self.delay);
			}

			match &self.outcome {
				Ok(token) => Ok(TokenSecret::new(token.clone())),
				Err(message) => Err(FetchError::unavailable(message.clone())),
			}
		}
	}

	/// Builds a cache over a fresh store with the provided fetcher and a 10 second TTL.
	pub fn build_test_cache<F>(fetcher: F) -> (TokenCache<F>, Arc<TokenStore>)
	where
		F: TokenFetcher,
	{
		let store = Arc::new(TokenStore::new());
		let cache = TokenCache::new(store.clone(), fetcher, Duration::seconds(10));

		(cache, store)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
