// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::AccessTier;

/// Thread-safe counters for lookups and refreshes.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	optimistic_hits: AtomicU64,
	shared_hits: AtomicU64,
	exclusive_hits: AtomicU64,
	fetch_attempts: AtomicU64,
	fetch_successes: AtomicU64,
	fetch_failures: AtomicU64,
}
impl CacheMetrics {
	/// Returns the number of lookups answered at the given tier without fetching.
	pub fn hits(&self, tier: AccessTier) -> u64 {
		self.hit_counter(tier).load(Ordering::Relaxed)
	}

	/// Returns the number of fetcher invocations.
	pub fn fetch_attempts(&self) -> u64 {
		self.fetch_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches that produced a stored token.
	pub fn fetch_successes(&self) -> u64 {
		self.fetch_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches that failed.
	pub fn fetch_failures(&self) -> u64 {
		self.fetch_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self, tier: AccessTier) {
		self.hit_counter(tier).fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch_attempt(&self) {
		self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch_success(&self) {
		self.fetch_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch_failure(&self) {
		self.fetch_failures.fetch_add(1, Ordering::Relaxed);
	}

	fn hit_counter(&self, tier: AccessTier) -> &AtomicU64 {
		match tier {
			AccessTier::Optimistic => &self.optimistic_hits,
			AccessTier::Shared => &self.shared_hits,
			AccessTier::Exclusive => &self.exclusive_hits,
		}
	}
}
