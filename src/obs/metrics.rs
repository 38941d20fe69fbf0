// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{AccessTier, LookupOutcome};

/// Increments `credential_cache_lookup_total` for one answered lookup (when enabled).
pub fn record_lookup(tier: AccessTier, outcome: LookupOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"credential_cache_lookup_total",
			"tier" => tier.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (tier, outcome);
	}
}

/// Records how long one fetcher call took, labeled by whether it produced a token.
pub fn record_refresh_duration(outcome: LookupOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			"credential_cache_refresh_duration_seconds",
			"outcome" => outcome.as_str()
		)
		.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, elapsed);
	}
}

/// Publishes the store's write version after a commit.
pub fn record_store_version(version: u64) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("credential_cache_store_version").set(version as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = version;
	}
}
