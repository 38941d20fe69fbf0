//! Optional observability helpers for cache lookups and refreshes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to run each refresh inside a `credential_cache.refresh` span
//!   with a `stage` field and to emit debug/info/warn events as lookups move through the access
//!   tiers. Token values never reach the log output.
//! - Enable `metrics` to increment the `credential_cache_lookup_total` counter for every served
//!   lookup (labeled by `tier` + `outcome`), record each fetcher call in the
//!   `credential_cache_refresh_duration_seconds` histogram, and publish the store's write version
//!   through the `credential_cache_store_version` gauge.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Access tiers a lookup moves through before it is answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessTier {
	/// Lock-free snapshot validated against the write version.
	Optimistic,
	/// Re-check under shared access.
	Shared,
	/// Re-check or refresh under exclusive access (or the async single-flight guard).
	Exclusive,
}
impl AccessTier {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessTier::Optimistic => "optimistic",
			AccessTier::Shared => "shared",
			AccessTier::Exclusive => "exclusive",
		}
	}
}
impl Display for AccessTier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupOutcome {
	/// A cached token was still valid.
	Hit,
	/// The caller fetched and stored a new token.
	Refreshed,
	/// The fetch failed and the error was returned to the caller.
	Failed,
}
impl LookupOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LookupOutcome::Hit => "hit",
			LookupOutcome::Refreshed => "refreshed",
			LookupOutcome::Failed => "failed",
		}
	}
}
impl Display for LookupOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
