// self
use crate::{_prelude::*, error::FetchError, obs::AccessTier};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// A span builder wrapped around every refresh.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("credential_cache.refresh", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> RefreshSpanGuard {
		#[cfg(feature = "tracing")]
		{
			RefreshSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			RefreshSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`RefreshSpan::entered`].
pub struct RefreshSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for RefreshSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RefreshSpanGuard(..)")
	}
}

/// Emits a debug event for a lookup answered from the cache.
pub fn cached_token_served(tier: AccessTier) {
	#[cfg(feature = "tracing")]
	{
		let message = match tier {
			AccessTier::Optimistic => "Served cached token from optimistic read.",
			AccessTier::Shared => "Served cached token under shared access.",
			AccessTier::Exclusive => "Token was already refreshed by another caller.",
		};

		tracing::debug!(tier = tier.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = tier;
	}
}

/// Emits a debug event when shared access could not be promoted in place.
pub fn upgrade_contended() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("Shared access could not be upgraded; waiting for exclusive access.");
	}
}

/// Emits an info event before the fetcher is invoked.
pub fn refresh_started() {
	#[cfg(feature = "tracing")]
	{
		tracing::info!("Token expired or absent; fetching a new one.");
	}
}

/// Emits an info event once the new record is stored.
pub fn refresh_succeeded(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(%expires_at, "Token refreshed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}

/// Emits a warn event when the fetcher fails; the stored record is left untouched.
pub fn refresh_failed(error: &FetchError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%error, "Token refresh failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_span_without_subscriber_is_noop() {
		let _guard = RefreshSpan::new("test").entered();

		cached_token_served(AccessTier::Shared);
		refresh_failed(&FetchError::unavailable("down"));
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RefreshSpan::new("instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
