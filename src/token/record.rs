//! Immutable token snapshot held by the store and its lifecycle helpers.

// crates.io
use time::Date;
// self
use crate::{_prelude::*, token::secret::TokenSecret};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// No token has been stored yet (or the store was cleared).
	Empty,
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Immutable snapshot of the cached credential.
///
/// `value` and `expires_at` always travel together; the store only ever replaces a whole record.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
	/// Token secret, or `None` before the first successful fetch.
	pub value: Option<TokenSecret>,
	/// Instant from which the record is considered stale.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Earliest instant representable by the clock, used as the expiry of an empty record.
	pub const EARLIEST: OffsetDateTime = Date::MIN.midnight().assume_utc();

	/// Returns the empty record a store starts with.
	pub const fn empty() -> Self {
		Self { value: None, expires_at: Self::EARLIEST }
	}

	/// Creates a record holding `value` until `expires_at`.
	pub fn new(value: TokenSecret, expires_at: OffsetDateTime) -> Self {
		Self { value: Some(value), expires_at }
	}

	/// Creates a record for a token fetched at `fetched_at` and valid for `ttl`.
	pub fn issued(value: TokenSecret, fetched_at: OffsetDateTime, ttl: Duration) -> Self {
		Self::new(value, fetched_at.saturating_add(ttl))
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.value.is_none() {
			return TokenStatus::Empty;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns the token if it is present and unexpired at `instant`.
	pub fn valid_value_at(&self, instant: OffsetDateTime) -> Option<&TokenSecret> {
		match self.status_at(instant) {
			TokenStatus::Active => self.value.as_ref(),
			_ => None,
		}
	}

	/// Returns `true` when the record holds no token.
	pub fn is_empty(&self) -> bool {
		self.value.is_none()
	}

	/// Returns `true` if the record is present and unexpired at the provided instant.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}
}
impl Default for TokenRecord {
	fn default() -> Self {
		Self::empty()
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("value", &self.value.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
