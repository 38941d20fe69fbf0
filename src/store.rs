//! Shared token store with an optimistic, shared, and exclusive access tier.
//!
//! [`TokenStore`] pairs a seqlock-style write-version counter with a `parking_lot` reader-writer
//! lock. Readers first take an [`OptimisticStamp`] and a snapshot without waiting on anyone, then
//! [`validate`](TokenStore::validate) the stamp to detect a write that landed in between. Callers
//! that need a stable view escalate to a [`SharedGuard`]; the single caller that must mutate the
//! record escalates once more to an [`ExclusiveGuard`], either by upgrading its shared guard in
//! place or by waiting for exclusive access.

pub mod guard;

pub use guard::*;

// std
use std::sync::atomic::{AtomicU64, Ordering, fence};
// self
use crate::{_prelude::*, token::TokenRecord};

/// Opaque write-version marker returned by [`TokenStore::snapshot_optimistic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OptimisticStamp(u64);
impl OptimisticStamp {
	/// Stamp handed out when the snapshot could not be taken without waiting.
	const CONTENDED: Self = Self(u64::MAX);

	/// An odd version means a write was in flight when the stamp was taken.
	fn is_stable(self) -> bool {
		self.0 & 1 == 0
	}
}

/// Holder of the single current [`TokenRecord`].
///
/// Share one instance (behind [`Arc`]) with every component that reads or refreshes the token.
pub struct TokenStore {
	version: AtomicU64,
	current: RwLock<TokenRecord>,
}
impl TokenStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self { version: AtomicU64::new(0), current: RwLock::new(TokenRecord::empty()) }
	}

	/// Reads the current record together with the write version observed before the read.
	///
	/// Never blocks. When a writer currently owns the record the returned stamp is already
	/// invalid and the record is empty.
	pub fn snapshot_optimistic(&self) -> (TokenRecord, OptimisticStamp) {
		let before = self.version.load(Ordering::Acquire);

		if before & 1 == 1 {
			return (TokenRecord::empty(), OptimisticStamp::CONTENDED);
		}

		match self.current.try_read() {
			Some(guard) => (guard.clone(), OptimisticStamp(before)),
			None => (TokenRecord::empty(), OptimisticStamp::CONTENDED),
		}
	}

	/// Returns `true` iff no write started or completed since `stamp` was taken.
	pub fn validate(&self, stamp: OptimisticStamp) -> bool {
		if !stamp.is_stable() {
			return false;
		}

		fence(Ordering::Acquire);

		self.version.load(Ordering::Acquire) == stamp.0
	}

	/// Acquires shared access, blocking only while an exclusive holder is active.
	///
	/// The first concurrent holder receives the upgradable slot; later holders coexist with it as
	/// plain readers. Dropping the guard releases shared access.
	pub fn acquire_shared(&self) -> SharedGuard<'_> {
		match self.current.try_upgradable_read() {
			Some(guard) => SharedGuard::upgradable(self, guard),
			None => SharedGuard::plain(self, self.current.read()),
		}
	}

	/// Waits for exclusive access. Dropping the guard releases it.
	pub fn acquire_exclusive(&self) -> ExclusiveGuard<'_> {
		ExclusiveGuard::new(self, self.current.write())
	}

	/// Replaces the current record and advances the write version.
	///
	/// # Panics
	///
	/// Panics if `guard` was issued by a different store.
	pub fn write(&self, guard: &mut ExclusiveGuard<'_>, record: TokenRecord) {
		assert!(guard.belongs_to(self), "Exclusive guard was issued by a different token store.");

		self.version.fetch_add(1, Ordering::AcqRel);
		guard.replace(record);
		self.version.fetch_add(1, Ordering::Release);
	}

	/// Restores the empty initial record. Meant for test harnesses and shutdown paths.
	pub fn clear(&self) {
		let mut guard = self.acquire_exclusive();

		self.write(&mut guard, TokenRecord::empty());
	}

	/// Returns a copy of the current record under shared access.
	pub fn current(&self) -> TokenRecord {
		self.current.read().clone()
	}

	/// Returns the current write version; it grows by two per completed write.
	pub fn version(&self) -> u64 {
		self.version.load(Ordering::Acquire)
	}
}
impl Default for TokenStore {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore")
			.field("version", &self.version())
			.field("current", &self.current.try_read().map(|guard| guard.clone()))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{sync::Barrier, thread};
	// self
	use super::*;
	use crate::token::TokenSecret;

	fn record(value: &str, expires_in: Duration) -> TokenRecord {
		TokenRecord::new(TokenSecret::new(value), OffsetDateTime::now_utc() + expires_in)
	}

	#[test]
	fn optimistic_snapshot_validates_without_writes() {
		let store = TokenStore::new();
		let (snapshot, stamp) = store.snapshot_optimistic();

		assert!(snapshot.is_empty());
		assert!(store.validate(stamp));
	}

	#[test]
	fn completed_write_invalidates_earlier_stamp() {
		let store = TokenStore::new();
		let (_, stamp) = store.snapshot_optimistic();
		let mut guard = store.acquire_exclusive();

		store.write(&mut guard, record("fresh", Duration::minutes(1)));
		drop(guard);

		assert!(!store.validate(stamp));

		let (snapshot, stamp) = store.snapshot_optimistic();

		assert!(store.validate(stamp));
		assert_eq!(snapshot.value.as_ref().map(TokenSecret::expose), Some("fresh"));
	}

	#[test]
	fn snapshot_is_contended_while_exclusive_is_held() {
		let store = TokenStore::new();
		let guard = store.acquire_exclusive();
		let (snapshot, stamp) = store.snapshot_optimistic();

		assert!(snapshot.is_empty());
		assert!(!store.validate(stamp));

		drop(guard);
	}

	#[test]
	fn sole_shared_holder_upgrades_in_place() {
		let store = TokenStore::new();
		let shared = store.acquire_shared();
		let mut exclusive =
			shared.try_upgrade().expect("A sole shared holder should upgrade without waiting.");

		store.write(&mut exclusive, record("upgraded", Duration::minutes(1)));
		drop(exclusive);

		assert_eq!(store.current().value.as_ref().map(TokenSecret::expose), Some("upgraded"));
		assert_eq!(store.version(), 2);
	}

	#[test]
	fn upgrade_fails_while_other_shared_holders_exist() {
		let store = TokenStore::new();
		let first = store.acquire_shared();
		let second = store.acquire_shared();

		assert!(first.is_upgradable());
		assert!(!second.is_upgradable());

		let first = first.try_upgrade().expect_err("Upgrade must fail while a reader remains.");
		let second = second.try_upgrade().expect_err("Plain readers can never upgrade.");

		drop(second);

		let exclusive = first.try_upgrade();

		assert!(exclusive.is_ok());
	}

	#[test]
	#[should_panic(expected = "different token store")]
	fn write_rejects_foreign_guard() {
		let store = TokenStore::new();
		let other = TokenStore::new();
		let mut guard = other.acquire_exclusive();

		store.write(&mut guard, TokenRecord::empty());
	}

	#[test]
	fn clear_is_idempotent_and_advances_version() {
		let store = TokenStore::new();
		let mut guard = store.acquire_exclusive();

		store.write(&mut guard, record("some-token", Duration::minutes(1)));
		drop(guard);
		store.clear();

		assert!(store.current().is_empty());
		assert_eq!(store.current().expires_at, TokenRecord::EARLIEST);

		store.clear();

		assert!(store.current().is_empty());
		assert_eq!(store.version(), 6);
	}

	#[test]
	fn validated_snapshots_are_never_torn() {
		const WRITES: i64 = 2_000;
		const READERS: usize = 4;

		let store = Arc::new(TokenStore::new());
		let base = OffsetDateTime::now_utc();
		let barrier = Arc::new(Barrier::new(READERS + 1));
		let readers = (0..READERS)
			.map(|_| {
				let store = store.clone();
				let barrier = barrier.clone();

				thread::spawn(move || {
					barrier.wait();

					for _ in 0..WRITES {
						let (snapshot, stamp) = store.snapshot_optimistic();

						if !store.validate(stamp) {
							continue;
						}

						if let Some(value) = snapshot.value.as_ref() {
							let offset = value
								.expose()
								.parse::<i64>()
								.expect("Writer only stores numeric tokens.");

							assert_eq!(snapshot.expires_at, base + Duration::seconds(offset));
						}
					}
				})
			})
			.collect::<Vec<_>>();

		barrier.wait();

		for offset in 0..WRITES {
			let mut guard = store.acquire_exclusive();

			store.write(
				&mut guard,
				TokenRecord::new(
					TokenSecret::new(offset.to_string()),
					base + Duration::seconds(offset),
				),
			);
		}

		for reader in readers {
			reader.join().expect("Reader thread should not panic.");
		}

		assert_eq!(store.version(), 2 * WRITES as u64);
	}
}
