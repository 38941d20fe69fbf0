//! RAII access guards handed out by [`TokenStore`].

// std
use std::{ops::Deref, ptr};
// self
use crate::{_prelude::*, store::TokenStore, token::TokenRecord};

enum SharedAccess<'a> {
	Upgradable(RwLockUpgradableReadGuard<'a, TokenRecord>),
	Plain(RwLockReadGuard<'a, TokenRecord>),
}

/// Shared (read) access to the current record; any number may coexist.
///
/// At most one shared guard at a time occupies the upgradable slot and can be promoted with
/// [`try_upgrade`](SharedGuard::try_upgrade). Dropping the guard releases shared access.
pub struct SharedGuard<'a> {
	store: &'a TokenStore,
	access: SharedAccess<'a>,
}
impl<'a> SharedGuard<'a> {
	pub(crate) fn upgradable(
		store: &'a TokenStore,
		guard: RwLockUpgradableReadGuard<'a, TokenRecord>,
	) -> Self {
		Self { store, access: SharedAccess::Upgradable(guard) }
	}

	pub(crate) fn plain(store: &'a TokenStore, guard: RwLockReadGuard<'a, TokenRecord>) -> Self {
		Self { store, access: SharedAccess::Plain(guard) }
	}

	/// Returns `true` when this guard holds the upgradable slot.
	pub fn is_upgradable(&self) -> bool {
		matches!(self.access, SharedAccess::Upgradable(_))
	}

	/// Converts shared access into exclusive access without releasing it in between.
	///
	/// Never blocks. Hands the shared guard back when other shared holders are present or when
	/// this guard does not occupy the upgradable slot.
	pub fn try_upgrade(self) -> Result<ExclusiveGuard<'a>, Self> {
		let Self { store, access } = self;

		match access {
			SharedAccess::Upgradable(guard) => match RwLockUpgradableReadGuard::try_upgrade(guard) {
				Ok(guard) => Ok(ExclusiveGuard::new(store, guard)),
				Err(guard) => Err(Self::upgradable(store, guard)),
			},
			SharedAccess::Plain(guard) => Err(Self::plain(store, guard)),
		}
	}
}
impl Deref for SharedGuard<'_> {
	type Target = TokenRecord;

	fn deref(&self) -> &Self::Target {
		match &self.access {
			SharedAccess::Upgradable(guard) => &**guard,
			SharedAccess::Plain(guard) => &**guard,
		}
	}
}
impl Debug for SharedGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SharedGuard")
			.field("upgradable", &self.is_upgradable())
			.field("record", &**self)
			.finish()
	}
}

/// Exclusive (write) access to the current record.
///
/// Only [`TokenStore::write`] mutates the record through this guard. Dropping the guard releases
/// exclusive access.
pub struct ExclusiveGuard<'a> {
	store: &'a TokenStore,
	guard: RwLockWriteGuard<'a, TokenRecord>,
}
impl<'a> ExclusiveGuard<'a> {
	pub(crate) fn new(store: &'a TokenStore, guard: RwLockWriteGuard<'a, TokenRecord>) -> Self {
		Self { store, guard }
	}

	pub(crate) fn belongs_to(&self, store: &TokenStore) -> bool {
		ptr::eq(self.store, store)
	}

	pub(crate) fn replace(&mut self, record: TokenRecord) {
		*self.guard = record;
	}
}
impl Deref for ExclusiveGuard<'_> {
	type Target = TokenRecord;

	fn deref(&self) -> &Self::Target {
		&self.guard
	}
}
impl Debug for ExclusiveGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExclusiveGuard").field("record", &**self).finish()
	}
}
