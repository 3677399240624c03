use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle for any element stored in the database index.
///
/// Handles are allocated monotonically and never reused, so a stale handle fails lookup
/// instead of aliasing a newer element. [`DbId::INVALID`] marks "not yet indexed" or
/// "no reference".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbId(u64);

impl DbId {
	/// The unset handle.
	pub const INVALID: DbId = DbId(0);

	/// Wraps a raw handle value.
	#[inline]
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw handle value.
	#[inline]
	pub const fn raw(self) -> u64 {
		self.0
	}

	/// Returns `true` unless this is [`DbId::INVALID`].
	#[inline]
	pub const fn is_valid(self) -> bool {
		self.0 != Self::INVALID.0
	}
}

impl fmt::Display for DbId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
