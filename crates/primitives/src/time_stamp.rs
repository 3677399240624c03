use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when constructing an out-of-range [`TimeStamp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeStampError {
	#[error("ticks per second {0} outside 1..=1000")]
	TicksPerSecond(u32),
	#[error("negative tick count {0}")]
	NegativeTicks(i64),
}

/// A point in time measured in ticks at a fixed rate.
///
/// Two stamps are `==` only if both rate and tick count match. Use [`TimeStamp::cmp_time`]
/// to order stamps recorded at different rates. Deserialization validates like
/// [`TimeStamp::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeStamp")]
pub struct TimeStamp {
	tps: u32,
	ticks: i64,
}

/// Wire shape of [`TimeStamp`] before validation.
#[derive(Deserialize)]
struct RawTimeStamp {
	tps: u32,
	ticks: i64,
}

impl TryFrom<RawTimeStamp> for TimeStamp {
	type Error = TimeStampError;

	fn try_from(raw: RawTimeStamp) -> Result<Self, Self::Error> {
		Self::new(raw.tps, raw.ticks)
	}
}

impl TimeStamp {
	pub const MIN_TPS: u32 = 1;
	pub const MAX_TPS: u32 = 1000;
	pub const MIN_TICKS: i64 = 0;
	pub const MAX_TICKS: i64 = i64::MAX;

	/// Creates a stamp, validating the rate and tick count.
	pub fn new(tps: u32, ticks: i64) -> Result<Self, TimeStampError> {
		if !Self::is_valid_tps(tps) {
			return Err(TimeStampError::TicksPerSecond(tps));
		}
		if ticks < Self::MIN_TICKS {
			return Err(TimeStampError::NegativeTicks(ticks));
		}
		Ok(Self { tps, ticks })
	}

	/// The zero stamp at the given rate.
	pub fn zero(tps: u32) -> Result<Self, TimeStampError> {
		Self::new(tps, 0)
	}

	/// Largest representable stamp at the given rate.
	pub fn max_at(tps: u32) -> Result<Self, TimeStampError> {
		Self::new(tps, Self::MAX_TICKS)
	}

	/// Converts whole seconds into a stamp, saturating at [`TimeStamp::MAX_TICKS`].
	pub fn from_seconds(tps: u32, seconds: i64) -> Result<Self, TimeStampError> {
		Self::new(tps, seconds.saturating_mul(i64::from(tps)))
	}

	#[inline]
	pub fn is_valid_tps(tps: u32) -> bool {
		(Self::MIN_TPS..=Self::MAX_TPS).contains(&tps)
	}

	#[inline]
	pub fn tps(&self) -> u32 {
		self.tps
	}

	#[inline]
	pub fn ticks(&self) -> i64 {
		self.ticks
	}

	/// Whole seconds, truncated.
	#[inline]
	pub fn seconds(&self) -> i64 {
		self.ticks / i64::from(self.tps)
	}

	/// Orders two stamps by wall time, independent of their rates.
	pub fn cmp_time(&self, other: &Self) -> Ordering {
		let lhs = i128::from(self.ticks) * i128::from(other.tps);
		let rhs = i128::from(other.ticks) * i128::from(self.tps);
		lhs.cmp(&rhs)
	}

	/// Clamps into `[min, max]` by wall time. Returns `self` unchanged when inside.
	pub fn clamp_time(self, min: &Self, max: &Self) -> Self {
		if self.cmp_time(min) == Ordering::Less {
			*min
		} else if self.cmp_time(max) == Ordering::Greater {
			*max
		} else {
			self
		}
	}

	/// Debug rendering used by database dumps, e.g. `(60,3600)`.
	pub fn to_db_string(&self) -> String {
		format!("({},{})", self.tps, self.ticks)
	}
}

impl fmt::Display for TimeStamp {
	/// Formats as `HH:MM:SS:mmm`.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tps = i64::from(self.tps);
		let secs = self.ticks / tps;
		let millis = (self.ticks % tps) * 1000 / tps;
		write!(
			f,
			"{:02}:{:02}:{:02}:{:03}",
			secs / 3600,
			(secs / 60) % 60,
			secs % 60,
			millis
		)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn test_rejects_bad_rate_and_ticks() {
		assert_eq!(TimeStamp::new(0, 0), Err(TimeStampError::TicksPerSecond(0)));
		assert_eq!(
			TimeStamp::new(1001, 0),
			Err(TimeStampError::TicksPerSecond(1001))
		);
		assert_eq!(TimeStamp::new(60, -1), Err(TimeStampError::NegativeTicks(-1)));
		assert!(TimeStamp::new(1000, i64::MAX).is_ok());
	}

	#[test]
	fn test_cross_rate_ordering() {
		let a = TimeStamp::new(60, 60).unwrap();
		let b = TimeStamp::new(1000, 1000).unwrap();
		assert_eq!(a.cmp_time(&b), Ordering::Equal);
		assert_ne!(a, b);
	}

	#[test]
	fn test_display_and_db_string() {
		let ts = TimeStamp::new(60, 60 * 3723 + 30).unwrap();
		assert_eq!(ts.to_string(), "01:02:03:500");
		assert_eq!(ts.to_db_string(), "(60,223410)");
	}

	/// Decoding goes through the same checks as construction.
	#[test]
	fn test_deserialize_validates() {
		let ts = TimeStamp::new(60, 90).unwrap();
		let bytes = postcard::to_allocvec(&ts).unwrap();
		assert_eq!(postcard::from_bytes::<TimeStamp>(&bytes).unwrap(), ts);

		let zero_rate = postcard::to_allocvec(&(0u32, 5i64)).unwrap();
		assert!(postcard::from_bytes::<TimeStamp>(&zero_rate).is_err());
		let negative = postcard::to_allocvec(&(60u32, -5i64)).unwrap();
		assert!(postcard::from_bytes::<TimeStamp>(&negative).is_err());
	}

	proptest! {
		#[test]
		fn prop_clamp_time_idempotent(ticks in 0i64..1_000_000, lo in 0i64..1000, span in 1i64..1000) {
			let min = TimeStamp::new(60, lo).unwrap();
			let max = TimeStamp::new(60, lo + span).unwrap();
			let once = TimeStamp::new(60, ticks).unwrap().clamp_time(&min, &max);
			prop_assert_eq!(once.clamp_time(&min, &max), once);
		}
	}
}
