use annota_primitives::{TimeStamp, grammar};

use super::{FargKind, FormalArgument};
use crate::error::DbResult;
use crate::value::{DataValue, ValueKind};

impl FormalArgument {
	/// Re-hosts `old` in this slot, converting where a lossless or obvious conversion exists.
	///
	/// Falls back to [`Self::construct_empty_arg`] when there is nothing to salvage. `tps` is
	/// the database's tick rate, used when an integer becomes a time stamp. The result is
	/// coerced into this slot's subrange.
	pub fn construct_arg_with_salvage(&self, old: Option<&DataValue>, tps: u32) -> DataValue {
		let mut value = self.construct_empty_arg();
		let Some(old) = old.filter(|old| old.farg_id().is_valid() && !old.is_empty()) else {
			return value;
		};
		match salvage_into(self, &mut value, old.kind(), tps) {
			Ok(true) => value,
			Ok(false) => self.construct_empty_arg(),
			Err(err) => {
				tracing::debug!(farg = %self.id(), %err, "salvage failed, using empty value");
				self.construct_empty_arg()
			}
		}
	}
}

/// Writes the converted contents of `old` into `value`. Returns `false` when nothing converts.
fn salvage_into(farg: &FormalArgument, value: &mut DataValue, old: &ValueKind, tps: u32) -> DbResult<bool> {
	match (farg.kind(), old) {
		(FargKind::Integer(_), ValueKind::Integer { value: v, .. }) => value.set_int(*v)?,
		(FargKind::Integer(_), ValueKind::Float { value: v, .. }) if v.is_finite() => {
			value.set_int(v.trunc() as i64)?
		}
		(FargKind::Float(_), ValueKind::Float { value: v, .. }) => value.set_float(*v)?,
		(FargKind::Float(_), ValueKind::Integer { value: v, .. }) => value.set_float(*v as f64)?,
		(FargKind::TimeStamp(_), ValueKind::Integer { value: v, .. }) => {
			let Ok(ts) = TimeStamp::new(tps, *v) else {
				return Ok(false);
			};
			value.set_time_stamp(ts)?
		}
		(FargKind::TimeStamp(_), ValueKind::TimeStamp { value: ts, .. }) if ts.tps() == tps => {
			value.set_time_stamp(*ts)?
		}
		(FargKind::Nominal(_), ValueKind::Nominal { value: s })
		| (FargKind::Nominal(_), ValueKind::QuoteString { value: s })
		| (FargKind::Nominal(_), ValueKind::Text { value: s })
			if grammar::is_nominal(s) =>
		{
			value.set_nominal(s.clone())?;
			if !farg.is_valid_value(value.kind()) {
				return Ok(false);
			}
		}
		(FargKind::QuoteString, ValueKind::QuoteString { value: s })
		| (FargKind::QuoteString, ValueKind::Nominal { value: s })
		| (FargKind::QuoteString, ValueKind::Text { value: s })
			if grammar::is_quote_string(s) =>
		{
			value.set_quote_string(s.clone())?
		}
		(FargKind::Text, ValueKind::Text { value: s })
		| (FargKind::Text, ValueKind::QuoteString { value: s })
		| (FargKind::Text, ValueKind::Nominal { value: s }) => value.set_text(s.clone())?,
		(FargKind::Predicate(_), ValueKind::Predicate(pred)) => {
			value.set_predicate(pred.clone())?;
			value.enforce_subrange(farg)?;
		}
		(FargKind::ColPredicate, ValueKind::ColPredicate(pred)) => {
			value.set_col_predicate(pred.clone())?
		}
		(FargKind::Untyped, ValueKind::Integer { value: v, .. }) => value.set_int(*v)?,
		(FargKind::Untyped, ValueKind::Float { value: v, .. }) => value.set_float(*v)?,
		(FargKind::Untyped, ValueKind::TimeStamp { value: ts, .. }) => value.set_time_stamp(*ts)?,
		(FargKind::Untyped, ValueKind::Nominal { value: s }) => value.set_nominal(s.clone())?,
		(FargKind::Untyped, ValueKind::QuoteString { value: s })
		| (FargKind::Untyped, ValueKind::Text { value: s })
			if grammar::is_quote_string(s) =>
		{
			value.set_quote_string(s.clone())?
		}
		(FargKind::Untyped, ValueKind::Predicate(pred)) => value.set_predicate(pred.clone())?,
		(FargKind::Untyped, ValueKind::ColPredicate(pred)) => {
			value.set_col_predicate(pred.clone())?
		}
		_ => return Ok(false),
	}
	Ok(true)
}
