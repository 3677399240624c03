//! Data values: concrete contents of one formal-argument occurrence.
//!
//! # Role
//!
//! A [`DataValue`] is a common header (ids, cached argument type, subrange flag, empty flag)
//! plus a [`ValueKind`] payload. Predicate and column-predicate payloads nest a
//! [`Predicate`] whose own argument list holds further data values.
//!
//! # Invariants
//!
//! - The cached `farg_type` equals the bound formal argument's type.
//!   - Enforced in: [`DataValue::update_subrange`], [`DataValue::update_for_farg_change`].
//!   - Tested by: `value::tests::test_farg_change_rejects_retype`
//!   - Failure symptom: a value is coerced with another type's rules.
//!
//! - While the subrange is active a numeric value lies within the cached bounds.
//!   - Enforced in: [`DataValue::set_int`], [`DataValue::set_float`],
//!     [`DataValue::set_time_stamp`], [`DataValue::update_subrange`].
//!   - Tested by: `value::tests::test_int_value_clamps`, `value::tests::prop_int_clamp_idempotent`
//!   - Failure symptom: stored values escape their declared range after a schema edit.

use annota_primitives::{DbId, TimeStamp, grammar};
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult, LogicError, NameKind, SystemError};
use crate::farg::{FargKind, FargType, FormalArgument};

mod predicate;
pub(crate) mod tree;

pub use predicate::Predicate;

/// Typed payload of a data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
	/// Unset contents of an untyped slot; carries the slot's name.
	Undefined { name: String },
	Integer { value: i64, min: i64, max: i64 },
	Float { value: f64, min: f64, max: f64 },
	Nominal { value: String },
	QuoteString { value: String },
	Text { value: String },
	TimeStamp {
		value: TimeStamp,
		min: TimeStamp,
		max: TimeStamp,
	},
	Predicate(Predicate),
	ColPredicate(Predicate),
}

impl ValueKind {
	/// Argument type this payload naturally belongs to.
	pub fn value_type(&self) -> FargType {
		match self {
			ValueKind::Undefined { .. } => FargType::Untyped,
			ValueKind::Integer { .. } => FargType::Integer,
			ValueKind::Float { .. } => FargType::Float,
			ValueKind::Nominal { .. } => FargType::Nominal,
			ValueKind::QuoteString { .. } => FargType::QuoteString,
			ValueKind::Text { .. } => FargType::Text,
			ValueKind::TimeStamp { .. } => FargType::TimeStamp,
			ValueKind::Predicate(_) => FargType::Predicate,
			ValueKind::ColPredicate(_) => FargType::ColPredicate,
		}
	}
}

/// A value bound to one formal argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
	id: DbId,
	farg_id: DbId,
	farg_type: FargType,
	sub_range: bool,
	cell_id: DbId,
	pred_id: DbId,
	empty: bool,
	kind: ValueKind,
}

impl DataValue {
	/// An empty value bound to `farg`.
	pub(crate) fn bound_to(farg: &FormalArgument, kind: ValueKind) -> Self {
		Self {
			id: DbId::INVALID,
			farg_id: farg.id(),
			farg_type: farg.farg_type(),
			sub_range: farg.sub_range(),
			cell_id: DbId::INVALID,
			pred_id: DbId::INVALID,
			empty: true,
			kind,
		}
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	#[inline]
	pub fn farg_id(&self) -> DbId {
		self.farg_id
	}

	#[inline]
	pub fn farg_type(&self) -> FargType {
		self.farg_type
	}

	#[inline]
	pub fn sub_range(&self) -> bool {
		self.sub_range
	}

	#[inline]
	pub fn cell_id(&self) -> DbId {
		self.cell_id
	}

	/// Id of the enclosing predicate body, or `INVALID` at the top level of a cell.
	#[inline]
	pub fn pred_id(&self) -> DbId {
		self.pred_id
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.empty
	}

	#[inline]
	pub fn kind(&self) -> &ValueKind {
		&self.kind
	}

	pub(crate) fn kind_mut(&mut self) -> &mut ValueKind {
		&mut self.kind
	}

	pub(crate) fn set_id(&mut self, id: DbId) {
		self.id = id;
	}

	pub(crate) fn set_owners(&mut self, cell_id: DbId, pred_id: DbId) {
		self.cell_id = cell_id;
		self.pred_id = pred_id;
	}

	pub fn int_value(&self) -> Option<i64> {
		match self.kind {
			ValueKind::Integer { value, .. } => Some(value),
			_ => None,
		}
	}

	pub fn float_value(&self) -> Option<f64> {
		match self.kind {
			ValueKind::Float { value, .. } => Some(value),
			_ => None,
		}
	}

	/// Contents of a nominal, quote-string, or text value.
	pub fn str_value(&self) -> Option<&str> {
		match &self.kind {
			ValueKind::Nominal { value }
			| ValueKind::QuoteString { value }
			| ValueKind::Text { value } => Some(value),
			_ => None,
		}
	}

	pub fn time_stamp(&self) -> Option<TimeStamp> {
		match self.kind {
			ValueKind::TimeStamp { value, .. } => Some(value),
			_ => None,
		}
	}

	/// The nested predicate of a predicate or column-predicate value.
	pub fn predicate(&self) -> Option<&Predicate> {
		match &self.kind {
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => Some(pred),
			_ => None,
		}
	}

	pub fn predicate_mut(&mut self) -> Option<&mut Predicate> {
		match &mut self.kind {
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => Some(pred),
			_ => None,
		}
	}

	/// Whether the value holds its type's default contents.
	pub fn is_default(&self) -> bool {
		match &self.kind {
			ValueKind::Undefined { .. } => true,
			ValueKind::Integer { value, .. } => *value == 0,
			ValueKind::Float { value, .. } => *value == 0.0,
			ValueKind::Nominal { value }
			| ValueKind::QuoteString { value }
			| ValueKind::Text { value } => value.is_empty(),
			ValueKind::TimeStamp { value, .. } => value.ticks() == 0,
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => pred.is_undefined(),
		}
	}

	/// Resets the contents to the type's default and marks the value empty.
	pub fn clear_value(&mut self) {
		match &mut self.kind {
			ValueKind::Undefined { .. } => {}
			ValueKind::Integer { value, min, max } => {
				*value = coerce_int(0, *min, *max, self.sub_range);
			}
			ValueKind::Float { value, min, max } => {
				*value = coerce_float(0.0, *min, *max, self.sub_range);
			}
			ValueKind::Nominal { value }
			| ValueKind::QuoteString { value }
			| ValueKind::Text { value } => value.clear(),
			ValueKind::TimeStamp { value, min, max } => {
				let zero = TimeStamp::zero(value.tps()).unwrap_or(*value);
				*value = if self.sub_range {
					zero.clamp_time(min, max)
				} else {
					zero
				};
			}
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => pred.reset_to_undefined(),
		}
		self.empty = true;
	}

	/// Stores an integer, clamping into the subrange when active.
	///
	/// An untyped slot switches to holding an unbounded integer.
	pub fn set_int(&mut self, v: i64) -> DbResult<()> {
		match &mut self.kind {
			ValueKind::Integer { value, min, max } => {
				*value = coerce_int(v, *min, *max, self.sub_range);
			}
			_ if self.farg_type == FargType::Untyped => {
				self.kind = ValueKind::Integer {
					value: v,
					min: i64::MIN,
					max: i64::MAX,
				};
			}
			_ => return Err(self.mismatch(FargType::Integer)),
		}
		self.empty = false;
		Ok(())
	}

	/// Stores a float, clamping into the subrange when active. NaN and infinities are refused.
	pub fn set_float(&mut self, v: f64) -> DbResult<()> {
		if !v.is_finite() {
			return Err(LogicError::NonFiniteFloat.into());
		}
		match &mut self.kind {
			ValueKind::Float { value, min, max } => {
				*value = coerce_float(v, *min, *max, self.sub_range);
			}
			_ if self.farg_type == FargType::Untyped => {
				self.kind = ValueKind::Float {
					value: v,
					min: f64::MIN,
					max: f64::MAX,
				};
			}
			_ => return Err(self.mismatch(FargType::Float)),
		}
		self.empty = false;
		Ok(())
	}

	pub fn set_time_stamp(&mut self, ts: TimeStamp) -> DbResult<()> {
		match &mut self.kind {
			ValueKind::TimeStamp { value, min, max } => {
				*value = if self.sub_range {
					ts.clamp_time(min, max)
				} else {
					ts
				};
			}
			_ if self.farg_type == FargType::Untyped => {
				self.kind = ValueKind::TimeStamp {
					value: ts,
					min: TimeStamp::zero(ts.tps())?,
					max: TimeStamp::max_at(ts.tps())?,
				};
			}
			_ => return Err(self.mismatch(FargType::TimeStamp)),
		}
		self.empty = false;
		Ok(())
	}

	pub fn set_nominal(&mut self, s: impl Into<String>) -> DbResult<()> {
		let s = s.into();
		check_grammar(&s, NameKind::Nominal, grammar::is_nominal)?;
		self.set_string(FargType::Nominal, s)
	}

	pub fn set_quote_string(&mut self, s: impl Into<String>) -> DbResult<()> {
		let s = s.into();
		check_grammar(&s, NameKind::QuoteString, grammar::is_quote_string)?;
		self.set_string(FargType::QuoteString, s)
	}

	/// Stores free text. Only text slots accept text.
	pub fn set_text(&mut self, s: impl Into<String>) -> DbResult<()> {
		let s = s.into();
		check_grammar(&s, NameKind::Text, grammar::is_text_string)?;
		match &mut self.kind {
			ValueKind::Text { value } => *value = s,
			_ => return Err(self.mismatch(FargType::Text)),
		}
		self.empty = false;
		Ok(())
	}

	/// Stores a nested predicate. An undefined predicate leaves the value empty.
	pub fn set_predicate(&mut self, pred: Predicate) -> DbResult<()> {
		if !matches!(self.farg_type, FargType::Predicate | FargType::Untyped) {
			return Err(self.mismatch(FargType::Predicate));
		}
		self.empty = pred.is_undefined();
		self.kind = ValueKind::Predicate(pred);
		Ok(())
	}

	pub fn set_col_predicate(&mut self, pred: Predicate) -> DbResult<()> {
		if !matches!(self.farg_type, FargType::ColPredicate | FargType::Untyped) {
			return Err(self.mismatch(FargType::ColPredicate));
		}
		self.empty = pred.is_undefined();
		self.kind = ValueKind::ColPredicate(pred);
		Ok(())
	}

	fn set_string(&mut self, expected: FargType, s: String) -> DbResult<()> {
		match (&mut self.kind, expected) {
			(ValueKind::Nominal { value }, FargType::Nominal)
			| (ValueKind::QuoteString { value }, FargType::QuoteString) => *value = s,
			_ if self.farg_type == FargType::Untyped => {
				self.kind = match expected {
					FargType::Nominal => ValueKind::Nominal { value: s },
					_ => ValueKind::QuoteString { value: s },
				};
			}
			_ => return Err(self.mismatch(expected)),
		}
		self.empty = false;
		Ok(())
	}

	/// Copies the subrange of `farg` into this value and re-coerces the stored contents.
	///
	/// Predicate values only pick up the flag: their membership is checked lazily against the
	/// live argument.
	pub fn update_subrange(&mut self, farg: &FormalArgument) -> DbResult<()> {
		if self.farg_type != farg.farg_type() {
			return Err(SystemError::TypeMismatch {
				expected: farg.farg_type(),
				found: self.farg_type,
			}
			.into());
		}
		let mismatch = SystemError::TypeMismatch {
			expected: farg.farg_type(),
			found: self.kind.value_type(),
		};
		match (farg.kind(), &mut self.kind) {
			(FargKind::Integer(b), ValueKind::Integer { value, min, max }) => {
				if b.sub_range && b.min >= b.max {
					return Err(SystemError::BadRange.into());
				}
				self.sub_range = b.sub_range;
				(*min, *max) = (b.min, b.max);
				*value = coerce_int(*value, *min, *max, self.sub_range);
			}
			(FargKind::Float(b), ValueKind::Float { value, min, max }) => {
				if b.sub_range && b.min >= b.max {
					return Err(SystemError::BadRange.into());
				}
				self.sub_range = b.sub_range;
				(*min, *max) = (b.min, b.max);
				*value = coerce_float(*value, *min, *max, self.sub_range);
			}
			(FargKind::TimeStamp(b), ValueKind::TimeStamp { value, min, max }) => {
				if b.sub_range && b.min.cmp_time(&b.max).is_ge() {
					return Err(SystemError::BadRange.into());
				}
				self.sub_range = b.sub_range;
				(*min, *max) = (b.min, b.max);
				if self.sub_range {
					*value = value.clamp_time(min, max);
				}
			}
			(FargKind::Nominal(set), ValueKind::Nominal { value }) => {
				self.sub_range = set.sub_range;
				if set.sub_range && !value.is_empty() && !set.members.contains(value.as_str()) {
					self.clear_value();
				}
			}
			(FargKind::Predicate(set), ValueKind::Predicate(_)) => {
				self.sub_range = set.sub_range;
			}
			(FargKind::Untyped, _)
			| (FargKind::QuoteString, ValueKind::QuoteString { .. })
			| (FargKind::Text, ValueKind::Text { .. })
			| (FargKind::ColPredicate, ValueKind::ColPredicate(_)) => {
				self.sub_range = false;
			}
			_ => return Err(mismatch.into()),
		}
		Ok(())
	}

	/// Applies the subrange of `farg` and replaces a predicate that is not in the approved set
	/// with the undefined predicate.
	pub fn enforce_subrange(&mut self, farg: &FormalArgument) -> DbResult<()> {
		self.update_subrange(farg)?;
		if let ValueKind::Predicate(pred) = &self.kind
			&& !farg.is_valid_value(&self.kind)
		{
			tracing::debug!(ve = %pred.ve_id(), farg = %farg.id(), "predicate outside approved set");
			self.clear_value();
		}
		Ok(())
	}

	/// Re-validates this value after its formal argument was edited.
	///
	/// Old and new argument must be two versions of the same slot and this value must be
	/// bound to it. Re-coerces only when the subrange or range changed.
	pub fn update_for_farg_change(
		&mut self,
		name_changed: bool,
		subrange_changed: bool,
		range_changed: bool,
		old: &FormalArgument,
		new: &FormalArgument,
	) -> DbResult<()> {
		if old.id() != new.id() {
			return Err(SystemError::FargMismatch {
				expected: old.id(),
				found: new.id(),
			}
			.into());
		}
		if old.ve_id() != new.ve_id() {
			return Err(SystemError::ArgOwnerMismatch {
				id: new.id(),
				expected: old.ve_id(),
				found: new.ve_id(),
			}
			.into());
		}
		if old.farg_type() != new.farg_type() {
			return Err(SystemError::ArgRetyped {
				id: new.id(),
				old: old.farg_type(),
				new: new.farg_type(),
			}
			.into());
		}
		if self.farg_id != new.id() {
			return Err(SystemError::FargMismatch {
				expected: new.id(),
				found: self.farg_id,
			}
			.into());
		}
		if self.farg_type != new.farg_type() {
			return Err(SystemError::TypeMismatch {
				expected: new.farg_type(),
				found: self.farg_type,
			}
			.into());
		}
		if name_changed && let ValueKind::Undefined { name } = &mut self.kind {
			*name = new.name().to_owned();
		}
		if subrange_changed || range_changed {
			self.update_subrange(new)?;
		}
		Ok(())
	}

	fn mismatch(&self, found: FargType) -> DbError {
		SystemError::TypeMismatch {
			expected: self.farg_type,
			found,
		}
		.into()
	}
}

/// Clamps into `[min, max]` when `sub_range` is set.
pub fn coerce_int(v: i64, min: i64, max: i64, sub_range: bool) -> i64 {
	if !sub_range {
		v
	} else if v < min {
		min
	} else if v > max {
		max
	} else {
		v
	}
}

/// Clamps into `[min, max]` when `sub_range` is set; NaN lands on `min`.
pub fn coerce_float(v: f64, min: f64, max: f64, sub_range: bool) -> f64 {
	if !sub_range {
		v
	} else if v.is_nan() || v < min {
		min
	} else if v > max {
		max
	} else {
		v
	}
}

fn check_grammar(s: &str, kind: NameKind, accept: fn(&str) -> bool) -> DbResult<()> {
	if accept(s) {
		Ok(())
	} else {
		Err(LogicError::InvalidName {
			kind,
			name: s.to_owned(),
		}
		.into())
	}
}
