//! Formal arguments: the typed, named slots of a vocab element.
//!
//! # Mental Model
//!
//! A [`FormalArgument`] is a common header (id, owning element, name, hidden flag) plus a
//! [`FargKind`] carrying the per-type restriction. Numeric and time-stamp kinds restrict by
//! [`Bounds`]; nominal and predicate kinds restrict by membership in an approved set.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`FormalArgument`] | One slot of a vocab element's argument list. |
//! | [`FargKind`] | Per-type payload and subrange. |
//! | [`FargType`] | Discriminant tag cached by data values. |
//! | [`FargDiff`] | Name / subrange / range change between two versions of a slot. |
//!
//! # Invariants
//!
//! - Active bounds satisfy `min < max`.
//!   - Enforced in: [`FormalArgument::new`], [`FormalArgument::set_int_range`],
//!     [`FormalArgument::set_float_range`], [`FormalArgument::set_time_stamp_range`].
//!   - Tested by: `farg::tests::test_range_setters_reject_inverted_bounds`
//!   - Failure symptom: clamping produces values outside the declared range.

use std::collections::BTreeSet;

use annota_primitives::{DbId, TimeStamp, grammar};
use serde::{Deserialize, Serialize};

use crate::error::{DbResult, LogicError, NameKind, SystemError};
use crate::value::{DataValue, Predicate, ValueKind};

mod salvage;

/// Name given to arguments created without one.
pub const DEFAULT_ARG_NAME: &str = "<val>";

/// Discriminant of a formal argument (and the type tag cached by bound data values).
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FargType {
	Undefined,
	ColPredicate,
	Integer,
	Float,
	Nominal,
	Predicate,
	QuoteString,
	TimeStamp,
	Text,
	Untyped,
}

/// Numeric or time bounds. Only enforced while `sub_range` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
	pub sub_range: bool,
	pub min: T,
	pub max: T,
}

/// Approved nominal values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominalSet {
	pub sub_range: bool,
	pub members: BTreeSet<String>,
}

/// Approved predicate vocab elements, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSet {
	pub sub_range: bool,
	pub members: BTreeSet<DbId>,
}

/// Per-type payload of a formal argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FargKind {
	Untyped,
	Integer(Bounds<i64>),
	Float(Bounds<f64>),
	Nominal(NominalSet),
	Predicate(PredicateSet),
	TimeStamp(Bounds<TimeStamp>),
	QuoteString,
	Text,
	ColPredicate,
}

impl FargKind {
	pub fn farg_type(&self) -> FargType {
		match self {
			FargKind::Untyped => FargType::Untyped,
			FargKind::Integer(_) => FargType::Integer,
			FargKind::Float(_) => FargType::Float,
			FargKind::Nominal(_) => FargType::Nominal,
			FargKind::Predicate(_) => FargType::Predicate,
			FargKind::TimeStamp(_) => FargType::TimeStamp,
			FargKind::QuoteString => FargType::QuoteString,
			FargKind::Text => FargType::Text,
			FargKind::ColPredicate => FargType::ColPredicate,
		}
	}

	fn check_bounds(&self) -> DbResult<()> {
		let inverted = match self {
			FargKind::Integer(b) => b.sub_range && b.min >= b.max,
			FargKind::Float(b) => b.sub_range && b.min >= b.max,
			FargKind::TimeStamp(b) => {
				b.sub_range && (b.min.tps() != b.max.tps() || b.min.cmp_time(&b.max).is_ge())
			}
			_ => false,
		};
		if inverted {
			return Err(SystemError::BadRange.into());
		}
		Ok(())
	}
}

/// One slot in a vocab element's argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormalArgument {
	id: DbId,
	ve_id: DbId,
	name: String,
	hidden: bool,
	kind: FargKind,
}

impl FormalArgument {
	/// Creates an unindexed argument, validating the name and bounds.
	pub fn new(name: impl Into<String>, kind: FargKind) -> DbResult<Self> {
		let name = name.into();
		check_arg_name(&name)?;
		kind.check_bounds()?;
		Ok(Self {
			id: DbId::INVALID,
			ve_id: DbId::INVALID,
			name,
			hidden: false,
			kind,
		})
	}

	pub fn untyped(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::Untyped)
	}

	pub fn integer(name: impl Into<String>) -> DbResult<Self> {
		Self::new(
			name,
			FargKind::Integer(Bounds {
				sub_range: false,
				min: i64::MIN,
				max: i64::MAX,
			}),
		)
	}

	pub fn float(name: impl Into<String>) -> DbResult<Self> {
		Self::new(
			name,
			FargKind::Float(Bounds {
				sub_range: false,
				min: f64::MIN,
				max: f64::MAX,
			}),
		)
	}

	pub fn nominal(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::Nominal(NominalSet::default()))
	}

	pub fn predicate(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::Predicate(PredicateSet::default()))
	}

	/// A time-stamp slot whose default bounds span every tick at `tps`.
	pub fn time_stamp(name: impl Into<String>, tps: u32) -> DbResult<Self> {
		Self::new(
			name,
			FargKind::TimeStamp(Bounds {
				sub_range: false,
				min: TimeStamp::zero(tps)?,
				max: TimeStamp::max_at(tps)?,
			}),
		)
	}

	pub fn quote_string(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::QuoteString)
	}

	pub fn text(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::Text)
	}

	pub fn col_predicate(name: impl Into<String>) -> DbResult<Self> {
		Self::new(name, FargKind::ColPredicate)
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	#[inline]
	pub fn ve_id(&self) -> DbId {
		self.ve_id
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[inline]
	pub fn hidden(&self) -> bool {
		self.hidden
	}

	#[inline]
	pub fn kind(&self) -> &FargKind {
		&self.kind
	}

	#[inline]
	pub fn farg_type(&self) -> FargType {
		self.kind.farg_type()
	}

	/// Whether a subrange restriction is active.
	pub fn sub_range(&self) -> bool {
		match &self.kind {
			FargKind::Integer(b) => b.sub_range,
			FargKind::Float(b) => b.sub_range,
			FargKind::TimeStamp(b) => b.sub_range,
			FargKind::Nominal(set) => set.sub_range,
			FargKind::Predicate(set) => set.sub_range,
			FargKind::Untyped | FargKind::QuoteString | FargKind::Text | FargKind::ColPredicate => {
				false
			}
		}
	}

	pub fn set_name(&mut self, name: impl Into<String>) -> DbResult<()> {
		let name = name.into();
		check_arg_name(&name)?;
		self.name = name;
		Ok(())
	}

	pub fn set_hidden(&mut self, hidden: bool) {
		self.hidden = hidden;
	}

	pub(crate) fn set_id(&mut self, id: DbId) {
		self.id = id;
	}

	pub(crate) fn set_ve_id(&mut self, ve_id: DbId) {
		self.ve_id = ve_id;
	}

	/// Restricts an integer slot to `[min, max]`.
	pub fn set_int_range(&mut self, min: i64, max: i64) -> DbResult<()> {
		let FargKind::Integer(bounds) = &mut self.kind else {
			return Err(self.type_mismatch(FargType::Integer));
		};
		if min >= max {
			return Err(SystemError::BadRange.into());
		}
		*bounds = Bounds {
			sub_range: true,
			min,
			max,
		};
		Ok(())
	}

	/// Restricts a float slot to `[min, max]`.
	pub fn set_float_range(&mut self, min: f64, max: f64) -> DbResult<()> {
		let FargKind::Float(bounds) = &mut self.kind else {
			return Err(self.type_mismatch(FargType::Float));
		};
		if min.partial_cmp(&max) != Some(std::cmp::Ordering::Less) {
			return Err(SystemError::BadRange.into());
		}
		*bounds = Bounds {
			sub_range: true,
			min,
			max,
		};
		Ok(())
	}

	/// Restricts a time-stamp slot to `[min, max]`. Both ends must share a tick rate.
	pub fn set_time_stamp_range(&mut self, min: TimeStamp, max: TimeStamp) -> DbResult<()> {
		let FargKind::TimeStamp(bounds) = &mut self.kind else {
			return Err(self.type_mismatch(FargType::TimeStamp));
		};
		if min.tps() != max.tps() || min.cmp_time(&max).is_ge() {
			return Err(SystemError::BadRange.into());
		}
		*bounds = Bounds {
			sub_range: true,
			min,
			max,
		};
		Ok(())
	}

	/// Restricts a nominal slot to the given values.
	pub fn set_approved_nominals<I, S>(&mut self, values: I) -> DbResult<()>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let FargKind::Nominal(set) = &mut self.kind else {
			return Err(self.type_mismatch(FargType::Nominal));
		};
		let mut members = BTreeSet::new();
		for value in values {
			let value = value.into();
			if !grammar::is_nominal(&value) {
				return Err(LogicError::InvalidName {
					kind: NameKind::Nominal,
					name: value,
				}
				.into());
			}
			members.insert(value);
		}
		*set = NominalSet {
			sub_range: true,
			members,
		};
		Ok(())
	}

	/// Restricts a predicate slot to predicates built from the given vocab elements.
	pub fn set_approved_predicates<I>(&mut self, ve_ids: I) -> DbResult<()>
	where
		I: IntoIterator<Item = DbId>,
	{
		let FargKind::Predicate(set) = &mut self.kind else {
			return Err(self.type_mismatch(FargType::Predicate));
		};
		let mut members = BTreeSet::new();
		for id in ve_ids {
			if !id.is_valid() {
				return Err(SystemError::InvalidId.into());
			}
			members.insert(id);
		}
		*set = PredicateSet {
			sub_range: true,
			members,
		};
		Ok(())
	}

	/// Drops any subrange restriction, keeping stored bounds or sets.
	pub fn clear_subrange(&mut self) {
		match &mut self.kind {
			FargKind::Integer(b) => b.sub_range = false,
			FargKind::Float(b) => b.sub_range = false,
			FargKind::TimeStamp(b) => b.sub_range = false,
			FargKind::Nominal(set) => set.sub_range = false,
			FargKind::Predicate(set) => set.sub_range = false,
			FargKind::Untyped | FargKind::QuoteString | FargKind::Text | FargKind::ColPredicate => {}
		}
	}

	/// Whether `value` could legally occupy this slot right now.
	///
	/// Predicate membership is checked against this argument's current approved set, so a
	/// stored value can become invalid when the set is edited.
	pub fn is_valid_value(&self, value: &ValueKind) -> bool {
		match (&self.kind, value) {
			(FargKind::Untyped, ValueKind::Text { .. }) => false,
			(FargKind::Untyped, ValueKind::Nominal { value }) => {
				value.is_empty() || grammar::is_nominal(value)
			}
			(FargKind::Untyped, ValueKind::QuoteString { value }) => grammar::is_quote_string(value),
			(FargKind::Untyped, _) => true,
			(FargKind::Integer(b), ValueKind::Integer { value, .. }) => {
				!b.sub_range || (b.min..=b.max).contains(value)
			}
			(FargKind::Float(b), ValueKind::Float { value, .. }) => {
				!b.sub_range || (b.min..=b.max).contains(value)
			}
			(FargKind::TimeStamp(b), ValueKind::TimeStamp { value, .. }) => {
				!b.sub_range || (value.cmp_time(&b.min).is_ge() && value.cmp_time(&b.max).is_le())
			}
			(FargKind::Nominal(set), ValueKind::Nominal { value }) => {
				value.is_empty()
					|| (grammar::is_nominal(value) && (!set.sub_range || set.members.contains(value)))
			}
			(FargKind::Predicate(set), ValueKind::Predicate(pred)) => {
				!set.sub_range || pred.is_undefined() || set.members.contains(&pred.ve_id())
			}
			(FargKind::QuoteString, ValueKind::QuoteString { value }) => {
				grammar::is_quote_string(value)
			}
			(FargKind::Text, ValueKind::Text { value }) => grammar::is_text_string(value),
			(FargKind::ColPredicate, ValueKind::ColPredicate(_)) => true,
			_ => false,
		}
	}

	/// The unset placeholder value for this slot.
	pub fn construct_empty_arg(&self) -> DataValue {
		let kind = match &self.kind {
			FargKind::Untyped => ValueKind::Undefined {
				name: self.name.clone(),
			},
			FargKind::Integer(b) => ValueKind::Integer {
				value: 0,
				min: b.min,
				max: b.max,
			},
			FargKind::Float(b) => ValueKind::Float {
				value: 0.0,
				min: b.min,
				max: b.max,
			},
			FargKind::Nominal(_) => ValueKind::Nominal {
				value: String::new(),
			},
			FargKind::Predicate(_) => ValueKind::Predicate(Predicate::undefined()),
			FargKind::TimeStamp(b) => ValueKind::TimeStamp {
				value: if b.sub_range { b.min } else { zero_like(&b.min) },
				min: b.min,
				max: b.max,
			},
			FargKind::QuoteString => ValueKind::QuoteString {
				value: String::new(),
			},
			FargKind::Text => ValueKind::Text {
				value: String::new(),
			},
			FargKind::ColPredicate => ValueKind::ColPredicate(Predicate::undefined()),
		};
		DataValue::bound_to(self, kind)
	}

	fn type_mismatch(&self, expected: FargType) -> crate::error::DbError {
		SystemError::TypeMismatch {
			expected,
			found: self.farg_type(),
		}
		.into()
	}
}

fn zero_like(ts: &TimeStamp) -> TimeStamp {
	TimeStamp::zero(ts.tps()).unwrap_or(*ts)
}

fn check_arg_name(name: &str) -> DbResult<()> {
	if grammar::is_formal_arg_name(name) {
		Ok(())
	} else {
		Err(LogicError::InvalidName {
			kind: NameKind::FormalArg,
			name: name.to_owned(),
		}
		.into())
	}
}

/// Which aspects of a slot differ between its old and new definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FargDiff {
	pub name: bool,
	pub sub_range: bool,
	pub range: bool,
}

impl FargDiff {
	/// Compares two versions of the same slot.
	///
	/// Both must belong to the same vocab element and share a type; retyping is modeled as
	/// delete plus insert and never reaches this comparison.
	pub fn between(old: &FormalArgument, new: &FormalArgument) -> DbResult<Self> {
		if old.ve_id != new.ve_id {
			return Err(SystemError::ArgOwnerMismatch {
				id: new.id,
				expected: old.ve_id,
				found: new.ve_id,
			}
			.into());
		}
		if old.farg_type() != new.farg_type() {
			return Err(SystemError::ArgRetyped {
				id: new.id,
				old: old.farg_type(),
				new: new.farg_type(),
			}
			.into());
		}
		Ok(Self {
			name: old.name != new.name,
			sub_range: old.sub_range() != new.sub_range(),
			range: range_changed(&old.kind, &new.kind),
		})
	}

	pub fn any(&self) -> bool {
		self.name || self.sub_range || self.range
	}
}

fn range_changed(old: &FargKind, new: &FargKind) -> bool {
	match (old, new) {
		(FargKind::Integer(a), FargKind::Integer(b)) => a.min != b.min || a.max != b.max,
		(FargKind::Float(a), FargKind::Float(b)) => a.min != b.min || a.max != b.max,
		(FargKind::TimeStamp(a), FargKind::TimeStamp(b)) => {
			a.sub_range != b.sub_range || (a.sub_range && (a.min != b.min || a.max != b.max))
		}
		(FargKind::Nominal(a), FargKind::Nominal(b)) => {
			a.sub_range != b.sub_range || (a.sub_range && a.members != b.members)
		}
		(FargKind::Predicate(a), FargKind::Predicate(b)) => {
			a.sub_range != b.sub_range || (a.sub_range && a.members != b.members)
		}
		_ => false,
	}
}

/// Structural equality ignoring ids.
///
/// Two distinct arguments sharing a valid id are never equivalent: they are two versions of
/// one slot, not mirrors.
pub fn args_equivalent(a: &FormalArgument, b: &FormalArgument) -> bool {
	if std::ptr::eq(a, b) || a.ve_id != b.ve_id || (a.id.is_valid() && a.id == b.id) {
		return false;
	}
	a.name == b.name && a.hidden == b.hidden && a.kind == b.kind
}
