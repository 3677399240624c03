use annota_primitives::DbId;
use serde::{Deserialize, Serialize};

use super::DataValue;
use super::tree::rearrange_args;
use crate::error::{DbResult, SystemError};
use crate::listeners::{ArgListChange, VeChange};
use crate::vocab::{VeKind, VocabElement};

/// Body of a predicate or column-predicate value.
///
/// The same shape serves both: a predicate mirrors a predicate vocab element's argument
/// list, a column predicate mirrors a matrix element's column-predicate list. Which one is
/// decided by the enclosing [`super::ValueKind`] variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
	id: DbId,
	ve_id: DbId,
	name: String,
	var_len: bool,
	cell_id: DbId,
	args: Vec<DataValue>,
}

impl Predicate {
	/// The empty predicate, bound to no vocab element.
	pub fn undefined() -> Self {
		Self {
			id: DbId::INVALID,
			ve_id: DbId::INVALID,
			name: String::new(),
			var_len: false,
			cell_id: DbId::INVALID,
			args: Vec::new(),
		}
	}

	/// A predicate over `pve` with every argument empty.
	pub fn new(pve: &VocabElement) -> DbResult<Self> {
		Self::build(pve, VeKind::Predicate)
	}

	/// A column predicate over `mve` with every argument empty.
	pub fn column(mve: &VocabElement) -> DbResult<Self> {
		Self::build(mve, VeKind::Matrix)
	}

	fn build(ve: &VocabElement, expected: VeKind) -> DbResult<Self> {
		if !ve.id().is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		if ve.kind() != expected {
			return Err(SystemError::KindMismatch {
				id: ve.id(),
				expected: expected.label(),
				found: ve.kind().label(),
			}
			.into());
		}
		let fargs = match expected {
			VeKind::Predicate => ve.fargs(),
			VeKind::Matrix => ve.cp_fargs(),
		};
		Ok(Self {
			id: DbId::INVALID,
			ve_id: ve.id(),
			name: ve.name().to_owned(),
			var_len: ve.var_len(),
			cell_id: DbId::INVALID,
			args: fargs.iter().map(|farg| farg.construct_empty_arg()).collect(),
		})
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	/// The defining vocab element, or `INVALID` for the undefined predicate.
	#[inline]
	pub fn ve_id(&self) -> DbId {
		self.ve_id
	}

	#[inline]
	pub fn is_undefined(&self) -> bool {
		!self.ve_id.is_valid()
	}

	/// Cached name of the defining vocab element.
	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[inline]
	pub fn var_len(&self) -> bool {
		self.var_len
	}

	#[inline]
	pub fn cell_id(&self) -> DbId {
		self.cell_id
	}

	#[inline]
	pub fn args(&self) -> &[DataValue] {
		&self.args
	}

	/// Mutable access to the arguments. The list length is fixed by the vocab element.
	#[inline]
	pub fn args_mut(&mut self) -> &mut [DataValue] {
		&mut self.args
	}

	pub fn arg(&self, i: usize) -> Option<&DataValue> {
		self.args.get(i)
	}

	pub fn arg_mut(&mut self, i: usize) -> Option<&mut DataValue> {
		self.args.get_mut(i)
	}

	pub(crate) fn set_id(&mut self, id: DbId) {
		self.id = id;
	}

	pub(crate) fn set_cell_id(&mut self, cell_id: DbId) {
		self.cell_id = cell_id;
	}

	pub(crate) fn replace_args(&mut self, args: Vec<DataValue>) -> Vec<DataValue> {
		std::mem::replace(&mut self.args, args)
	}

	pub(crate) fn reset_to_undefined(&mut self) {
		let id = self.id;
		let cell_id = self.cell_id;
		*self = Self::undefined();
		self.id = id;
		self.cell_id = cell_id;
	}

	/// Brings this predicate in line with an edited definition of its vocab element.
	///
	/// `list` is the regular argument diff for predicates and the column-predicate diff for
	/// column predicates.
	pub(crate) fn apply_def_change(&mut self, change: &VeChange, list: &ArgListChange) -> DbResult<()> {
		if self.ve_id != change.ve_id {
			return Err(SystemError::KindMismatch {
				id: self.id,
				expected: "predicate of the changed vocab element",
				found: "predicate of another vocab element",
			}
			.into());
		}
		if change.name_changed {
			if self.name != change.old_name {
				return Err(SystemError::StaleCache {
					id: self.id,
					field: "name",
				}
				.into());
			}
			self.name = change.new_name.clone();
		}
		if change.var_len_changed {
			if self.var_len != change.old_var_len {
				return Err(SystemError::StaleCache {
					id: self.id,
					field: "var_len",
				}
				.into());
			}
			self.var_len = change.new_var_len;
		}
		if list.changed {
			let args = std::mem::take(&mut self.args);
			self.args = rearrange_args(args, list)?;
		}
		Ok(())
	}
}
