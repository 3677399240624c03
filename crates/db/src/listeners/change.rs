use annota_primitives::DbId;

use crate::error::{DbResult, SystemError};
use crate::farg::{FargDiff, FormalArgument};
use crate::index::DbIndex;
use crate::vocab::{VeKind, VocabElement};

/// Reconciliation of an old and a new formal-argument list, matched by id.
///
/// Index remaps use `None` where the other side has no counterpart (an inserted new
/// argument, or a deleted old one).
#[derive(Debug, Clone, PartialEq)]
pub struct ArgListChange {
	/// Whether anything in the list differs: length, order, or any per-argument flag.
	pub changed: bool,
	/// New index to old index.
	pub n2o: Vec<Option<usize>>,
	/// Old index to new index.
	pub o2n: Vec<Option<usize>>,
	/// Per new index.
	pub name_changed: Vec<bool>,
	/// Per new index.
	pub subrange_changed: Vec<bool>,
	/// Per new index.
	pub range_changed: Vec<bool>,
	/// Per new index.
	pub inserted: Vec<bool>,
	/// Per old index.
	pub deleted: Vec<bool>,
	pub old_args: Vec<FormalArgument>,
	pub new_args: Vec<FormalArgument>,
}

impl ArgListChange {
	/// Diffs two argument lists. Every new argument must already be indexed.
	pub fn compute(old: &[FormalArgument], new: &[FormalArgument], idx: &DbIndex) -> DbResult<Self> {
		let mut change = Self {
			changed: false,
			n2o: vec![None; new.len()],
			o2n: vec![None; old.len()],
			name_changed: vec![false; new.len()],
			subrange_changed: vec![false; new.len()],
			range_changed: vec![false; new.len()],
			inserted: vec![true; new.len()],
			deleted: vec![true; old.len()],
			old_args: old.to_vec(),
			new_args: new.to_vec(),
		};

		for (j, new_arg) in new.iter().enumerate() {
			if !new_arg.id().is_valid() {
				return Err(SystemError::InvalidId.into());
			}
			idx.formal_arg(new_arg.id())?;

			let Some(i) = old.iter().position(|old_arg| old_arg.id() == new_arg.id()) else {
				continue;
			};
			if change.o2n[i].is_some() {
				return Err(SystemError::DuplicateArgId(new_arg.id()).into());
			}
			let diff = FargDiff::between(&old[i], new_arg)?;
			change.n2o[j] = Some(i);
			change.o2n[i] = Some(j);
			change.deleted[i] = false;
			change.inserted[j] = false;
			change.name_changed[j] = diff.name;
			change.subrange_changed[j] = diff.sub_range;
			change.range_changed[j] = diff.range;
		}

		change.changed = old.len() != new.len()
			|| (0..new.len()).any(|j| {
				change.n2o[j] != Some(j)
					|| change.name_changed[j]
					|| change.subrange_changed[j]
					|| change.range_changed[j]
			});
		Ok(change)
	}
}

/// Structured description of one replace of a vocab element.
#[derive(Debug, Clone, PartialEq)]
pub struct VeChange {
	pub ve_id: DbId,
	pub kind: VeKind,
	pub name_changed: bool,
	pub old_name: String,
	pub new_name: String,
	pub var_len_changed: bool,
	pub old_var_len: bool,
	pub new_var_len: bool,
	/// Regular argument list.
	pub args: ArgListChange,
	/// Column-predicate argument list; matrices only.
	pub cp_args: Option<ArgListChange>,
}

impl VeChange {
	pub fn compute(old: &VocabElement, new: &VocabElement, idx: &DbIndex) -> DbResult<Self> {
		if old.id() != new.id() || !new.id().is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		if old.kind() != new.kind() {
			return Err(SystemError::KindMismatch {
				id: new.id(),
				expected: old.kind().label(),
				found: new.kind().label(),
			}
			.into());
		}
		let cp_args = match new.kind() {
			VeKind::Matrix => Some(ArgListChange::compute(old.cp_fargs(), new.cp_fargs(), idx)?),
			VeKind::Predicate => None,
		};
		Ok(Self {
			ve_id: new.id(),
			kind: new.kind(),
			name_changed: old.name() != new.name(),
			old_name: old.name().to_owned(),
			new_name: new.name().to_owned(),
			var_len_changed: old.var_len() != new.var_len(),
			old_var_len: old.var_len(),
			new_var_len: new.var_len(),
			args: ArgListChange::compute(old.fargs(), new.fargs(), idx)?,
			cp_args,
		})
	}

	/// Whether listeners have anything to react to.
	pub fn is_noteworthy(&self) -> bool {
		self.name_changed
			|| self.var_len_changed
			|| self.args.changed
			|| self.cp_args.as_ref().is_some_and(|cp| cp.changed)
	}

	/// The argument diff that applies to predicates built from this element.
	pub fn list_for(&self, kind: VeKind) -> DbResult<&ArgListChange> {
		match kind {
			VeKind::Predicate => Ok(&self.args),
			VeKind::Matrix => self.cp_args.as_ref().ok_or_else(|| {
				SystemError::KindMismatch {
					id: self.ve_id,
					expected: VeKind::Matrix.label(),
					found: self.kind.label(),
				}
				.into()
			}),
		}
	}
}
