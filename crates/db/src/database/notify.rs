//! Delivery of noted changes and deletions to listeners, plus the id bookkeeping that keeps
//! cell value trees in step with the index and with their predicates' listener sets.

use annota_primitives::DbId;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

use super::Database;
use crate::error::{DbResult, SystemError};
use crate::index::{DbElement, DbIndex};
use crate::listeners::VeChange;
use crate::value::DataValue;
use crate::value::tree::{self, TreeIds};

type CellSet = IndexSet<DbId, FxBuildHasher>;

impl Database {
	/// Delivers the change noted on `ve_id`: internal listeners, then external observers.
	/// The note is discarded whether or not delivery succeeds.
	pub(super) fn dispatch_change(&mut self, ve_id: DbId) -> DbResult<()> {
		let result = self.deliver_change(ve_id);
		self.vl.listeners_mut(ve_id)?.discard_change_notes();
		result
	}

	fn deliver_change(&mut self, ve_id: DbId) -> DbResult<()> {
		let listeners = self.vl.listeners(ve_id)?;
		let change = listeners
			.noted_change()
			.cloned()
			.ok_or(SystemError::NoChangesNoted(ve_id))?;
		let internal = listeners.internal().to_vec();
		tracing::debug!(ve = %ve_id, internal = internal.len(), "delivering vocab element change");

		let mut cells = CellSet::default();
		for listener in internal {
			// An earlier listener's update may have dropped this body.
			if !self.idx.in_index(listener) {
				continue;
			}
			match self.idx.get_element(listener)?.clone() {
				DbElement::Column => self.column_def_changed(listener, &change)?,
				DbElement::PredicateBody { cell } => {
					cells.insert(cell);
				}
				other => {
					return Err(SystemError::KindMismatch {
						id: listener,
						expected: "column or predicate",
						found: other.kind_name(),
					}
					.into());
				}
			}
		}
		for cell in cells {
			self.update_cell(cell, |args, _| tree::apply_nested_change(args, &change))?;
		}

		self.vl.listeners(ve_id)?.notify_external_of_change()
	}

	/// Clears every reference to `ve_id` ahead of its removal, then tells external observers.
	pub(super) fn dispatch_deletion(&mut self, ve_id: DbId) -> DbResult<()> {
		let internal = self.vl.listeners(ve_id)?.internal().to_vec();
		tracing::debug!(ve = %ve_id, internal = internal.len(), "delivering vocab element deletion");

		let mut cells = CellSet::default();
		for listener in internal {
			if !self.idx.in_index(listener) {
				continue;
			}
			match self.idx.get_element(listener)?.clone() {
				DbElement::Column => return Err(SystemError::BacksColumn(ve_id).into()),
				DbElement::PredicateBody { cell } => {
					cells.insert(cell);
				}
				other => {
					return Err(SystemError::KindMismatch {
						id: listener,
						expected: "predicate",
						found: other.kind_name(),
					}
					.into());
				}
			}
		}
		for cell in cells {
			self.update_cell(cell, |args, idx| tree::apply_nested_deletion(args, ve_id, idx))?;
		}

		self.vl.listeners(ve_id)?.notify_external_of_deletion();
		Ok(())
	}

	/// The column backing the changed matrix picks up a rename and rearranges its cells.
	fn column_def_changed(&mut self, column_id: DbId, change: &VeChange) -> DbResult<()> {
		let column = self
			.columns
			.get_mut(&column_id)
			.ok_or(SystemError::NotFound(column_id))?;
		column.apply_def_change(change)?;
		if !change.args.changed {
			return Ok(());
		}
		let cells = column.cells().to_vec();
		tracing::debug!(column = %column_id, cells = cells.len(), "rearranging column cells");
		for cell in cells {
			self.update_cell(cell, |args, _| {
				*args = tree::rearrange_args(std::mem::take(args), &change.args)?;
				Ok(())
			})?;
		}
		Ok(())
	}

	/// Runs `edit` over a cell's arguments, then indexes new nodes, drops vanished ones, and
	/// moves predicate bodies between listener sets to match.
	pub(super) fn update_cell(
		&mut self,
		cell_id: DbId,
		edit: impl FnOnce(&mut Vec<DataValue>, &DbIndex) -> DbResult<()>,
	) -> DbResult<()> {
		let cell = self
			.cells
			.get_mut(&cell_id)
			.ok_or(SystemError::NotFound(cell_id))?;
		let before = tree::collect_ids(cell.args());
		edit(cell.args_mut(), &self.idx)?;
		tree::assign_ids(cell.args_mut(), cell_id, DbId::INVALID, &mut self.idx);
		let after = tree::collect_ids(cell.args());
		self.sync_tree_ids(&before, &after)
	}

	pub(super) fn sync_tree_ids(&mut self, before: &TreeIds, after: &TreeIds) -> DbResult<()> {
		for &(body, ve) in &before.bodies {
			if ve.is_valid() && !after.bodies.contains(&(body, ve)) {
				self.vl.listeners_mut(ve)?.deregister_internal(body)?;
			}
		}

		let after_bodies = after.body_ids();
		for body in before.body_ids() {
			if !after_bodies.contains(&body) {
				self.idx.remove_element(body)?;
			}
		}
		for &value in &before.values {
			if !after.values.contains(&value) {
				self.idx.remove_element(value)?;
			}
		}

		for &(body, ve) in &after.bodies {
			if ve.is_valid() && !before.bodies.contains(&(body, ve)) {
				self.vl
					.listeners_mut(ve)?
					.register_internal(body, &self.idx)?;
			}
		}
		Ok(())
	}
}
