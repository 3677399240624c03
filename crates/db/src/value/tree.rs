//! Walks over nested value trees: schema-change rearrangement, deletion fallout, and id
//! bookkeeping for everything a cell owns.

use annota_primitives::DbId;
use rustc_hash::FxHashSet as HashSet;

use super::{DataValue, ValueKind};
use crate::error::{DbResult, SystemError};
use crate::farg::FargType;
use crate::index::{DbElement, DbIndex};
use crate::listeners::{ArgListChange, VeChange};
use crate::vocab::VeKind;

/// Rebuilds an argument list to match the new side of `list`.
///
/// Surviving values move to their new position and are re-validated when their slot's
/// name, subrange, or range changed. Values in deleted slots are dropped; inserted slots
/// receive the slot's empty value.
pub(crate) fn rearrange_args(args: Vec<DataValue>, list: &ArgListChange) -> DbResult<Vec<DataValue>> {
	if args.len() != list.old_args.len() {
		return Err(SystemError::ArityMismatch {
			expected: list.old_args.len(),
			found: args.len(),
		}
		.into());
	}

	let mut slots: Vec<Option<DataValue>> = vec![None; list.new_args.len()];
	for (i, mut value) in args.into_iter().enumerate() {
		if list.deleted[i] {
			continue;
		}
		let j = list.o2n[i].ok_or(SystemError::ArgIdVanished(list.old_args[i].id()))?;
		if list.name_changed[j] || list.subrange_changed[j] || list.range_changed[j] {
			value.update_for_farg_change(
				list.name_changed[j],
				list.subrange_changed[j],
				list.range_changed[j],
				&list.old_args[i],
				&list.new_args[j],
			)?;
		}
		slots[j] = Some(value);
	}

	Ok(slots
		.into_iter()
		.zip(&list.new_args)
		.map(|(slot, farg)| slot.unwrap_or_else(|| farg.construct_empty_arg()))
		.collect())
}

/// Applies `change` to every nested predicate built from the changed element.
pub(crate) fn apply_nested_change(args: &mut [DataValue], change: &VeChange) -> DbResult<()> {
	for value in args {
		let (pred, kind) = match value.kind_mut() {
			ValueKind::Predicate(pred) => (pred, VeKind::Predicate),
			ValueKind::ColPredicate(pred) => (pred, VeKind::Matrix),
			_ => continue,
		};
		if kind == change.kind && pred.ve_id() == change.ve_id {
			pred.apply_def_change(change, change.list_for(kind)?)?;
		}
		apply_nested_change(pred.args_mut(), change)?;
	}
	Ok(())
}

enum Fallout {
	Keep,
	Clear,
	Replace,
}

/// Removes every reference to the deleted vocab element `ve_id`.
///
/// A predicate of the deleted element held in an untyped slot is replaced by the slot's
/// empty value; in a predicate or column-predicate slot it becomes the undefined predicate.
pub(crate) fn apply_nested_deletion(args: &mut [DataValue], ve_id: DbId, idx: &DbIndex) -> DbResult<()> {
	for value in args.iter_mut() {
		let farg_type = value.farg_type();
		let fallout = match value.kind_mut() {
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) if pred.ve_id() == ve_id => {
				match farg_type {
					FargType::Untyped => Fallout::Replace,
					FargType::Predicate | FargType::ColPredicate => Fallout::Clear,
					other => {
						return Err(SystemError::TypeMismatch {
							expected: FargType::Predicate,
							found: other,
						}
						.into());
					}
				}
			}
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => {
				apply_nested_deletion(pred.args_mut(), ve_id, idx)?;
				Fallout::Keep
			}
			_ => Fallout::Keep,
		};
		match fallout {
			Fallout::Keep => {}
			Fallout::Clear => value.clear_value(),
			Fallout::Replace => {
				let farg = idx.formal_arg(value.farg_id())?;
				*value = farg.construct_empty_arg();
			}
		}
	}
	Ok(())
}

/// Ids owned by a cell's value tree.
#[derive(Debug, Default)]
pub(crate) struct TreeIds {
	pub values: HashSet<DbId>,
	/// Predicate body id with its defining vocab element (`INVALID` when undefined).
	pub bodies: Vec<(DbId, DbId)>,
}

impl TreeIds {
	pub fn body_ids(&self) -> HashSet<DbId> {
		self.bodies.iter().map(|(body, _)| *body).collect()
	}
}

pub(crate) fn collect_ids(args: &[DataValue]) -> TreeIds {
	let mut ids = TreeIds::default();
	collect_into(args, &mut ids);
	ids
}

fn collect_into(args: &[DataValue], ids: &mut TreeIds) {
	for value in args {
		if value.id().is_valid() {
			ids.values.insert(value.id());
		}
		if let Some(pred) = value.predicate() {
			if pred.id().is_valid() {
				ids.bodies.push((pred.id(), pred.ve_id()));
			}
			collect_into(pred.args(), ids);
		}
	}
}

/// Indexes every value and predicate body still at `INVALID` and stamps owner ids.
pub(crate) fn assign_ids(args: &mut [DataValue], cell: DbId, parent: DbId, idx: &mut DbIndex) {
	for value in args {
		if !value.id().is_valid() {
			value.set_id(idx.add_element(DbElement::DataValue { cell }));
		}
		value.set_owners(cell, parent);
		if let Some(pred) = value.predicate_mut() {
			if !pred.id().is_valid() {
				pred.set_id(idx.add_element(DbElement::PredicateBody { cell }));
			}
			pred.set_cell_id(cell);
			let body = pred.id();
			assign_ids(pred.args_mut(), cell, body, idx);
		}
	}
}

/// Keeps the ids in `keep` and forgets the rest so they are indexed afresh.
///
/// An id survives only once: a copy appearing twice keeps it in the first position.
pub(crate) fn retain_ids(args: &mut [DataValue], keep: &TreeIds) {
	let bodies = keep.body_ids();
	let mut seen = HashSet::default();
	retain_into(args, &keep.values, &bodies, &mut seen);
}

fn retain_into(
	args: &mut [DataValue],
	values: &HashSet<DbId>,
	bodies: &HashSet<DbId>,
	seen: &mut HashSet<DbId>,
) {
	for value in args {
		if !values.contains(&value.id()) || !seen.insert(value.id()) {
			value.set_id(DbId::INVALID);
		}
		if let Some(pred) = value.predicate_mut() {
			if !bodies.contains(&pred.id()) || !seen.insert(pred.id()) {
				pred.set_id(DbId::INVALID);
			}
			retain_into(pred.args_mut(), values, bodies, seen);
		}
	}
}
