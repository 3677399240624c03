//! The vocab list: registry of every vocab element.
//!
//! # Role
//!
//! Owns the live [`VocabElement`]s keyed by id, the shared name namespace for matrices and
//! predicates, and each element's [`VeListeners`]. Replacing an element reconciles the old and
//! new argument lists by id and keeps the identifier index in step.
//!
//! # Mental Model
//!
//! Every mutating operation runs a pre-flight that inspects but never writes, then commits
//! without further checks. A failed pre-flight leaves the list and the index exactly as they
//! were. Cascade bracketing and listener delivery are the database's job; this module only
//! notes the change.
//!
//! # Invariants
//!
//! - Names are unique across matrices and predicates.
//!   - Enforced in: [`VocabList::add_element`], [`VocabList::replace_element`].
//!   - Tested by: `vocab_list::tests::test_duplicate_name_rejected`
//!   - Failure symptom: name lookups resolve to the wrong element.
//!
//! - A rejected replace mutates nothing.
//!   - Enforced in: [`VocabList::replace_element`] (pre-flight before commit).
//!   - Tested by: `vocab_list::tests::test_rejected_replace_leaves_state`
//!   - Failure symptom: half-applied schema edits with dangling index entries.
//!
//! - Argument ids survive a replace; dropped arguments leave the index; new ones enter it.
//!   - Enforced in: [`VocabList::replace_element`].
//!   - Tested by: `vocab_list::tests::test_replace_reconciles_index`
//!   - Failure symptom: values resolve their slot to a stale or missing argument.

use std::sync::Arc;

use annota_primitives::DbId;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::error::{DbError, DbResult, LogicError, SystemError};
use crate::farg::FormalArgument;
use crate::index::{DbElement, DbIndex};
use crate::listeners::{ListenerHandle, ObserverSet, VeListeners, VocabListObserver};
use crate::vocab::{VeKind, VocabElement, check_ve_name};

#[derive(Debug)]
struct VeEntry {
	ve: VocabElement,
	listeners: VeListeners,
}

/// Registry of vocab elements.
#[derive(Debug, Default)]
pub struct VocabList {
	entries: IndexMap<DbId, VeEntry>,
	names: HashMap<String, DbId>,
	observers: ObserverSet<dyn VocabListObserver>,
}

impl VocabList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Registers `ve`, indexing it and every argument it carries.
	pub fn add_element(&mut self, mut ve: VocabElement, idx: &mut DbIndex) -> DbResult<DbId> {
		logged(self.preflight_add(&ve))?;

		let id = idx.add_element(DbElement::VocabElement(ve.kind()));
		ve.set_id(id);
		for farg in ve.fargs_mut() {
			idx.add_formal_arg(farg)?;
		}
		for farg in ve.cp_fargs_mut() {
			idx.add_formal_arg(farg)?;
		}
		let kind = ve.kind();
		tracing::debug!(%id, name = ve.name(), %kind, args = ve.num_fargs(), "vocab element added");
		self.names.insert(ve.name().to_owned(), id);
		self.entries.insert(
			id,
			VeEntry {
				ve,
				listeners: VeListeners::new(id),
			},
		);
		for observer in self.observers.snapshot() {
			observer.ve_inserted(id, kind);
		}
		Ok(id)
	}

	fn preflight_add(&self, ve: &VocabElement) -> DbResult<()> {
		if ve.id().is_valid() {
			return Err(SystemError::AlreadyIndexed(ve.id()).into());
		}
		check_ve_name(ve.kind(), ve.name())?;
		if self.names.contains_key(ve.name()) {
			return Err(LogicError::NameInUse(ve.name().to_owned()).into());
		}
		if ve.num_fargs() == 0 {
			return Err(LogicError::NoArguments.into());
		}
		if let Some(farg) = ve
			.fargs()
			.iter()
			.chain(ve.cp_fargs())
			.find(|farg| farg.id().is_valid())
		{
			return Err(SystemError::AlreadyIndexed(farg.id()).into());
		}
		ve.check_cp_invariant()
	}

	/// Verifies that `id` can be removed cleanly: it exists, and every argument it owns is
	/// indexed with a matching copy.
	pub fn check_removable(&self, id: DbId, idx: &DbIndex) -> DbResult<()> {
		let ve = self.get(id)?;
		match idx.get_element(id)? {
			DbElement::VocabElement(kind) if *kind == ve.kind() => {}
			other => {
				return Err(SystemError::KindMismatch {
					id,
					expected: ve.kind().label(),
					found: other.kind_name(),
				}
				.into());
			}
		}
		for farg in ve.fargs().iter().chain(ve.cp_fargs()) {
			if idx.formal_arg(farg.id())? != farg {
				return Err(SystemError::ArgIndexMismatch(farg.id()).into());
			}
		}
		if self.names.get(ve.name()) != Some(&id) {
			return Err(SystemError::NameMapMismatch {
				name: ve.name().to_owned(),
				id,
			}
			.into());
		}
		Ok(())
	}

	/// Removes `id` and every argument it owns from the list and the index.
	///
	/// Listener deletion notices must be delivered before calling this.
	pub fn remove_element(&mut self, id: DbId, idx: &mut DbIndex) -> DbResult<VocabElement> {
		self.check_removable(id, idx)?;
		let entry = self
			.entries
			.shift_remove(&id)
			.ok_or(SystemError::NotFound(id))?;
		let ve = entry.ve;
		self.names.remove(ve.name());
		for farg in ve.fargs().iter().chain(ve.cp_fargs()) {
			idx.remove_element(farg.id())?;
		}
		idx.remove_element(id)?;
		tracing::debug!(%id, name = ve.name(), kind = %ve.kind(), "vocab element removed");
		for observer in self.observers.snapshot() {
			observer.ve_deleted(id, ve.kind());
		}
		Ok(ve)
	}

	/// Swaps in a new version of an existing element and notes the change on its listeners.
	///
	/// Arguments of `new` still at `INVALID` are new slots; the rest must match an old
	/// argument by id and type. Old arguments with no counterpart are deleted. System elements
	/// are only replaced with `allow_system`. Returns whether a change was noted.
	pub fn replace_element(
		&mut self,
		mut new: VocabElement,
		idx: &mut DbIndex,
		allow_system: bool,
	) -> DbResult<bool> {
		logged(self.preflight_replace(&new, allow_system))?;
		let id = new.id();

		reconcile_args(self.get(id)?.fargs(), new.fargs_mut(), idx)?;
		reconcile_args(self.get(id)?.cp_fargs(), new.cp_fargs_mut(), idx)?;
		idx.replace_element(id, DbElement::VocabElement(new.kind()))?;

		let entry = self
			.entries
			.get_mut(&id)
			.ok_or(SystemError::NotFound(id))?;
		let old = std::mem::replace(&mut entry.ve, new);
		if old.name() != entry.ve.name() {
			self.names.remove(old.name());
			self.names.insert(entry.ve.name().to_owned(), id);
		}
		tracing::debug!(
			%id,
			old_name = old.name(),
			new_name = entry.ve.name(),
			args = entry.ve.num_fargs(),
			"vocab element replaced"
		);
		entry.listeners.note_change(&old, &entry.ve, idx)
	}

	fn preflight_replace(&self, new: &VocabElement, allow_system: bool) -> DbResult<()> {
		let id = new.id();
		if !id.is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		let old = self.get(id)?;
		if old.kind() != new.kind() {
			return Err(SystemError::KindMismatch {
				id,
				expected: old.kind().label(),
				found: new.kind().label(),
			}
			.into());
		}
		if let (Some(old_type), Some(new_type)) = (old.matrix_type(), new.matrix_type())
			&& old_type != new_type
		{
			return Err(SystemError::MatrixTypeChanged {
				old: old_type,
				new: new_type,
			}
			.into());
		}
		if old.column_id() != new.column_id() {
			return Err(SystemError::ColumnMismatch {
				expected: old.column_id(),
				found: new.column_id(),
			}
			.into());
		}
		if (old.system() || new.system()) && !allow_system {
			return Err(SystemError::SystemElement(id).into());
		}
		if new.num_fargs() == 0 {
			return Err(LogicError::NoArguments.into());
		}
		preflight_args(id, old.fargs(), new.fargs())?;
		preflight_args(id, old.cp_fargs(), new.cp_fargs())?;
		new.check_cp_invariant()?;
		if old.name() != new.name() {
			check_ve_name(new.kind(), new.name())?;
			if self.names.contains_key(new.name()) {
				return Err(LogicError::NameInUse(new.name().to_owned()).into());
			}
		}
		Ok(())
	}

	pub fn get(&self, id: DbId) -> DbResult<&VocabElement> {
		if !id.is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		self.entries
			.get(&id)
			.map(|entry| &entry.ve)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	pub fn get_by_name(&self, name: &str) -> Option<&VocabElement> {
		let id = self.names.get(name)?;
		self.entries.get(id).map(|entry| &entry.ve)
	}

	pub fn id_of(&self, name: &str) -> Option<DbId> {
		self.names.get(name).copied()
	}

	#[inline]
	pub fn contains(&self, id: DbId) -> bool {
		self.entries.contains_key(&id)
	}

	pub fn name_in_use(&self, name: &str) -> bool {
		self.names.contains_key(name)
	}

	pub fn is_matrix(&self, id: DbId) -> DbResult<bool> {
		Ok(self.get(id)?.kind() == VeKind::Matrix)
	}

	pub fn is_predicate(&self, id: DbId) -> DbResult<bool> {
		Ok(self.get(id)?.kind() == VeKind::Predicate)
	}

	/// Every element in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &VocabElement> {
		self.entries.values().map(|entry| &entry.ve)
	}

	/// User-defined matrix elements.
	pub fn matrix_ves(&self) -> Vec<&VocabElement> {
		self.non_system(VeKind::Matrix)
	}

	/// User-defined predicate elements.
	pub fn pred_ves(&self) -> Vec<&VocabElement> {
		self.non_system(VeKind::Predicate)
	}

	fn non_system(&self, kind: VeKind) -> Vec<&VocabElement> {
		self.iter()
			.filter(|ve| ve.kind() == kind && !ve.system())
			.collect()
	}

	pub fn listeners(&self, id: DbId) -> DbResult<&VeListeners> {
		self.entries
			.get(&id)
			.map(|entry| &entry.listeners)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	pub fn listeners_mut(&mut self, id: DbId) -> DbResult<&mut VeListeners> {
		self.entries
			.get_mut(&id)
			.map(|entry| &mut entry.listeners)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	pub fn register_observer(&mut self, observer: Arc<dyn VocabListObserver>) -> ListenerHandle {
		self.observers.register(observer)
	}

	pub fn deregister_observer(&mut self, handle: ListenerHandle) -> DbResult<()> {
		self.observers.deregister(DbId::INVALID, handle)
	}

	pub(crate) fn set_column_id(&mut self, id: DbId, column_id: DbId) -> DbResult<()> {
		let entry = self
			.entries
			.get_mut(&id)
			.ok_or(SystemError::NotFound(id))?;
		entry.ve.set_column_id(column_id)
	}
}

/// Id-level checks of a new argument list against the live one.
fn preflight_args(ve_id: DbId, old: &[FormalArgument], new: &[FormalArgument]) -> DbResult<()> {
	let mut seen = HashSet::default();
	for farg in new.iter().filter(|farg| farg.id().is_valid()) {
		let id = farg.id();
		if !seen.insert(id) {
			return Err(SystemError::DuplicateArgId(id).into());
		}
		let old_arg = old
			.iter()
			.find(|old_arg| old_arg.id() == id)
			.ok_or(SystemError::ArgIdVanished(id))?;
		if old_arg.farg_type() != farg.farg_type() {
			return Err(SystemError::ArgRetyped {
				id,
				old: old_arg.farg_type(),
				new: farg.farg_type(),
			}
			.into());
		}
	}
	if let Some(farg) = new.iter().find(|farg| farg.ve_id() != ve_id) {
		return Err(SystemError::ArgOwnerMismatch {
			id: farg.id(),
			expected: ve_id,
			found: farg.ve_id(),
		}
		.into());
	}
	Ok(())
}

/// Indexes new arguments, refreshes surviving ones, and drops the ones that disappeared.
fn reconcile_args(old: &[FormalArgument], new: &mut [FormalArgument], idx: &mut DbIndex) -> DbResult<()> {
	for farg in new.iter_mut() {
		if farg.id().is_valid() {
			idx.replace_formal_arg(farg)?;
		} else {
			idx.add_formal_arg(farg)?;
		}
	}
	for old_arg in old {
		if !new.iter().any(|farg| farg.id() == old_arg.id()) {
			tracing::trace!(id = %old_arg.id(), name = old_arg.name(), "formal argument dropped");
			idx.remove_element(old_arg.id())?;
		}
	}
	Ok(())
}

/// Logs user-facing rejections before handing them back.
fn logged<T>(result: DbResult<T>) -> DbResult<T> {
	if let Err(DbError::Logic(err)) = &result {
		tracing::warn!(%err, "vocab edit rejected");
	}
	result
}

#[cfg(test)]
mod tests;
