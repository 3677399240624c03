//! Listener registration and change notes.
//!
//! # Mental Model
//!
//! Every vocab element owns a [`VeListeners`] set. Internal listeners are indexed elements
//! (columns, nested predicate bodies) identified by [`DbId`] and resolved through the index
//! at delivery time. External listeners are observer objects outside the schema graph.
//!
//! A replace first *notes* a [`VeChange`] on the set, then the database delivers it: internal
//! listeners first so stored values are re-validated, then external observers, then the note
//! is discarded.
//!
//! # Invariants
//!
//! - At most one change is noted at a time.
//!   - Enforced in: [`VeListeners::note_change`].
//!   - Tested by: `listeners::tests::test_second_note_is_rejected`
//!   - Failure symptom: a stale diff is delivered for a later edit.
//!
//! - Delivering without a noted change is an error.
//!   - Enforced in: [`VeListeners::notify_external_of_change`].
//!   - Tested by: `listeners::tests::test_notify_without_note_fails`
//!   - Failure symptom: observers receive duplicate notifications for one edit.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use annota_primitives::DbId;

use crate::error::{DbResult, SystemError};
use crate::index::DbIndex;
use crate::vocab::{VeKind, VocabElement};

mod cascade;
mod change;

pub use cascade::CascadeListeners;
pub use change::{ArgListChange, VeChange};

/// Observer of one vocab element.
pub trait VeObserver: Send + Sync {
	fn ve_changed(&self, change: &VeChange);
	fn ve_deleted(&self, ve_id: DbId);
}

/// Observer of cascade brackets. Only the outermost bracket is reported.
pub trait CascadeObserver: Send + Sync {
	fn begin_cascade(&self);
	fn end_cascade(&self);
}

/// Observer of vocab list membership.
pub trait VocabListObserver: Send + Sync {
	fn ve_inserted(&self, ve_id: DbId, kind: VeKind);
	fn ve_deleted(&self, ve_id: DbId, kind: VeKind);
}

/// Handle returned by external listener registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	pub fn raw(self) -> u64 {
		self.0
	}
}

/// Registration-ordered set of external observers.
pub struct ObserverSet<T: ?Sized> {
	entries: Vec<(ListenerHandle, Arc<T>)>,
}

impl<T: ?Sized> Default for ObserverSet<T> {
	fn default() -> Self {
		Self {
			entries: Vec::new(),
		}
	}
}

impl<T: ?Sized> fmt::Debug for ObserverSet<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.entries.iter().map(|(handle, _)| handle.0))
			.finish()
	}
}

impl<T: ?Sized> ObserverSet<T> {
	pub fn register(&mut self, observer: Arc<T>) -> ListenerHandle {
		let handle = ListenerHandle::next();
		self.entries.push((handle, observer));
		handle
	}

	/// Removes the observer behind `handle`. `owner` only labels the error.
	pub fn deregister(&mut self, owner: DbId, handle: ListenerHandle) -> DbResult<()> {
		let pos = self
			.entries
			.iter()
			.position(|(h, _)| *h == handle)
			.ok_or(SystemError::ListenerNotRegistered {
				target: owner,
				listener: handle.0,
			})?;
		self.entries.remove(pos);
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Observers in registration order, cloned so delivery can't alias the set.
	pub fn snapshot(&self) -> Vec<Arc<T>> {
		self.entries.iter().map(|(_, obs)| Arc::clone(obs)).collect()
	}
}

/// Registers `id` in `list`, requiring it to resolve through the index.
pub(crate) fn register_internal_id(
	list: &mut Vec<DbId>,
	owner: DbId,
	id: DbId,
	idx: &DbIndex,
) -> DbResult<()> {
	idx.get_element(id)?;
	if list.contains(&id) {
		return Err(SystemError::ListenerAlreadyRegistered {
			target: owner,
			listener: id.raw(),
		}
		.into());
	}
	list.push(id);
	Ok(())
}

pub(crate) fn deregister_internal_id(list: &mut Vec<DbId>, owner: DbId, id: DbId) -> DbResult<()> {
	let pos = list
		.iter()
		.position(|l| *l == id)
		.ok_or(SystemError::ListenerNotRegistered {
			target: owner,
			listener: id.raw(),
		})?;
	list.remove(pos);
	Ok(())
}

/// Listener set owned by one vocab element.
#[derive(Debug, Default)]
pub struct VeListeners {
	ve_id: DbId,
	internal: Vec<DbId>,
	external: ObserverSet<dyn VeObserver>,
	noted: Option<VeChange>,
}

impl VeListeners {
	pub fn new(ve_id: DbId) -> Self {
		Self {
			ve_id,
			..Self::default()
		}
	}

	#[inline]
	pub fn ve_id(&self) -> DbId {
		self.ve_id
	}

	/// Internal listener ids in registration order.
	#[inline]
	pub fn internal(&self) -> &[DbId] {
		&self.internal
	}

	pub fn num_external(&self) -> usize {
		self.external.len()
	}

	pub fn register_internal(&mut self, id: DbId, idx: &DbIndex) -> DbResult<()> {
		register_internal_id(&mut self.internal, self.ve_id, id, idx)
	}

	pub fn deregister_internal(&mut self, id: DbId) -> DbResult<()> {
		deregister_internal_id(&mut self.internal, self.ve_id, id)
	}

	pub fn register_external(&mut self, observer: Arc<dyn VeObserver>) -> ListenerHandle {
		self.external.register(observer)
	}

	pub fn deregister_external(&mut self, handle: ListenerHandle) -> DbResult<()> {
		self.external.deregister(self.ve_id, handle)
	}

	/// Diffs `old` against `new` and keeps the result for delivery.
	///
	/// Returns `false`, noting nothing, when the edit changes nothing listeners care about.
	pub fn note_change(
		&mut self,
		old: &VocabElement,
		new: &VocabElement,
		idx: &DbIndex,
	) -> DbResult<bool> {
		if self.noted.is_some() {
			return Err(SystemError::ChangeAlreadyNoted(self.ve_id).into());
		}
		let change = VeChange::compute(old, new, idx)?;
		if !change.is_noteworthy() {
			return Ok(false);
		}
		tracing::trace!(
			ve = %self.ve_id,
			name_changed = change.name_changed,
			args_changed = change.args.changed,
			"noted vocab element change"
		);
		self.noted = Some(change);
		Ok(true)
	}

	pub fn noted_change(&self) -> Option<&VeChange> {
		self.noted.as_ref()
	}

	pub fn notify_external_of_change(&self) -> DbResult<()> {
		let change = self
			.noted
			.as_ref()
			.ok_or(SystemError::NoChangesNoted(self.ve_id))?;
		for observer in self.external.snapshot() {
			observer.ve_changed(change);
		}
		Ok(())
	}

	pub fn notify_external_of_deletion(&self) {
		for observer in self.external.snapshot() {
			observer.ve_deleted(self.ve_id);
		}
	}

	pub fn discard_change_notes(&mut self) {
		self.noted = None;
	}
}

#[cfg(test)]
mod tests;
