//! The database facade.
//!
//! # Role
//!
//! [`Database`] owns the identifier index, the vocab list, the cascade counter and the
//! minimal column/cell storage. Every schema edit goes through it so that one edit is always
//! bracketed by a cascade and its listeners are told about it exactly once.
//!
//! # Mental Model
//!
//! ```text
//! replace_pred_ve(new)
//!   └─ cascade() ─────────────────────────────┐  outermost begin: internal, then external
//!        vocab_list.replace_element  (notes)   │
//!        dispatch_change                        │
//!          ├─ columns: rename, rearrange cells  │  internal listeners
//!          ├─ predicate bodies: per cell, once  │
//!          ├─ external observers                │
//!          └─ discard note                      │
//!   └─ guard dropped ─────────────────────────┘  outermost end: internal, then external
//! ```
//!
//! Internal listeners are ids resolved through the index at delivery time; nothing holds a
//! native reference to another element. External observers are called with the database
//! mutably borrowed, so they record what they hear and act after the call returns.
//!
//! # Key Types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`Database`] | Registry plus storage | One per document | [`Database::new`] |
//! | [`CascadeGuard`] | Open cascade bracket | Ends the bracket on drop | [`Database::cascade`] |
//! | [`SharedDatabase`] | Mutex-guarded handle | All access under the lock | [`Database::into_shared`] |
//!
//! # Invariants
//!
//! - Every schema edit runs inside a cascade and ends it on every path.
//!   - Enforced in: [`Database::cascade`], `Drop for CascadeGuard`.
//!   - Tested by: `database::tests::test_failed_edit_still_ends_cascade`
//!   - Failure symptom: observers never hear "settled" and keep deferring work.
//!
//! - A noted change is delivered to internal listeners before external ones, then discarded.
//!   - Enforced in: `Database::dispatch_change`.
//!   - Tested by: `database::tests::test_change_delivered_once`
//!   - Failure symptom: observers read cells that still hold pre-edit values.
//!
//! - Each cell is updated at most once per change, however many nested predicates it holds.
//!   - Enforced in: `Database::dispatch_change` (cell set deduplicated).
//!   - Tested by: `database::tests::test_nested_predicates_follow_definition`
//!   - Failure symptom: a second rearrangement against an already rearranged list fails.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use annota_primitives::{DbId, TimeStamp};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::column::{DataCell, DataColumn};
use crate::error::{DbResult, SystemError};
use crate::farg::FormalArgument;
use crate::index::DbIndex;
use crate::listeners::{CascadeListeners, CascadeObserver, ListenerHandle, VeObserver, VocabListObserver};
use crate::vocab::{VeKind, VocabElement};
use crate::vocab_list::VocabList;

mod cells;
mod notify;

/// Default tick rate for new databases.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;

/// Database handle shared across threads.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Vocabulary registry with its hosted columns and cells.
#[derive(Debug)]
pub struct Database {
	tps: u32,
	idx: DbIndex,
	vl: VocabList,
	cascade: CascadeListeners,
	columns: IndexMap<DbId, DataColumn>,
	cells: HashMap<DbId, DataCell>,
}

impl Database {
	pub fn new(tps: u32) -> DbResult<Self> {
		TimeStamp::zero(tps)?;
		Ok(Self {
			tps,
			idx: DbIndex::new(),
			vl: VocabList::new(),
			cascade: CascadeListeners::new(),
			columns: IndexMap::new(),
			cells: HashMap::default(),
		})
	}

	pub fn into_shared(self) -> SharedDatabase {
		Arc::new(Mutex::new(self))
	}

	/// Ticks per second for every time stamp in this database.
	#[inline]
	pub fn tps(&self) -> u32 {
		self.tps
	}

	#[inline]
	pub fn index(&self) -> &DbIndex {
		&self.idx
	}

	#[inline]
	pub fn vocab_list(&self) -> &VocabList {
		&self.vl
	}

	#[inline]
	pub fn cascade_depth(&self) -> u32 {
		self.cascade.depth()
	}

	/// Opens a cascade bracket that closes when the guard is dropped.
	pub fn cascade(&mut self) -> CascadeGuard<'_> {
		self.cascade_start();
		CascadeGuard { db: self }
	}

	/// Opens a cascade bracket. Pair with [`Database::cascade_end`], or prefer
	/// [`Database::cascade`].
	pub fn cascade_start(&mut self) {
		if !self.cascade.enter() {
			return;
		}
		for id in self.cascade.internal() {
			if let Some(column) = self.columns.get_mut(id) {
				column.begin_cascade();
			}
		}
		self.cascade.notify_external_begin();
	}

	/// Closes a cascade bracket. Only the outermost close reaches listeners.
	pub fn cascade_end(&mut self) -> DbResult<()> {
		if !self.cascade.exit()? {
			return Ok(());
		}
		for id in self.cascade.internal() {
			self.columns
				.get_mut(id)
				.ok_or(SystemError::NotFound(*id))?
				.end_cascade();
		}
		self.cascade.notify_external_end();
		Ok(())
	}

	pub fn register_cascade_listener(&mut self, observer: Arc<dyn CascadeObserver>) -> ListenerHandle {
		self.cascade.register_external(observer)
	}

	pub fn deregister_cascade_listener(&mut self, handle: ListenerHandle) -> DbResult<()> {
		self.cascade.deregister_external(handle)
	}

	pub fn register_internal_cascade_listener(&mut self, id: DbId) -> DbResult<()> {
		self.cascade.register_internal(id, &self.idx)
	}

	pub fn deregister_internal_cascade_listener(&mut self, id: DbId) -> DbResult<()> {
		self.cascade.deregister_internal(id)
	}

	pub fn register_vocab_list_observer(&mut self, observer: Arc<dyn VocabListObserver>) -> ListenerHandle {
		self.vl.register_observer(observer)
	}

	pub fn deregister_vocab_list_observer(&mut self, handle: ListenerHandle) -> DbResult<()> {
		self.vl.deregister_observer(handle)
	}

	pub fn register_ve_listener(&mut self, ve_id: DbId, observer: Arc<dyn VeObserver>) -> DbResult<ListenerHandle> {
		Ok(self.vl.listeners_mut(ve_id)?.register_external(observer))
	}

	pub fn deregister_ve_listener(&mut self, ve_id: DbId, handle: ListenerHandle) -> DbResult<()> {
		self.vl.listeners_mut(ve_id)?.deregister_external(handle)
	}

	pub fn register_internal_ve_listener(&mut self, ve_id: DbId, listener: DbId) -> DbResult<()> {
		self.vl
			.listeners_mut(ve_id)?
			.register_internal(listener, &self.idx)
	}

	pub fn deregister_internal_ve_listener(&mut self, ve_id: DbId, listener: DbId) -> DbResult<()> {
		self.vl.listeners_mut(ve_id)?.deregister_internal(listener)
	}

	pub fn get_vocab_element(&self, id: DbId) -> DbResult<&VocabElement> {
		self.vl.get(id)
	}

	pub fn get_vocab_element_by_name(&self, name: &str) -> Option<&VocabElement> {
		self.vl.get_by_name(name)
	}

	pub fn vocab_element_exists(&self, id: DbId) -> bool {
		self.vl.contains(id)
	}

	pub fn vocab_element_name_exists(&self, name: &str) -> bool {
		self.vl.name_in_use(name)
	}

	pub fn is_matrix(&self, id: DbId) -> DbResult<bool> {
		self.vl.is_matrix(id)
	}

	pub fn is_predicate(&self, id: DbId) -> DbResult<bool> {
		self.vl.is_predicate(id)
	}

	/// User-defined matrix elements.
	pub fn matrix_ves(&self) -> Vec<&VocabElement> {
		self.vl.matrix_ves()
	}

	/// User-defined predicate elements.
	pub fn pred_ves(&self) -> Vec<&VocabElement> {
		self.vl.pred_ves()
	}

	/// Registers a user-defined predicate.
	pub fn add_pred_ve(&mut self, ve: VocabElement) -> DbResult<DbId> {
		expect_kind(&ve, VeKind::Predicate)?;
		if ve.system() {
			return Err(SystemError::SystemElement(ve.id()).into());
		}
		let mut db = self.cascade();
		let this = &mut *db;
		this.vl.add_element(ve, &mut this.idx)
	}

	/// Registers a predicate as a system element, closing it to user edits.
	pub fn add_system_pred_ve(&mut self, mut ve: VocabElement) -> DbResult<DbId> {
		expect_kind(&ve, VeKind::Predicate)?;
		ve.set_system()?;
		let mut db = self.cascade();
		let this = &mut *db;
		this.vl.add_element(ve, &mut this.idx)
	}

	/// Appends an untyped `<argN>` argument to a variable-length predicate.
	///
	/// This is a system edit, so it also applies to system predicates. Returns the new
	/// argument's id.
	pub fn add_arg_to_pred_ve(&mut self, id: DbId) -> DbResult<DbId> {
		let mut ve = self.vl.get(id)?.clone();
		expect_kind(&ve, VeKind::Predicate)?;
		if !ve.var_len() {
			return Err(SystemError::NotVarLen(id).into());
		}
		let mut n = ve.num_fargs() + 1;
		let name = loop {
			let candidate = format!("<arg{n}>");
			if ve.farg_name_is_unique(&candidate) {
				break candidate;
			}
			n += 1;
		};
		ve.append_formal_arg(FormalArgument::untyped(name)?, true)?;
		self.replace_ve(ve, true)?;
		let ve = self.vl.get(id)?;
		ve.fargs()
			.last()
			.map(FormalArgument::id)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	/// Replaces a user-defined predicate with an edited copy.
	pub fn replace_pred_ve(&mut self, ve: VocabElement) -> DbResult<()> {
		expect_kind(&ve, VeKind::Predicate)?;
		self.replace_ve(ve, false)
	}

	/// Replaces a user-defined matrix element with an edited copy.
	pub fn replace_matrix_ve(&mut self, ve: VocabElement) -> DbResult<()> {
		expect_kind(&ve, VeKind::Matrix)?;
		self.replace_ve(ve, false)
	}

	/// Removes a user-defined predicate. Every nested reference to it is cleared first.
	pub fn remove_pred_ve(&mut self, id: DbId) -> DbResult<()> {
		let ve = self.vl.get(id)?;
		if ve.kind() == VeKind::Matrix {
			return Err(SystemError::BacksColumn(id).into());
		}
		if ve.system() {
			return Err(SystemError::SystemElement(id).into());
		}
		self.vl.check_removable(id, &self.idx)?;
		let mut db = self.cascade();
		let this = &mut *db;
		this.dispatch_deletion(id)?;
		this.vl.remove_element(id, &mut this.idx)?;
		Ok(())
	}

	fn replace_ve(&mut self, ve: VocabElement, allow_system: bool) -> DbResult<()> {
		let id = ve.id();
		let mut db = self.cascade();
		let this = &mut *db;
		if this.vl.replace_element(ve, &mut this.idx, allow_system)? {
			this.dispatch_change(id)?;
		}
		Ok(())
	}

	pub fn columns(&self) -> impl Iterator<Item = &DataColumn> {
		self.columns.values()
	}

	pub fn column(&self, id: DbId) -> DbResult<&DataColumn> {
		self.columns
			.get(&id)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	pub fn column_by_name(&self, name: &str) -> Option<&DataColumn> {
		self.columns.values().find(|column| column.name() == name)
	}

	pub fn cell(&self, id: DbId) -> DbResult<&DataCell> {
		self.cells
			.get(&id)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}
}

fn expect_kind(ve: &VocabElement, kind: VeKind) -> DbResult<()> {
	if ve.kind() != kind {
		return Err(SystemError::KindMismatch {
			id: ve.id(),
			expected: kind.label(),
			found: ve.kind().label(),
		}
		.into());
	}
	Ok(())
}

/// An open cascade bracket over a borrowed database.
///
/// Dereferences to the database; dropping the guard ends the bracket.
pub struct CascadeGuard<'a> {
	db: &'a mut Database,
}

impl Deref for CascadeGuard<'_> {
	type Target = Database;

	fn deref(&self) -> &Database {
		self.db
	}
}

impl DerefMut for CascadeGuard<'_> {
	fn deref_mut(&mut self) -> &mut Database {
		self.db
	}
}

impl Drop for CascadeGuard<'_> {
	fn drop(&mut self) {
		if let Err(err) = self.db.cascade_end() {
			tracing::error!(%err, "failed to end cascade");
		}
	}
}
