//! Identifier index: the arena every cross-reference resolves through.
//!
//! # Role
//!
//! Allocates [`DbId`]s and maps each live id to a [`DbElement`]. Formal arguments are stored
//! by value (the index copy is what data values resolve against); other entries record the
//! element's kind and owner so listeners can be routed without native references.
//!
//! # Invariants
//!
//! - Ids are allocated monotonically and never reused.
//!   - Enforced in: [`DbIndex::add_element`].
//!   - Tested by: `index::tests::test_ids_never_reused`
//!   - Failure symptom: a stale handle silently resolves to a newer element.
//!
//! - A formal argument obtains its id once, on first insertion.
//!   - Enforced in: [`DbIndex::add_formal_arg`] (rejects an argument that already has an id).
//!   - Tested by: `index::tests::test_formal_arg_id_assigned_once`
//!   - Failure symptom: two slots share an id and diffing pairs the wrong arguments.

use annota_primitives::DbId;
use rustc_hash::FxHashMap as HashMap;

use crate::error::{DbResult, SystemError};
use crate::farg::FormalArgument;
use crate::vocab::VeKind;

/// An entry in the identifier index.
#[derive(Debug, Clone, PartialEq)]
pub enum DbElement {
	/// Indexed copy of a formal argument.
	FormalArg(FormalArgument),
	/// A vocab element; the element itself lives in the vocab list.
	VocabElement(VeKind),
	Column,
	Cell { column: DbId },
	/// A data value stored in a cell (possibly nested).
	DataValue { cell: DbId },
	/// The body of a nested predicate or column predicate value.
	PredicateBody { cell: DbId },
}

impl DbElement {
	/// Short kind label used in error messages.
	pub fn kind_name(&self) -> &'static str {
		match self {
			DbElement::FormalArg(_) => "formal argument",
			DbElement::VocabElement(VeKind::Matrix) => "matrix vocab element",
			DbElement::VocabElement(VeKind::Predicate) => "predicate vocab element",
			DbElement::Column => "column",
			DbElement::Cell { .. } => "cell",
			DbElement::DataValue { .. } => "data value",
			DbElement::PredicateBody { .. } => "predicate",
		}
	}
}

/// Id allocator and element map.
#[derive(Debug)]
pub struct DbIndex {
	next_id: u64,
	elements: HashMap<DbId, DbElement>,
}

impl Default for DbIndex {
	fn default() -> Self {
		Self::new()
	}
}

impl DbIndex {
	pub fn new() -> Self {
		Self {
			next_id: DbId::INVALID.raw() + 1,
			elements: HashMap::default(),
		}
	}

	/// Stores `element` under a fresh id.
	pub fn add_element(&mut self, element: DbElement) -> DbId {
		let id = DbId::new(self.next_id);
		self.next_id += 1;
		tracing::trace!(%id, kind = element.kind_name(), "index insert");
		self.elements.insert(id, element);
		id
	}

	/// Assigns `farg` a fresh id and stores a copy of it.
	pub fn add_formal_arg(&mut self, farg: &mut FormalArgument) -> DbResult<DbId> {
		if farg.id().is_valid() {
			return Err(SystemError::AlreadyIndexed(farg.id()).into());
		}
		let id = DbId::new(self.next_id);
		self.next_id += 1;
		farg.set_id(id);
		tracing::trace!(%id, name = farg.name(), "index insert formal argument");
		self.elements.insert(id, DbElement::FormalArg(farg.clone()));
		Ok(id)
	}

	#[inline]
	pub fn in_index(&self, id: DbId) -> bool {
		self.elements.contains_key(&id)
	}

	pub fn get_element(&self, id: DbId) -> DbResult<&DbElement> {
		if !id.is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		self.elements
			.get(&id)
			.ok_or_else(|| SystemError::NotFound(id).into())
	}

	/// Resolves `id` to its indexed formal argument.
	pub fn formal_arg(&self, id: DbId) -> DbResult<&FormalArgument> {
		match self.get_element(id)? {
			DbElement::FormalArg(farg) => Ok(farg),
			other => Err(SystemError::KindMismatch {
				id,
				expected: "formal argument",
				found: other.kind_name(),
			}
			.into()),
		}
	}

	/// Swaps the element stored under `id`. The replacement must be of the same kind.
	pub fn replace_element(&mut self, id: DbId, element: DbElement) -> DbResult<()> {
		let slot = match self.elements.get_mut(&id) {
			Some(slot) => slot,
			None if !id.is_valid() => return Err(SystemError::InvalidId.into()),
			None => return Err(SystemError::NotFound(id).into()),
		};
		if std::mem::discriminant(slot) != std::mem::discriminant(&element) {
			return Err(SystemError::KindMismatch {
				id,
				expected: slot.kind_name(),
				found: element.kind_name(),
			}
			.into());
		}
		tracing::trace!(%id, kind = element.kind_name(), "index replace");
		*slot = element;
		Ok(())
	}

	/// Replaces the indexed copy of an already indexed formal argument.
	pub fn replace_formal_arg(&mut self, farg: &FormalArgument) -> DbResult<()> {
		self.replace_element(farg.id(), DbElement::FormalArg(farg.clone()))
	}

	pub fn remove_element(&mut self, id: DbId) -> DbResult<DbElement> {
		if !id.is_valid() {
			return Err(SystemError::InvalidId.into());
		}
		let element = self
			.elements
			.remove(&id)
			.ok_or(SystemError::NotFound(id))?;
		tracing::trace!(%id, kind = element.kind_name(), "index remove");
		Ok(element)
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Ids of every live element, in ascending order.
	pub fn ids(&self) -> Vec<DbId> {
		let mut ids: Vec<_> = self.elements.keys().copied().collect();
		ids.sort_unstable();
		ids
	}
}

#[cfg(test)]
mod tests;
