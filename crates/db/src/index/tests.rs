use pretty_assertions::assert_eq;

use super::*;
use crate::error::DbError;

/// Removed ids are never handed out again.
#[test]
fn test_ids_never_reused() {
	let mut idx = DbIndex::new();
	let a = idx.add_element(DbElement::Column);
	let b = idx.add_element(DbElement::Cell { column: a });
	idx.remove_element(b).unwrap();
	let c = idx.add_element(DbElement::Column);
	assert!(c > b);
	assert!(!idx.in_index(b));
	assert_eq!(idx.ids(), vec![a, c]);
	assert_eq!(
		idx.get_element(b),
		Err(DbError::System(SystemError::NotFound(b)))
	);
}

/// A formal argument gets an id on first insertion only.
#[test]
fn test_formal_arg_id_assigned_once() {
	let mut idx = DbIndex::new();
	let mut farg = FormalArgument::untyped("<a>").unwrap();
	let id = idx.add_formal_arg(&mut farg).unwrap();
	assert_eq!(farg.id(), id);
	assert_eq!(idx.formal_arg(id).unwrap(), &farg);
	assert_eq!(
		idx.add_formal_arg(&mut farg),
		Err(DbError::System(SystemError::AlreadyIndexed(id)))
	);
	assert_eq!(farg.id(), id);
}

/// Replacement keeps the id and requires the same element kind.
#[test]
fn test_replace_requires_same_kind() {
	let mut idx = DbIndex::new();
	let mut farg = FormalArgument::untyped("<a>").unwrap();
	let id = idx.add_formal_arg(&mut farg).unwrap();

	farg.set_name("<b>").unwrap();
	idx.replace_formal_arg(&farg).unwrap();
	assert_eq!(idx.formal_arg(id).unwrap().name(), "<b>");

	let err = idx.replace_element(id, DbElement::Column).unwrap_err();
	assert!(matches!(err, DbError::System(SystemError::KindMismatch { .. })));
	assert!(idx.formal_arg(DbId::INVALID).is_err());
}

/// Lookups of the wrong kind fail explicitly.
#[test]
fn test_formal_arg_lookup_checks_kind() {
	let mut idx = DbIndex::new();
	let col = idx.add_element(DbElement::Column);
	assert_eq!(
		idx.formal_arg(col),
		Err(DbError::System(SystemError::KindMismatch {
			id: col,
			expected: "formal argument",
			found: "column",
		}))
	);
	assert_eq!(idx.len(), 1);
	idx.remove_element(col).unwrap();
	assert!(idx.is_empty());
	assert!(idx.remove_element(col).is_err());
}
