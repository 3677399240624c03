use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::error::DbError;

fn names(fargs: &[FormalArgument]) -> Vec<&str> {
	fargs.iter().map(FormalArgument::name).collect()
}

/// A two-argument matrix has five column-predicate slots; slots 3 and 4 mirror arguments 0 and 1.
#[test]
fn test_matrix_cp_list_mirrors_args() {
	let mut ve = VocabElement::matrix("trial", MatrixType::Matrix, 60).unwrap();
	ve.append_formal_arg(FormalArgument::integer("<count>").unwrap(), false)
		.unwrap();
	ve.append_formal_arg(FormalArgument::nominal("<label>").unwrap(), false)
		.unwrap();

	assert_eq!(ve.num_fargs(), 2);
	assert_eq!(ve.num_cp_fargs(), 5);
	assert_eq!(
		names(ve.cp_fargs()),
		vec!["<ord>", "<onset>", "<offset>", "<count>", "<label>"]
	);
	assert!(args_equivalent(&ve.fargs()[0], ve.cp_farg(3).unwrap()));
	assert!(args_equivalent(&ve.fargs()[1], ve.cp_farg(4).unwrap()));
	ve.check_cp_invariant().unwrap();
}

/// Insert, replace, and delete keep the column-predicate list in step.
#[test]
fn test_matrix_edits_track_cp_list() {
	let mut ve = VocabElement::matrix("trial", MatrixType::Matrix, 60).unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<c>").unwrap(), false)
		.unwrap();
	ve.insert_formal_arg(FormalArgument::float("<b>").unwrap(), 1, false)
		.unwrap();
	assert_eq!(
		names(ve.cp_fargs()),
		vec!["<ord>", "<onset>", "<offset>", "<a>", "<b>", "<c>"]
	);

	let old = ve
		.replace_formal_arg(FormalArgument::quote_string("<z>").unwrap(), 0, false)
		.unwrap();
	assert_eq!(old.name(), "<a>");
	assert_eq!(ve.cp_farg(3).unwrap().farg_type(), FargType::QuoteString);

	let removed = ve.delete_formal_arg(1, false).unwrap();
	assert_eq!(removed.name(), "<b>");
	assert_eq!(names(ve.fargs()), vec!["<z>", "<c>"]);
	ve.check_cp_invariant().unwrap();
}

/// Built-in elements refuse user edits but accept system edits.
#[test]
fn test_system_element_rejects_user_edit() {
	let mut ve = VocabElement::predicate("and").unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<arg1>").unwrap(), false)
		.unwrap();
	ve.set_system().unwrap();

	let err = ve
		.append_formal_arg(FormalArgument::untyped("<arg2>").unwrap(), false)
		.unwrap_err();
	assert!(matches!(err, DbError::System(SystemError::SystemElement(_))));
	assert!(ve.set_var_len(true).is_err());

	ve.append_formal_arg(FormalArgument::untyped("<arg2>").unwrap(), true)
		.unwrap();
	assert_eq!(ve.num_fargs(), 2);
}

/// Non-`Matrix` types produce a system element with one argument of the fixed type.
#[test]
fn test_typed_matrix_is_system_with_fixed_arg() {
	let ve = VocabElement::matrix("count", MatrixType::Integer, 60).unwrap();
	assert!(ve.system());
	assert_eq!(ve.num_fargs(), 1);
	assert_eq!(ve.fargs()[0].name(), DEFAULT_ARG_NAME);
	assert_eq!(ve.fargs()[0].farg_type(), FargType::Integer);
	assert_eq!(ve.num_cp_fargs(), 4);

	let mut ve = ve;
	let err = ve
		.replace_formal_arg(FormalArgument::float("<val>").unwrap(), 0, true)
		.unwrap_err();
	assert!(err.is_logic());
	ve.replace_formal_arg(FormalArgument::integer("<n>").unwrap(), 0, true)
		.unwrap();
	assert!(
		ve.append_formal_arg(FormalArgument::integer("<m>").unwrap(), true)
			.is_err()
	);
	assert!(VocabElement::matrix("u", MatrixType::Undefined, 60).is_err());
}

/// Text arguments only belong in text matrices.
#[test]
fn test_text_args_only_in_text_matrices() {
	let mut pve = VocabElement::predicate("p").unwrap();
	let err = pve
		.append_formal_arg(FormalArgument::text("<t>").unwrap(), false)
		.unwrap_err();
	assert!(matches!(err, DbError::Logic(LogicError::IllegalArgType { .. })));

	let mut mve = VocabElement::matrix("m", MatrixType::Matrix, 60).unwrap();
	assert!(
		mve.append_formal_arg(FormalArgument::text("<t>").unwrap(), false)
			.is_err()
	);

	let tve = VocabElement::matrix("notes", MatrixType::Text, 60).unwrap();
	assert_eq!(tve.fargs()[0].farg_type(), FargType::Text);
}

/// Argument names are unique, including against the fixed column-predicate slots.
#[test]
fn test_arg_names_unique() {
	let mut ve = VocabElement::matrix("m", MatrixType::Matrix, 60).unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	let dup = ve
		.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap_err();
	assert_eq!(dup, DbError::Logic(LogicError::DuplicateArgName("<a>".into())));
	assert!(
		ve.append_formal_arg(FormalArgument::untyped("<onset>").unwrap(), false)
			.is_err()
	);
	// Renaming a slot to its own name is fine.
	ve.replace_formal_arg(FormalArgument::integer("<a>").unwrap(), 0, false)
		.unwrap();
	assert!(!ve.farg_name_is_unique("<a>"));
	assert!(ve.farg_name_is_unique("<b>"));
}

/// Predicate and matrix names follow their own grammars.
#[test]
fn test_name_grammars_per_kind() {
	assert!(VocabElement::predicate("foo").is_ok());
	assert!(VocabElement::predicate("foo bar").is_err());
	assert!(VocabElement::predicate("<foo>").is_err());
	assert!(VocabElement::matrix("trial one", MatrixType::Matrix, 60).is_ok());
	assert!(VocabElement::matrix(" lead", MatrixType::Matrix, 60).is_err());

	let mut ve = VocabElement::predicate("foo").unwrap();
	assert!(ve.set_name("bad,name").is_err());
	ve.set_name("baz").unwrap();
	assert_eq!(ve.name(), "baz");
}

/// The last argument of an element can't be deleted.
#[test]
fn test_delete_last_arg_rejected() {
	let mut ve = VocabElement::predicate("p").unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	assert_eq!(ve.delete_formal_arg(0, false), Err(DbError::Logic(LogicError::NoArguments)));
	assert!(ve.delete_formal_arg(3, false).is_err());
}

#[derive(Debug, Clone)]
enum Edit {
	Append(u8),
	Insert(usize, u8),
	Replace(usize, u8),
	Delete(usize),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
	prop_oneof![
		(0u8..4).prop_map(Edit::Append),
		(0usize..8, 0u8..4).prop_map(|(n, t)| Edit::Insert(n, t)),
		(0usize..8, 0u8..4).prop_map(|(n, t)| Edit::Replace(n, t)),
		(0usize..8).prop_map(Edit::Delete),
	]
}

fn arg_of(tag: u8, name: &str) -> FormalArgument {
	match tag {
		0 => FormalArgument::untyped(name),
		1 => FormalArgument::integer(name),
		2 => FormalArgument::nominal(name),
		_ => FormalArgument::predicate(name),
	}
	.unwrap()
}

proptest! {
	/// Whatever sequence of edits is applied, rejected or not, the column-predicate list
	/// stays `n + 3` long and mirrors the regular list.
	#[test]
	fn prop_cp_invariant_survives_edits(edits in prop::collection::vec(arb_edit(), 0..24)) {
		let mut ve = VocabElement::matrix("m", MatrixType::Matrix, 30).unwrap();
		ve.append_formal_arg(FormalArgument::untyped("<a0>").unwrap(), false).unwrap();
		for (i, edit) in edits.into_iter().enumerate() {
			let name = format!("<a{}>", i + 1);
			let _ = match edit {
				Edit::Append(t) => ve.append_formal_arg(arg_of(t, &name), false),
				Edit::Insert(n, t) => ve.insert_formal_arg(arg_of(t, &name), n, false),
				Edit::Replace(n, t) => ve.replace_formal_arg(arg_of(t, &name), n, false).map(|_| ()),
				Edit::Delete(n) => ve.delete_formal_arg(n, false).map(|_| ()),
			};
			prop_assert!(ve.check_cp_invariant().is_ok());
			prop_assert_eq!(ve.num_cp_fargs(), ve.num_fargs() + CP_FIXED_ARGS);
		}
	}
}
