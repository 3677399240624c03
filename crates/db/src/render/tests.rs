use pretty_assertions::assert_eq;

use super::*;
use crate::database::DEFAULT_TICKS_PER_SECOND;
use crate::vocab::MatrixType;

/// Bounded integer arguments list their range after the common header.
#[test]
fn test_int_farg() {
	let mut farg = FormalArgument::integer("<n>").unwrap();
	farg.set_int_range(0, 10).unwrap();
	assert_eq!(
		farg.to_db_string(),
		"(IntFormalArg (id 0) (name <n>) (ve_id 0) (hidden false) (sub_range true) (min 0) (max 10))"
	);
}

/// Approved sets render sorted.
#[test]
fn test_nominal_farg() {
	let mut farg = FormalArgument::nominal("<who>").unwrap();
	farg.set_approved_nominals(["bob", "alice"]).unwrap();
	farg.set_hidden(true);
	assert_eq!(
		farg.to_db_string(),
		"(NominalFormalArg (id 0) (name <who>) (ve_id 0) (hidden true) (sub_range true) (approved (alice bob)))"
	);
}

/// An unset untyped value shows the slot name.
#[test]
fn test_undefined_value() {
	let value = FormalArgument::untyped("<u>").unwrap().construct_empty_arg();
	assert_eq!(
		value.to_db_string(),
		"(UndefinedDataValue (id 0) (farg_id 0) (farg_type UNTYPED) (cell_id 0) (value <u>))"
	);
}

/// Empty strings render as `<null>`.
#[test]
fn test_empty_nominal_value() {
	let value = FormalArgument::nominal("<who>").unwrap().construct_empty_arg();
	assert_eq!(
		value.to_db_string(),
		"(NominalDataValue (id 0) (farg_id 0) (farg_type NOMINAL) (cell_id 0) (value <null>) (sub_range false))"
	);
}

#[test]
fn test_float_value() {
	let mut farg = FormalArgument::float("<x>").unwrap();
	farg.set_float_range(0.0, 2.0).unwrap();
	let mut value = farg.construct_empty_arg();
	value.set_float(1.5).unwrap();
	assert_eq!(
		value.to_db_string(),
		"(FloatDataValue (id 0) (farg_id 0) (farg_type FLOAT) (cell_id 0) (value 1.5) (sub_range true) (min 0.0) (max 2.0))"
	);
}

/// The undefined predicate renders as id and vocab id only.
#[test]
fn test_undefined_predicate_value() {
	let value = FormalArgument::predicate("<p>").unwrap().construct_empty_arg();
	assert_eq!(
		value.to_db_string(),
		"(PredDataValue (id 0) (farg_id 0) (farg_type PREDICATE) (cell_id 0) (value (Predicate (id 0) (ve_id 0))) (sub_range false))"
	);
}

/// A registered predicate renders with the ids the index handed out.
#[test]
fn test_registered_predicate() {
	let mut db = Database::new(DEFAULT_TICKS_PER_SECOND).unwrap();
	let mut ve = VocabElement::predicate("foo").unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	let id = db.add_pred_ve(ve).unwrap();
	let ve = db.get_vocab_element(id).unwrap();
	let farg = ve.fargs()[0].id();
	assert_eq!(
		ve.to_db_string(),
		format!(
			"(PredicateVocabElement (id {id}) (name foo) (var_len false) (system false) \
			(fargs (UnTypedFormalArg (id {farg}) (name <a>) (ve_id {id}) (hidden false))))"
		)
	);
}

fn sample() -> Database {
	let mut db = Database::new(DEFAULT_TICKS_PER_SECOND).unwrap();
	let mut ve = VocabElement::predicate("foo").unwrap();
	ve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	let foo = db.add_pred_ve(ve).unwrap();
	let column = db.add_column("trial", MatrixType::Matrix).unwrap();
	let cell = db.insert_cell(column).unwrap();
	let mut args = db.cell_args(cell).unwrap().to_vec();
	let mut pred = db.new_predicate(foo).unwrap();
	pred.arg_mut(0).unwrap().set_int(3).unwrap();
	args[0].set_predicate(pred).unwrap();
	db.set_cell_value(cell, args).unwrap();
	db
}

/// A whole database renders every element, column, and cell, identically each time.
#[test]
fn test_database_rendering() {
	let rendered = sample().to_db_string();
	assert!(rendered.starts_with("(Database (tps 60) (vocab (PredicateVocabElement"));
	assert!(rendered.contains("(MatrixVocabElement"));
	assert!(rendered.contains("(name trial) (type MATRIX)"));
	assert!(rendered.contains("(cp_fargs (IntFormalArg"));
	assert!(rendered.contains("(columns (DataColumn"));
	assert!(rendered.contains("(cells (DataCell"));
	assert!(rendered.contains("(name foo) (var_len false)"));
	assert!(rendered.contains("(IntDataValue"));
	assert_eq!(rendered, sample().to_db_string());
}
