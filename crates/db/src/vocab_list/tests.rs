use pretty_assertions::assert_eq;

use super::*;
use crate::farg::FargKind;
use crate::vocab::MatrixType;

fn pve(name: &str, args: &[&str]) -> VocabElement {
	let mut ve = VocabElement::predicate(name).unwrap();
	for arg in args {
		ve.append_formal_arg(FormalArgument::untyped(*arg).unwrap(), false)
			.unwrap();
	}
	ve
}

fn setup() -> (VocabList, DbIndex) {
	(VocabList::new(), DbIndex::new())
}

/// Adding assigns ids to the element and every argument, and records the name.
#[test]
fn test_add_indexes_everything() {
	let (mut vl, mut idx) = setup();
	let mut mve = VocabElement::matrix("trial", MatrixType::Matrix, 60).unwrap();
	mve.append_formal_arg(FormalArgument::integer("<n>").unwrap(), false)
		.unwrap();
	let id = vl.add_element(mve, &mut idx).unwrap();

	let ve = vl.get(id).unwrap();
	assert_eq!(ve.id(), id);
	assert!(ve.fargs().iter().chain(ve.cp_fargs()).all(|farg| {
		farg.ve_id() == id && idx.formal_arg(farg.id()).is_ok_and(|indexed| indexed == farg)
	}));
	// element + one argument + four column-predicate arguments
	assert_eq!(idx.len(), 6);
	assert_eq!(vl.id_of("trial"), Some(id));
	assert!(vl.is_matrix(id).unwrap());
	assert!(!vl.is_predicate(id).unwrap());
	ve.check_cp_invariant().unwrap();
}

/// Matrices and predicates share one namespace; the first holder stays queryable.
#[test]
fn test_duplicate_name_rejected() {
	let (mut vl, mut idx) = setup();
	let first = vl.add_element(pve("foo", &["<a1>"]), &mut idx).unwrap();
	let err = vl.add_element(pve("foo", &["<a1>"]), &mut idx).unwrap_err();
	assert_eq!(err, DbError::Logic(LogicError::NameInUse("foo".into())));
	let err = vl
		.add_element(
			VocabElement::matrix("foo", MatrixType::Integer, 60).unwrap(),
			&mut idx,
		)
		.unwrap_err();
	assert!(err.is_logic());
	assert_eq!(vl.get_by_name("foo").map(VocabElement::id), Some(first));
	assert_eq!(vl.len(), 1);
}

/// Elements without arguments or with pre-assigned ids are refused.
#[test]
fn test_add_preflight() {
	let (mut vl, mut idx) = setup();
	let empty = VocabElement::predicate("empty").unwrap();
	assert_eq!(
		vl.add_element(empty, &mut idx),
		Err(DbError::Logic(LogicError::NoArguments))
	);

	let id = vl.add_element(pve("p", &["<a>"]), &mut idx).unwrap();
	let again = vl.get(id).unwrap().clone();
	assert!(vl.add_element(again, &mut idx).is_err());
	assert!(idx.len() == 2);
}

/// Replace keeps surviving ids, indexes new arguments, and drops vanished ones.
#[test]
fn test_replace_reconciles_index() {
	let (mut vl, mut idx) = setup();
	let id = vl.add_element(pve("p", &["<a1>", "<keep>"]), &mut idx).unwrap();
	let old = vl.get(id).unwrap().clone();
	let a1 = old.fargs()[0].id();
	let keep = old.fargs()[1].id();

	let mut new = old.clone();
	new.append_formal_arg(FormalArgument::untyped("<a2>").unwrap(), false)
		.unwrap();
	new.delete_formal_arg(0, false).unwrap();
	assert!(vl.replace_element(new, &mut idx, false).unwrap());

	let live = vl.get(id).unwrap();
	assert_eq!(live.fargs()[0].id(), keep);
	let a2 = live.fargs()[1].id();
	assert!(a2.is_valid());
	assert!(idx.in_index(a2));
	assert!(!idx.in_index(a1));

	let change = vl.listeners(id).unwrap().noted_change().unwrap();
	assert_eq!(change.args.deleted, vec![true, false]);
	assert_eq!(change.args.inserted, vec![false, true]);
	assert_eq!(change.args.n2o, vec![Some(1), None]);
}

/// A retyped or duplicated argument aborts the replace before anything changes.
#[test]
fn test_rejected_replace_leaves_state() {
	let (mut vl, mut idx) = setup();
	let id = vl.add_element(pve("p", &["<a>", "<b>"]), &mut idx).unwrap();
	let before = vl.get(id).unwrap().clone();
	let ids_before = idx.ids();

	let mut retyped = before.clone();
	retyped.append_formal_arg(FormalArgument::untyped("<c>").unwrap(), false)
		.unwrap();
	let a_id = before.fargs()[0].id();
	let mut swapped = FormalArgument::new("<a>", FargKind::Integer(crate::farg::Bounds {
		sub_range: false,
		min: 0,
		max: 1,
	}))
	.unwrap();
	swapped.set_id(a_id);
	swapped.set_ve_id(id);
	retyped.fargs_mut()[0] = swapped;
	assert!(matches!(
		vl.replace_element(retyped, &mut idx, false),
		Err(DbError::System(SystemError::ArgRetyped { .. }))
	));

	let mut duplicated = before.clone();
	let b_id = before.fargs()[1].id();
	duplicated.fargs_mut()[0].set_id(b_id);
	assert_eq!(
		vl.replace_element(duplicated, &mut idx, false),
		Err(DbError::System(SystemError::DuplicateArgId(b_id)))
	);

	let mut foreign = before.clone();
	foreign.fargs_mut()[0].set_id(DbId::new(4242));
	assert!(vl.replace_element(foreign, &mut idx, false).is_err());

	assert_eq!(vl.get(id).unwrap(), &before);
	assert_eq!(idx.ids(), ids_before);
	assert!(vl.listeners(id).unwrap().noted_change().is_none());
}

/// System elements are only replaced by system edits.
#[test]
fn test_system_replace_rejected() {
	let (mut vl, mut idx) = setup();
	let mut and = pve("and", &["<a>"]);
	and.set_system().unwrap();
	let id = vl.add_element(and, &mut idx).unwrap();

	let same = vl.get(id).unwrap().clone();
	assert_eq!(
		vl.replace_element(same.clone(), &mut idx, false),
		Err(DbError::System(SystemError::SystemElement(id)))
	);
	let mut renamed = same;
	renamed.set_name("all").unwrap();
	assert!(vl.replace_element(renamed, &mut idx, true).unwrap());
	assert_eq!(vl.id_of("all"), Some(id));
	assert_eq!(vl.id_of("and"), None);
}

/// Renaming onto a taken name or across kinds fails.
#[test]
fn test_replace_name_and_kind_checks() {
	let (mut vl, mut idx) = setup();
	let p = vl.add_element(pve("p", &["<a>"]), &mut idx).unwrap();
	vl.add_element(pve("q", &["<a>"]), &mut idx).unwrap();
	let mut renamed = vl.get(p).unwrap().clone();
	renamed.set_name("q").unwrap();
	assert_eq!(
		vl.replace_element(renamed, &mut idx, false),
		Err(DbError::Logic(LogicError::NameInUse("q".into())))
	);

	let mut mve = VocabElement::matrix("m", MatrixType::Matrix, 60).unwrap();
	mve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	mve.set_id(p);
	assert!(matches!(
		vl.replace_element(mve, &mut idx, false),
		Err(DbError::System(SystemError::KindMismatch { .. }))
	));
}

/// Removal drops the element, its name, and all of its arguments from the index.
#[test]
fn test_remove_cleans_index() {
	let (mut vl, mut idx) = setup();
	let mut mve = VocabElement::matrix("m", MatrixType::Matrix, 60).unwrap();
	mve.append_formal_arg(FormalArgument::untyped("<a>").unwrap(), false)
		.unwrap();
	let id = vl.add_element(mve, &mut idx).unwrap();
	vl.check_removable(id, &idx).unwrap();
	let removed = vl.remove_element(id, &mut idx).unwrap();
	assert_eq!(removed.name(), "m");
	assert!(idx.is_empty());
	assert!(!vl.name_in_use("m"));
	assert!(vl.remove_element(id, &mut idx).is_err());
}

/// Listings skip system elements.
#[test]
fn test_listings_skip_system() {
	let (mut vl, mut idx) = setup();
	vl.add_element(pve("user", &["<a>"]), &mut idx).unwrap();
	let mut sys = pve("sys", &["<a>"]);
	sys.set_system().unwrap();
	vl.add_element(sys, &mut idx).unwrap();
	vl.add_element(
		VocabElement::matrix("count", MatrixType::Integer, 60).unwrap(),
		&mut idx,
	)
	.unwrap();

	let names: Vec<_> = vl.pred_ves().iter().map(|ve| ve.name().to_owned()).collect();
	assert_eq!(names, vec!["user".to_owned()]);
	assert!(vl.matrix_ves().is_empty());
	assert_eq!(vl.iter().count(), 3);
}
