use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::error::DbError;
use crate::farg::FormalArgument;
use crate::index::DbElement;

#[derive(Default)]
struct Recorder {
	events: Mutex<Vec<String>>,
}

impl VeObserver for Recorder {
	fn ve_changed(&self, change: &VeChange) {
		self.events
			.lock()
			.push(format!("changed {} -> {}", change.old_name, change.new_name));
	}

	fn ve_deleted(&self, ve_id: DbId) {
		self.events.lock().push(format!("deleted {ve_id}"));
	}
}

impl CascadeObserver for Recorder {
	fn begin_cascade(&self) {
		self.events.lock().push("begin".into());
	}

	fn end_cascade(&self) {
		self.events.lock().push("end".into());
	}
}

/// A predicate element with its arguments indexed.
fn indexed_pve(idx: &mut DbIndex, name: &str, args: &[&str]) -> VocabElement {
	let mut ve = VocabElement::predicate(name).unwrap();
	for arg in args {
		ve.append_formal_arg(FormalArgument::untyped(*arg).unwrap(), false)
			.unwrap();
	}
	let id = idx.add_element(DbElement::VocabElement(VeKind::Predicate));
	ve.set_id(id);
	for farg in ve.fargs_mut() {
		idx.add_formal_arg(farg).unwrap();
	}
	ve
}

/// A second note before delivery is rejected.
#[test]
fn test_second_note_is_rejected() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a>"]);
	let mut new = old.clone();
	new.set_name("q").unwrap();

	let mut listeners = VeListeners::new(old.id());
	assert!(listeners.note_change(&old, &new, &idx).unwrap());
	assert_eq!(
		listeners.note_change(&old, &new, &idx),
		Err(DbError::System(SystemError::ChangeAlreadyNoted(old.id())))
	);
	listeners.discard_change_notes();
	assert!(listeners.note_change(&old, &new, &idx).unwrap());
}

/// Delivering without a noted change fails; an edit with no visible effect notes nothing.
#[test]
fn test_notify_without_note_fails() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a>"]);
	let mut listeners = VeListeners::new(old.id());
	assert_eq!(
		listeners.notify_external_of_change(),
		Err(DbError::System(SystemError::NoChangesNoted(old.id())))
	);
	assert!(!listeners.note_change(&old, &old.clone(), &idx).unwrap());
	assert!(listeners.notify_external_of_change().is_err());
}

/// External observers hear changes and deletions in registration order.
#[test]
fn test_external_delivery() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a>"]);
	let mut new = old.clone();
	new.set_name("q").unwrap();

	let recorder = Arc::new(Recorder::default());
	let mut listeners = VeListeners::new(old.id());
	let handle = listeners.register_external(recorder.clone());
	listeners.note_change(&old, &new, &idx).unwrap();
	listeners.notify_external_of_change().unwrap();
	listeners.notify_external_of_deletion();
	assert_eq!(
		*recorder.events.lock(),
		vec!["changed p -> q".to_owned(), format!("deleted {}", old.id())]
	);

	listeners.deregister_external(handle).unwrap();
	assert_eq!(listeners.num_external(), 0);
	assert!(listeners.deregister_external(handle).is_err());
}

/// Internal registration requires a live id and rejects duplicates.
#[test]
fn test_internal_registration() {
	let mut idx = DbIndex::new();
	let col = idx.add_element(DbElement::Column);
	let mut listeners = VeListeners::new(DbId::new(99));
	listeners.register_internal(col, &idx).unwrap();
	assert!(listeners.register_internal(col, &idx).is_err());
	assert!(listeners.register_internal(DbId::new(12345), &idx).is_err());
	assert_eq!(listeners.internal(), &[col]);
	listeners.deregister_internal(col).unwrap();
	assert!(listeners.deregister_internal(col).is_err());
}

/// Remove `<a1>`, append `<a2>`: the old slot is deleted, the new one inserted.
#[test]
fn test_arg_list_change_delete_and_insert() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a1>"]);
	let mut new = old.clone();
	new.append_formal_arg(FormalArgument::untyped("<a2>").unwrap(), false)
		.unwrap();
	new.delete_formal_arg(0, false).unwrap();
	for farg in new.fargs_mut() {
		if !farg.id().is_valid() {
			idx.add_formal_arg(farg).unwrap();
		}
	}

	let change = ArgListChange::compute(old.fargs(), new.fargs(), &idx).unwrap();
	assert!(change.changed);
	assert_eq!(change.deleted, vec![true]);
	assert_eq!(change.inserted, vec![true]);
	assert_eq!(change.o2n, vec![None]);
	assert_eq!(change.n2o, vec![None]);
}

/// Reordering remaps indices and flags renames per new position.
#[test]
fn test_arg_list_change_reorder_and_rename() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a>", "<b>", "<c>"]);
	let mut new = old.clone();
	let c = new.delete_formal_arg(2, false).unwrap();
	new.insert_formal_arg(c, 0, false).unwrap();
	let mut b = new.farg(2).unwrap().clone();
	b.set_name("<bee>").unwrap();
	new.replace_formal_arg(b, 2, false).unwrap();

	let change = ArgListChange::compute(old.fargs(), new.fargs(), &idx).unwrap();
	assert_eq!(change.n2o, vec![Some(2), Some(0), Some(1)]);
	assert_eq!(change.o2n, vec![Some(1), Some(2), Some(0)]);
	assert_eq!(change.name_changed, vec![false, false, true]);
	assert_eq!(change.inserted, vec![false; 3]);
	assert_eq!(change.deleted, vec![false; 3]);
}

/// Duplicate ids in the new list are rejected.
#[test]
fn test_arg_list_change_rejects_duplicate_ids() {
	let mut idx = DbIndex::new();
	let old = indexed_pve(&mut idx, "p", &["<a>"]);
	let dup = vec![old.fargs()[0].clone(), old.fargs()[0].clone()];
	assert_eq!(
		ArgListChange::compute(old.fargs(), &dup, &idx),
		Err(DbError::System(SystemError::DuplicateArgId(old.fargs()[0].id())))
	);
}

/// Nested brackets count depth; only the outermost reports.
#[test]
fn test_cascade_depth() {
	let recorder = Arc::new(Recorder::default());
	let mut cascade = CascadeListeners::new();
	cascade.register_external(recorder.clone());
	assert!(cascade.enter());
	assert!(!cascade.enter());
	assert_eq!(cascade.depth(), 2);
	assert!(!cascade.exit().unwrap());
	assert!(cascade.exit().unwrap());
	assert!(!cascade.in_cascade());
	assert_eq!(
		cascade.exit(),
		Err(DbError::System(SystemError::CascadeUnderflow))
	);
}

proptest! {
	/// `n2o` and `o2n` are mutual inverses wherever both sides are present.
	#[test]
	fn prop_remaps_are_inverse(keep in prop::collection::vec(any::<bool>(), 1..8), extra in 0usize..4, seed in any::<u64>()) {
		let mut idx = DbIndex::new();
		let names: Vec<String> = (0..keep.len()).map(|i| format!("<o{i}>")).collect();
		let refs: Vec<&str> = names.iter().map(String::as_str).collect();
		let old = indexed_pve(&mut idx, "p", &refs);

		let mut new_args: Vec<FormalArgument> = old
			.fargs()
			.iter()
			.zip(&keep)
			.filter(|(_, keep)| **keep)
			.map(|(farg, _)| farg.clone())
			.collect();
		for i in 0..extra {
			let mut farg = FormalArgument::untyped(format!("<n{i}>")).unwrap();
			idx.add_formal_arg(&mut farg).unwrap();
			new_args.push(farg);
		}
		// Deterministic shuffle.
		let len = new_args.len();
		if len > 1 {
			let mut s = seed;
			for i in (1..len).rev() {
				s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
				new_args.swap(i, (s >> 33) as usize % (i + 1));
			}
		}

		let change = ArgListChange::compute(old.fargs(), &new_args, &idx).unwrap();
		for (j, o) in change.n2o.iter().enumerate() {
			if let Some(i) = o {
				prop_assert_eq!(change.o2n[*i], Some(j));
			}
		}
		for (i, n) in change.o2n.iter().enumerate() {
			if let Some(j) = n {
				prop_assert_eq!(change.n2o[*j], Some(i));
			}
			prop_assert_eq!(change.deleted[i], n.is_none());
		}
		prop_assert_eq!(change.deleted.iter().filter(|d| !**d).count(), keep.iter().filter(|k| **k).count());
	}
}
