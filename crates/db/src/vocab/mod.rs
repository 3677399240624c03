//! Vocab elements: named, ordered formal-argument lists.
//!
//! # Role
//!
//! A [`VocabElement`] is the schema behind a nested predicate ([`VeKind::Predicate`]) or a
//! spreadsheet column ([`VeKind::Matrix`]). Matrix elements also carry a column-predicate
//! list: three fixed leading slots followed by a mirror of every regular argument.
//!
//! Elements are edited as detached copies and committed through the vocab list, which diffs
//! the copy against the live version by formal-argument id.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`VocabElement`] | Schema: name, flags, argument list(s). |
//! | [`VeKind`] | Matrix or predicate. |
//! | [`MatrixType`] | What a matrix column holds; non-`Matrix` types fix a single argument. |
//!
//! # Invariants
//!
//! - A matrix element has `num_cp_fargs == num_fargs + 3` and regular argument `i` mirrors
//!   column-predicate argument `i + 3`.
//!   - Enforced in: [`VocabElement::append_formal_arg`], [`VocabElement::insert_formal_arg`],
//!     [`VocabElement::replace_formal_arg`], [`VocabElement::delete_formal_arg`].
//!   - Tested by: `vocab::tests::test_matrix_cp_list_mirrors_args`,
//!     `vocab::tests::prop_cp_invariant_survives_edits`
//!   - Failure symptom: column predicates lose track of their columns' arguments.
//!
//! - A system element is only edited with `is_system_edit` set.
//!   - Enforced in: [`VocabElement::check_editable`].
//!   - Tested by: `vocab::tests::test_system_element_rejects_user_edit`
//!   - Failure symptom: built-in vocabulary drifts under user edits.

use annota_primitives::{DbId, grammar};
use serde::{Deserialize, Serialize};

use crate::error::{DbResult, LogicError, NameKind, SystemError};
use crate::farg::{DEFAULT_ARG_NAME, FargType, FormalArgument, args_equivalent};

/// Number of fixed leading slots in a column-predicate list.
pub const CP_FIXED_ARGS: usize = 3;

/// Flavor of a vocab element.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum VeKind {
	Matrix,
	Predicate,
}

impl VeKind {
	/// Label used in kind-mismatch errors.
	pub fn label(self) -> &'static str {
		match self {
			VeKind::Matrix => "matrix vocab element",
			VeKind::Predicate => "predicate vocab element",
		}
	}
}

/// Content type of a matrix column.
#[derive(
	Debug,
	Clone,
	Copy,
	Default,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	strum::Display,
	strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum MatrixType {
	Undefined,
	Text,
	Nominal,
	Integer,
	Float,
	Predicate,
	#[default]
	Matrix,
}

impl MatrixType {
	/// The argument type a single-argument matrix of this type holds.
	pub fn farg_type(self) -> Option<FargType> {
		match self {
			MatrixType::Text => Some(FargType::Text),
			MatrixType::Nominal => Some(FargType::Nominal),
			MatrixType::Integer => Some(FargType::Integer),
			MatrixType::Float => Some(FargType::Float),
			MatrixType::Predicate => Some(FargType::Predicate),
			MatrixType::Matrix | MatrixType::Undefined => None,
		}
	}

	fn fixed_arg(self) -> DbResult<Option<FormalArgument>> {
		Ok(Some(match self {
			MatrixType::Text => FormalArgument::text(DEFAULT_ARG_NAME)?,
			MatrixType::Nominal => FormalArgument::nominal(DEFAULT_ARG_NAME)?,
			MatrixType::Integer => FormalArgument::integer(DEFAULT_ARG_NAME)?,
			MatrixType::Float => FormalArgument::float(DEFAULT_ARG_NAME)?,
			MatrixType::Predicate => FormalArgument::predicate(DEFAULT_ARG_NAME)?,
			MatrixType::Matrix => return Ok(None),
			MatrixType::Undefined => return Err(SystemError::UndefinedMatrixType.into()),
		}))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MatrixPart {
	matrix_type: MatrixType,
	column_id: DbId,
	cp_fargs: Vec<FormalArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum VeFlavor {
	Predicate,
	Matrix(MatrixPart),
}

/// A schema: a named list of formal arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabElement {
	id: DbId,
	name: String,
	var_len: bool,
	system: bool,
	fargs: Vec<FormalArgument>,
	flavor: VeFlavor,
}

impl VocabElement {
	/// An empty predicate element. Arguments must be appended before registration.
	pub fn predicate(name: impl Into<String>) -> DbResult<Self> {
		let name = name.into();
		check_ve_name(VeKind::Predicate, &name)?;
		Ok(Self {
			id: DbId::INVALID,
			name,
			var_len: false,
			system: false,
			fargs: Vec::new(),
			flavor: VeFlavor::Predicate,
		})
	}

	/// A matrix element with its fixed column-predicate slots.
	///
	/// Any type other than [`MatrixType::Matrix`] yields a system element holding one `<val>`
	/// argument of the matching type. `tps` sets the rate of the `<onset>` / `<offset>` slots.
	pub fn matrix(name: impl Into<String>, matrix_type: MatrixType, tps: u32) -> DbResult<Self> {
		let name = name.into();
		check_ve_name(VeKind::Matrix, &name)?;
		let fixed = matrix_type.fixed_arg()?;
		let cp_fargs = vec![
			FormalArgument::integer("<ord>")?,
			FormalArgument::time_stamp("<onset>", tps)?,
			FormalArgument::time_stamp("<offset>", tps)?,
		];
		let mut ve = Self {
			id: DbId::INVALID,
			name,
			var_len: false,
			system: false,
			fargs: Vec::new(),
			flavor: VeFlavor::Matrix(MatrixPart {
				matrix_type,
				column_id: DbId::INVALID,
				cp_fargs,
			}),
		};
		if let Some(farg) = fixed {
			ve.append_formal_arg(farg, true)?;
			ve.system = true;
		}
		Ok(ve)
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> VeKind {
		match self.flavor {
			VeFlavor::Predicate => VeKind::Predicate,
			VeFlavor::Matrix(_) => VeKind::Matrix,
		}
	}

	#[inline]
	pub fn var_len(&self) -> bool {
		self.var_len
	}

	#[inline]
	pub fn system(&self) -> bool {
		self.system
	}

	/// Matrix type, or `None` for predicates.
	pub fn matrix_type(&self) -> Option<MatrixType> {
		match &self.flavor {
			VeFlavor::Matrix(m) => Some(m.matrix_type),
			VeFlavor::Predicate => None,
		}
	}

	/// Backing column, or `INVALID` for predicates and detached matrices.
	pub fn column_id(&self) -> DbId {
		match &self.flavor {
			VeFlavor::Matrix(m) => m.column_id,
			VeFlavor::Predicate => DbId::INVALID,
		}
	}

	pub fn set_name(&mut self, name: impl Into<String>) -> DbResult<()> {
		let name = name.into();
		check_ve_name(self.kind(), &name)?;
		self.name = name;
		Ok(())
	}

	pub fn set_var_len(&mut self, var_len: bool) -> DbResult<()> {
		self.check_editable(false)?;
		self.var_len = var_len;
		Ok(())
	}

	/// Marks the element built-in. It must already have arguments.
	pub fn set_system(&mut self) -> DbResult<()> {
		if self.fargs.is_empty() {
			return Err(LogicError::NoArguments.into());
		}
		self.system = true;
		Ok(())
	}

	#[inline]
	pub fn fargs(&self) -> &[FormalArgument] {
		&self.fargs
	}

	pub fn farg(&self, n: usize) -> Option<&FormalArgument> {
		self.fargs.get(n)
	}

	#[inline]
	pub fn num_fargs(&self) -> usize {
		self.fargs.len()
	}

	/// Column-predicate list; empty for predicates.
	pub fn cp_fargs(&self) -> &[FormalArgument] {
		match &self.flavor {
			VeFlavor::Matrix(m) => &m.cp_fargs,
			VeFlavor::Predicate => &[],
		}
	}

	pub fn cp_farg(&self, n: usize) -> Option<&FormalArgument> {
		self.cp_fargs().get(n)
	}

	pub fn num_cp_fargs(&self) -> usize {
		self.cp_fargs().len()
	}

	pub fn copy_formal_arg_list(&self) -> Vec<FormalArgument> {
		self.fargs.clone()
	}

	pub fn farg_name_is_unique(&self, name: &str) -> bool {
		self.fargs.iter().all(|farg| farg.name() != name)
	}

	/// Appends `farg`, mirroring it into the column-predicate list of a matrix.
	pub fn append_formal_arg(&mut self, farg: FormalArgument, is_system_edit: bool) -> DbResult<()> {
		self.check_editable(is_system_edit)?;
		self.check_fixed_arity(self.fargs.len() + 1)?;
		self.check_arg_type(&farg, None)?;
		self.check_unique_name(farg.name(), None)?;
		self.insert_unchecked(self.fargs.len(), farg);
		Ok(())
	}

	/// Inserts `farg` before position `n` (`n == num_fargs` appends).
	pub fn insert_formal_arg(
		&mut self,
		farg: FormalArgument,
		n: usize,
		is_system_edit: bool,
	) -> DbResult<()> {
		self.check_editable(is_system_edit)?;
		if n > self.fargs.len() {
			return Err(SystemError::ArgIndex {
				index: n,
				len: self.fargs.len(),
			}
			.into());
		}
		self.check_fixed_arity(self.fargs.len() + 1)?;
		self.check_arg_type(&farg, None)?;
		self.check_unique_name(farg.name(), None)?;
		self.insert_unchecked(n, farg);
		Ok(())
	}

	/// Replaces the argument at `n`, returning the old one.
	///
	/// In a matrix the mirrored column-predicate slot keeps its id when the replacement is a
	/// new version of the same slot (same valid id).
	pub fn replace_formal_arg(
		&mut self,
		mut farg: FormalArgument,
		n: usize,
		is_system_edit: bool,
	) -> DbResult<FormalArgument> {
		self.check_editable(is_system_edit)?;
		let old = self.fargs.get(n).ok_or(SystemError::ArgIndex {
			index: n,
			len: self.fargs.len(),
		})?;
		if old.id().is_valid() && old.id() == farg.id() && old.farg_type() != farg.farg_type() {
			return Err(SystemError::ArgRetyped {
				id: farg.id(),
				old: old.farg_type(),
				new: farg.farg_type(),
			}
			.into());
		}
		self.check_arg_type(&farg, Some(old.farg_type()))?;
		self.check_unique_name(farg.name(), Some(n))?;

		let same_slot = old.id().is_valid() && old.id() == farg.id();
		farg.set_ve_id(self.id);
		if let VeFlavor::Matrix(m) = &mut self.flavor {
			let mut cp = mirror_of(&farg);
			if same_slot {
				cp.set_id(m.cp_fargs[n + CP_FIXED_ARGS].id());
			}
			m.cp_fargs[n + CP_FIXED_ARGS] = cp;
		}
		Ok(std::mem::replace(&mut self.fargs[n], farg))
	}

	/// Removes and returns the argument at `n`. The last argument can't be removed.
	pub fn delete_formal_arg(&mut self, n: usize, is_system_edit: bool) -> DbResult<FormalArgument> {
		self.check_editable(is_system_edit)?;
		if n >= self.fargs.len() {
			return Err(SystemError::ArgIndex {
				index: n,
				len: self.fargs.len(),
			}
			.into());
		}
		if self.fargs.len() == 1 {
			return Err(LogicError::NoArguments.into());
		}
		if let VeFlavor::Matrix(m) = &mut self.flavor {
			if !args_equivalent(&self.fargs[n], &m.cp_fargs[n + CP_FIXED_ARGS]) {
				return Err(SystemError::CpArgMismatch(n + CP_FIXED_ARGS).into());
			}
			m.cp_fargs.remove(n + CP_FIXED_ARGS);
		}
		Ok(self.fargs.remove(n))
	}

	/// Verifies the column-predicate list against the regular list. Predicates always pass.
	pub fn check_cp_invariant(&self) -> DbResult<()> {
		let VeFlavor::Matrix(m) = &self.flavor else {
			return Ok(());
		};
		if m.cp_fargs.len() != self.fargs.len() + CP_FIXED_ARGS {
			return Err(SystemError::CpArgCount {
				expected: self.fargs.len() + CP_FIXED_ARGS,
				found: m.cp_fargs.len(),
			}
			.into());
		}
		let fixed_ok = m.cp_fargs[0].name() == "<ord>"
			&& m.cp_fargs[0].farg_type() == FargType::Integer
			&& m.cp_fargs[1].name() == "<onset>"
			&& m.cp_fargs[1].farg_type() == FargType::TimeStamp
			&& m.cp_fargs[2].name() == "<offset>"
			&& m.cp_fargs[2].farg_type() == FargType::TimeStamp;
		if !fixed_ok {
			return Err(SystemError::CpArgMismatch(0).into());
		}
		for (i, farg) in self.fargs.iter().enumerate() {
			if !args_equivalent(farg, &m.cp_fargs[i + CP_FIXED_ARGS]) {
				return Err(SystemError::CpArgMismatch(i + CP_FIXED_ARGS).into());
			}
		}
		Ok(())
	}

	/// Fails unless the element is user-editable or this is a system edit.
	pub fn check_editable(&self, is_system_edit: bool) -> DbResult<()> {
		if self.system && !is_system_edit {
			return Err(SystemError::SystemElement(self.id).into());
		}
		Ok(())
	}

	/// Stamps `id` on the element and every argument it owns.
	pub(crate) fn set_id(&mut self, id: DbId) {
		self.id = id;
		for farg in &mut self.fargs {
			farg.set_ve_id(id);
		}
		if let VeFlavor::Matrix(m) = &mut self.flavor {
			for farg in &mut m.cp_fargs {
				farg.set_ve_id(id);
			}
		}
	}

	pub(crate) fn set_column_id(&mut self, column_id: DbId) -> DbResult<()> {
		match &mut self.flavor {
			VeFlavor::Matrix(m) => {
				m.column_id = column_id;
				Ok(())
			}
			VeFlavor::Predicate => Err(SystemError::KindMismatch {
				id: self.id,
				expected: VeKind::Matrix.label(),
				found: VeKind::Predicate.label(),
			}
			.into()),
		}
	}

	pub(crate) fn fargs_mut(&mut self) -> &mut [FormalArgument] {
		&mut self.fargs
	}

	pub(crate) fn cp_fargs_mut(&mut self) -> &mut [FormalArgument] {
		match &mut self.flavor {
			VeFlavor::Matrix(m) => &mut m.cp_fargs,
			VeFlavor::Predicate => &mut [],
		}
	}

	fn insert_unchecked(&mut self, n: usize, mut farg: FormalArgument) {
		farg.set_ve_id(self.id);
		if let VeFlavor::Matrix(m) = &mut self.flavor {
			m.cp_fargs.insert(n + CP_FIXED_ARGS, mirror_of(&farg));
		}
		self.fargs.insert(n, farg);
	}

	fn check_fixed_arity(&self, wanted: usize) -> DbResult<()> {
		match self.matrix_type() {
			Some(t) if t != MatrixType::Matrix && wanted > 1 => Err(SystemError::ArityMismatch {
				expected: 1,
				found: wanted,
			}
			.into()),
			_ => Ok(()),
		}
	}

	/// Argument-type rules. `replacing` is the type of the slot being replaced, if any.
	fn check_arg_type(&self, farg: &FormalArgument, replacing: Option<FargType>) -> DbResult<()> {
		let farg_type = farg.farg_type();
		let illegal = |context: String| -> DbResult<()> {
			Err(LogicError::IllegalArgType { farg_type, context }.into())
		};
		match self.matrix_type() {
			None if farg_type == FargType::Text => illegal("predicate vocab elements".into()),
			None => Ok(()),
			Some(MatrixType::Matrix) if farg_type == FargType::Text => {
				illegal("MATRIX matrices".into())
			}
			Some(MatrixType::Matrix) => Ok(()),
			Some(MatrixType::Undefined) => Err(SystemError::UndefinedMatrixType.into()),
			Some(t) => {
				let fixed = replacing.or(t.farg_type());
				if Some(farg_type) == fixed {
					Ok(())
				} else {
					illegal(format!("{t} matrices"))
				}
			}
		}
	}

	/// Names are unique in the regular list and, for matrices, in the column-predicate list.
	fn check_unique_name(&self, name: &str, skip: Option<usize>) -> DbResult<()> {
		let clash = self
			.fargs
			.iter()
			.enumerate()
			.any(|(i, farg)| Some(i) != skip && farg.name() == name)
			|| self
				.cp_fargs()
				.iter()
				.enumerate()
				.any(|(i, farg)| Some(i) != skip.map(|n| n + CP_FIXED_ARGS) && farg.name() == name);
		if clash {
			return Err(LogicError::DuplicateArgName(name.to_owned()).into());
		}
		Ok(())
	}
}

/// Unindexed copy of `farg` for the column-predicate list.
fn mirror_of(farg: &FormalArgument) -> FormalArgument {
	let mut cp = farg.clone();
	cp.set_id(DbId::INVALID);
	cp
}

/// Name grammar for each kind: predicate names vs spreadsheet variable names.
pub(crate) fn check_ve_name(kind: VeKind, name: &str) -> DbResult<()> {
	let (ok, name_kind) = match kind {
		VeKind::Predicate => (grammar::is_pred_name(name), NameKind::Predicate),
		VeKind::Matrix => (grammar::is_svar_name(name), NameKind::Column),
	};
	if ok {
		Ok(())
	} else {
		Err(LogicError::InvalidName {
			kind: name_kind,
			name: name.to_owned(),
		}
		.into())
	}
}

#[cfg(test)]
mod tests;
