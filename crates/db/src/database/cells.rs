//! Column and cell operations.

use annota_primitives::DbId;

use super::{Database, expect_kind};
use crate::column::{DataCell, DataColumn};
use crate::error::{DbResult, LogicError, SystemError};
use crate::farg::{DEFAULT_ARG_NAME, FormalArgument};
use crate::index::DbElement;
use crate::value::tree::{self, TreeIds};
use crate::value::{DataValue, Predicate, ValueKind};
use crate::vocab::{MatrixType, VeKind, VocabElement};

impl Database {
	/// Creates a column and its backing matrix element.
	///
	/// An untyped column starts with a single `<val>` argument; typed columns carry their
	/// fixed argument.
	pub fn add_column(&mut self, name: &str, matrix_type: MatrixType) -> DbResult<DbId> {
		let mut mve = VocabElement::matrix(name, matrix_type, self.tps)?;
		if matrix_type == MatrixType::Matrix {
			mve.append_formal_arg(FormalArgument::untyped(DEFAULT_ARG_NAME)?, false)?;
		}
		self.add_column_for(mve)
	}

	/// Creates an untyped column whose matrix element has the given arguments.
	pub fn add_matrix_column(&mut self, name: &str, fargs: Vec<FormalArgument>) -> DbResult<DbId> {
		let mut mve = VocabElement::matrix(name, MatrixType::Matrix, self.tps)?;
		for farg in fargs {
			mve.append_formal_arg(farg, false)?;
		}
		self.add_column_for(mve)
	}

	fn add_column_for(&mut self, mve: VocabElement) -> DbResult<DbId> {
		self.check_column_name(mve.name())?;
		let matrix_type = mve.matrix_type().ok_or(SystemError::UndefinedMatrixType)?;
		let name = mve.name().to_owned();

		let mut db = self.cascade();
		let this = &mut *db;
		let mve_id = this.vl.add_element(mve, &mut this.idx)?;
		let column_id = this.idx.add_element(DbElement::Column);
		this.vl.set_column_id(mve_id, column_id)?;

		let mut column = DataColumn::new(column_id, name, mve_id, matrix_type);
		// Joined mid-cascade, so the outermost end must still reach it.
		column.begin_cascade();
		this.columns.insert(column_id, column);
		this.vl
			.listeners_mut(mve_id)?
			.register_internal(column_id, &this.idx)?;
		this.cascade.register_internal(column_id, &this.idx)?;
		tracing::info!(column = %column_id, mve = %mve_id, %matrix_type, "column added");
		Ok(column_id)
	}

	fn check_column_name(&self, name: &str) -> DbResult<()> {
		match self.vl.get_by_name(name) {
			Some(ve) if ve.kind() == VeKind::Matrix => Err(LogicError::ColumnExists(name.to_owned()).into()),
			Some(_) => Err(LogicError::NameInUse(name.to_owned()).into()),
			None => Ok(()),
		}
	}

	/// Renames a column by renaming its backing matrix element.
	pub fn rename_column(&mut self, column_id: DbId, name: &str) -> DbResult<()> {
		let column = self.column(column_id)?;
		if column.name() == name {
			return Ok(());
		}
		let mve_id = column.mve_id();
		self.check_column_name(name)?;
		let mut mve = self.vl.get(mve_id)?.clone();
		mve.set_name(name)?;
		let mut db = self.cascade();
		db.replace_ve(mve, true)
	}

	/// Removes a column, its cells, and its backing matrix element.
	///
	/// Column predicates over the matrix held elsewhere are cleared.
	pub fn remove_column(&mut self, column_id: DbId) -> DbResult<()> {
		let column = self.column(column_id)?;
		let mve_id = column.mve_id();
		let cells = column.cells().to_vec();
		self.vl.check_removable(mve_id, &self.idx)?;

		let mut db = self.cascade();
		let this = &mut *db;
		for cell in cells {
			this.remove_cell(cell)?;
		}
		this.vl.listeners_mut(mve_id)?.deregister_internal(column_id)?;
		this.cascade.deregister_internal(column_id)?;
		this.dispatch_deletion(mve_id)?;
		this.vl.remove_element(mve_id, &mut this.idx)?;
		this.columns.shift_remove(&column_id);
		this.idx.remove_element(column_id)?;
		tracing::info!(column = %column_id, mve = %mve_id, "column removed");
		Ok(())
	}

	/// Appends a cell holding the empty value of every matrix argument.
	pub fn insert_cell(&mut self, column_id: DbId) -> DbResult<DbId> {
		let mve_id = self.column(column_id)?.mve_id();
		let mut args: Vec<DataValue> = self
			.vl
			.get(mve_id)?
			.fargs()
			.iter()
			.map(FormalArgument::construct_empty_arg)
			.collect();

		let cell_id = self.idx.add_element(DbElement::Cell { column: column_id });
		tree::assign_ids(&mut args, cell_id, DbId::INVALID, &mut self.idx);
		let ids = tree::collect_ids(&args);
		self.cells.insert(cell_id, DataCell::new(cell_id, column_id, args));
		self.columns
			.get_mut(&column_id)
			.ok_or(SystemError::NotFound(column_id))?
			.push_cell(cell_id);
		self.sync_tree_ids(&TreeIds::default(), &ids)?;
		Ok(cell_id)
	}

	/// Removes a cell and everything its values own.
	pub fn remove_cell(&mut self, cell_id: DbId) -> DbResult<()> {
		let cell = self.cell(cell_id)?;
		let column_id = cell.column_id();
		let ids = tree::collect_ids(cell.args());
		self.sync_tree_ids(&ids, &TreeIds::default())?;
		self.cells.remove(&cell_id);
		if let Some(column) = self.columns.get_mut(&column_id) {
			column.remove_cell(cell_id);
		}
		self.idx.remove_element(cell_id)?;
		Ok(())
	}

	pub fn cell_args(&self, cell_id: DbId) -> DbResult<&[DataValue]> {
		Ok(self.cell(cell_id)?.args())
	}

	/// Stores new contents for a cell.
	///
	/// Each value is checked against the matrix argument it lands in. A value bound to some
	/// other argument is salvaged into this one; the subrange is then enforced. Nested
	/// predicates are checked the same way against their own definitions.
	///
	/// Values and predicates still carrying an id this cell owns keep it; salvaged values and
	/// ids from elsewhere are indexed afresh.
	pub fn set_cell_value(&mut self, cell_id: DbId, args: Vec<DataValue>) -> DbResult<()> {
		let cell = self.cell(cell_id)?;
		let owned = tree::collect_ids(cell.args());
		let mve_id = self.column(cell.column_id())?.mve_id();
		let mut args = self.bind_args(args, self.vl.get(mve_id)?.fargs())?;
		tree::retain_ids(&mut args, &owned);
		self.update_cell(cell_id, |current, _| {
			*current = args;
			Ok(())
		})
	}

	/// Replaces the `n`th value of a cell, leaving the others as they are.
	pub fn set_cell_arg(&mut self, cell_id: DbId, n: usize, value: DataValue) -> DbResult<()> {
		let mut args = self.cell_args(cell_id)?.to_vec();
		let len = args.len();
		let slot = args
			.get_mut(n)
			.ok_or(SystemError::ArgIndex { index: n, len })?;
		*slot = value;
		self.set_cell_value(cell_id, args)
	}

	/// A predicate over `pve_id` with every argument empty.
	pub fn new_predicate(&self, pve_id: DbId) -> DbResult<Predicate> {
		Predicate::new(self.vl.get(pve_id)?)
	}

	/// A column predicate over `mve_id` with every argument empty.
	pub fn new_col_predicate(&self, mve_id: DbId) -> DbResult<Predicate> {
		Predicate::column(self.vl.get(mve_id)?)
	}

	fn bind_args(&self, args: Vec<DataValue>, fargs: &[FormalArgument]) -> DbResult<Vec<DataValue>> {
		if args.len() != fargs.len() {
			return Err(SystemError::ArityMismatch {
				expected: fargs.len(),
				found: args.len(),
			}
			.into());
		}
		args.into_iter()
			.zip(fargs)
			.map(|(value, farg)| self.bind_value(value, farg))
			.collect()
	}

	fn bind_value(&self, value: DataValue, farg: &FormalArgument) -> DbResult<DataValue> {
		let mut value = if value.farg_id() == farg.id() && value.farg_type() == farg.farg_type() {
			value
		} else {
			tracing::trace!(from = %value.farg_id(), to = %farg.id(), "salvaging value into slot");
			farg.construct_arg_with_salvage(Some(&value), self.tps)
		};
		value.enforce_subrange(farg)?;
		if !farg.is_valid_value(value.kind()) {
			return Err(LogicError::IllegalArgType {
				farg_type: value.kind().value_type(),
				context: format!("argument {}", farg.name()),
			}
			.into());
		}
		match value.kind_mut() {
			ValueKind::Predicate(pred) if !pred.is_undefined() => {
				self.bind_predicate(pred, VeKind::Predicate)?;
			}
			ValueKind::ColPredicate(pred) if !pred.is_undefined() => {
				self.bind_predicate(pred, VeKind::Matrix)?;
			}
			_ => {}
		}
		Ok(value)
	}

	fn bind_predicate(&self, pred: &mut Predicate, kind: VeKind) -> DbResult<()> {
		let ve = self.vl.get(pred.ve_id())?;
		expect_kind(ve, kind)?;
		if pred.name() != ve.name() {
			return Err(SystemError::StaleCache {
				id: pred.id(),
				field: "name",
			}
			.into());
		}
		let fargs = match kind {
			VeKind::Predicate => ve.fargs(),
			VeKind::Matrix => ve.cp_fargs(),
		};
		let args = pred.replace_args(Vec::new());
		pred.replace_args(self.bind_args(args, fargs)?);
		Ok(())
	}
}
