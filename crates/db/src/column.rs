//! Minimal column and cell storage hosting data values.
//!
//! A [`DataColumn`] is backed one-to-one by a matrix vocab element and is that element's
//! internal listener. Each [`DataCell`] holds one data value per matrix argument.

use annota_primitives::DbId;
use serde::{Deserialize, Serialize};

use crate::error::{DbResult, SystemError};
use crate::listeners::VeChange;
use crate::value::DataValue;
use crate::vocab::MatrixType;

/// A spreadsheet column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
	id: DbId,
	name: String,
	mve_id: DbId,
	matrix_type: MatrixType,
	#[serde(skip)]
	cascade_in_progress: bool,
	cells: Vec<DbId>,
}

impl DataColumn {
	pub(crate) fn new(id: DbId, name: String, mve_id: DbId, matrix_type: MatrixType) -> Self {
		Self {
			id,
			name,
			mve_id,
			matrix_type,
			cascade_in_progress: false,
			cells: Vec::new(),
		}
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The backing matrix vocab element.
	#[inline]
	pub fn mve_id(&self) -> DbId {
		self.mve_id
	}

	#[inline]
	pub fn matrix_type(&self) -> MatrixType {
		self.matrix_type
	}

	/// Cell ids in row order.
	#[inline]
	pub fn cells(&self) -> &[DbId] {
		&self.cells
	}

	#[inline]
	pub fn cascade_in_progress(&self) -> bool {
		self.cascade_in_progress
	}

	pub(crate) fn push_cell(&mut self, cell: DbId) {
		self.cells.push(cell);
	}

	pub(crate) fn remove_cell(&mut self, cell: DbId) {
		self.cells.retain(|c| *c != cell);
	}

	pub(crate) fn begin_cascade(&mut self) {
		self.cascade_in_progress = true;
	}

	pub(crate) fn end_cascade(&mut self) {
		self.cascade_in_progress = false;
	}

	/// Picks up the column-level effects of an edit to the backing element.
	///
	/// Cell contents are rearranged by the caller. Only valid inside a cascade.
	pub(crate) fn apply_def_change(&mut self, change: &VeChange) -> DbResult<()> {
		if !self.cascade_in_progress {
			return Err(SystemError::CascadeNotInProgress(self.id).into());
		}
		if change.ve_id != self.mve_id {
			return Err(SystemError::FargMismatch {
				expected: self.mve_id,
				found: change.ve_id,
			}
			.into());
		}
		if change.name_changed {
			tracing::debug!(column = %self.id, from = %self.name, to = %change.new_name, "column renamed");
			self.name = change.new_name.clone();
		}
		Ok(())
	}
}

/// One row of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCell {
	id: DbId,
	column_id: DbId,
	args: Vec<DataValue>,
}

impl DataCell {
	pub(crate) fn new(id: DbId, column_id: DbId, args: Vec<DataValue>) -> Self {
		Self { id, column_id, args }
	}

	#[inline]
	pub fn id(&self) -> DbId {
		self.id
	}

	#[inline]
	pub fn column_id(&self) -> DbId {
		self.column_id
	}

	#[inline]
	pub fn args(&self) -> &[DataValue] {
		&self.args
	}

	pub(crate) fn args_mut(&mut self) -> &mut Vec<DataValue> {
		&mut self.args
	}
}
