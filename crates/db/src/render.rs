//! Debug rendering as nested `(TypeName (field value) ...)` forms.
//!
//! The output is deterministic and meant for tests and diagnostics, not for storage; use the
//! serde derives for a round-trippable encoding.

use std::fmt::Display;

use crate::column::{DataCell, DataColumn};
use crate::database::Database;
use crate::farg::{FargKind, FargType, FormalArgument};
use crate::value::{DataValue, Predicate, ValueKind};
use crate::vocab::{VeKind, VocabElement};

/// Placeholder for empty strings and absent entries.
const NULL: &str = "<null>";

/// Entities with a debug rendering.
pub trait DbString {
	fn write_db(&self, out: &mut String);

	fn to_db_string(&self) -> String {
		let mut out = String::new();
		self.write_db(&mut out);
		out
	}
}

fn open(out: &mut String, type_name: &str) {
	out.push('(');
	out.push_str(type_name);
}

fn close(out: &mut String) {
	out.push(')');
}

fn field(out: &mut String, key: &str, value: impl Display) {
	out.push_str(" (");
	out.push_str(key);
	out.push(' ');
	out.push_str(&value.to_string());
	out.push(')');
}

fn str_field(out: &mut String, key: &str, value: &str) {
	field(out, key, if value.is_empty() { NULL } else { value });
}

fn list_field<T: DbString>(out: &mut String, key: &str, items: &[T]) {
	out.push_str(" (");
	out.push_str(key);
	for item in items {
		out.push(' ');
		item.write_db(out);
	}
	out.push(')');
}

fn farg_type_name(farg_type: FargType) -> &'static str {
	match farg_type {
		FargType::Undefined => "UndefinedFormalArg",
		FargType::Untyped => "UnTypedFormalArg",
		FargType::Integer => "IntFormalArg",
		FargType::Float => "FloatFormalArg",
		FargType::Nominal => "NominalFormalArg",
		FargType::Predicate => "PredFormalArg",
		FargType::TimeStamp => "TimeStampFormalArg",
		FargType::QuoteString => "QuoteStringFormalArg",
		FargType::Text => "TextStringFormalArg",
		FargType::ColPredicate => "ColPredFormalArg",
	}
}

impl DbString for FormalArgument {
	fn write_db(&self, out: &mut String) {
		open(out, farg_type_name(self.farg_type()));
		field(out, "id", self.id());
		field(out, "name", self.name());
		field(out, "ve_id", self.ve_id());
		field(out, "hidden", self.hidden());
		match self.kind() {
			FargKind::Integer(b) => {
				field(out, "sub_range", b.sub_range);
				field(out, "min", b.min);
				field(out, "max", b.max);
			}
			FargKind::Float(b) => {
				field(out, "sub_range", b.sub_range);
				field(out, "min", format_args!("{:?}", b.min));
				field(out, "max", format_args!("{:?}", b.max));
			}
			FargKind::TimeStamp(b) => {
				field(out, "sub_range", b.sub_range);
				field(out, "min", b.min.to_db_string());
				field(out, "max", b.max.to_db_string());
			}
			FargKind::Nominal(set) => {
				field(out, "sub_range", set.sub_range);
				let approved: Vec<&str> = set.members.iter().map(String::as_str).collect();
				field(out, "approved", format_args!("({})", approved.join(" ")));
			}
			FargKind::Predicate(set) => {
				field(out, "sub_range", set.sub_range);
				let approved: Vec<String> = set.members.iter().map(ToString::to_string).collect();
				field(out, "approved", format_args!("({})", approved.join(" ")));
			}
			FargKind::Untyped | FargKind::QuoteString | FargKind::Text | FargKind::ColPredicate => {}
		}
		close(out);
	}
}

impl DbString for DataValue {
	fn write_db(&self, out: &mut String) {
		let type_name = match self.kind() {
			ValueKind::Undefined { .. } => "UndefinedDataValue",
			ValueKind::Integer { .. } => "IntDataValue",
			ValueKind::Float { .. } => "FloatDataValue",
			ValueKind::Nominal { .. } => "NominalDataValue",
			ValueKind::QuoteString { .. } => "QuoteStringDataValue",
			ValueKind::Text { .. } => "TextStringDataValue",
			ValueKind::TimeStamp { .. } => "TimeStampDataValue",
			ValueKind::Predicate(_) => "PredDataValue",
			ValueKind::ColPredicate(_) => "ColPredDataValue",
		};
		open(out, type_name);
		field(out, "id", self.id());
		field(out, "farg_id", self.farg_id());
		field(out, "farg_type", self.farg_type());
		field(out, "cell_id", self.cell_id());
		match self.kind() {
			ValueKind::Undefined { name } => str_field(out, "value", name),
			ValueKind::Integer { value, min, max } => {
				field(out, "value", value);
				field(out, "sub_range", self.sub_range());
				field(out, "min", min);
				field(out, "max", max);
			}
			ValueKind::Float { value, min, max } => {
				field(out, "value", format_args!("{value:?}"));
				field(out, "sub_range", self.sub_range());
				field(out, "min", format_args!("{min:?}"));
				field(out, "max", format_args!("{max:?}"));
			}
			ValueKind::TimeStamp { value, min, max } => {
				field(out, "value", value.to_db_string());
				field(out, "sub_range", self.sub_range());
				field(out, "min", min.to_db_string());
				field(out, "max", max.to_db_string());
			}
			ValueKind::Nominal { value } => {
				str_field(out, "value", value);
				field(out, "sub_range", self.sub_range());
			}
			ValueKind::QuoteString { value } | ValueKind::Text { value } => {
				str_field(out, "value", value);
			}
			ValueKind::Predicate(pred) | ValueKind::ColPredicate(pred) => {
				out.push_str(" (value ");
				pred.write_db(out);
				out.push(')');
				field(out, "sub_range", self.sub_range());
			}
		}
		close(out);
	}
}

impl DbString for Predicate {
	fn write_db(&self, out: &mut String) {
		open(out, "Predicate");
		field(out, "id", self.id());
		if self.is_undefined() {
			field(out, "ve_id", self.ve_id());
			close(out);
			return;
		}
		field(out, "ve_id", self.ve_id());
		field(out, "name", self.name());
		field(out, "var_len", self.var_len());
		field(out, "cell_id", self.cell_id());
		list_field(out, "args", self.args());
		close(out);
	}
}

impl DbString for VocabElement {
	fn write_db(&self, out: &mut String) {
		match self.kind() {
			VeKind::Predicate => open(out, "PredicateVocabElement"),
			VeKind::Matrix => open(out, "MatrixVocabElement"),
		}
		field(out, "id", self.id());
		field(out, "name", self.name());
		if let Some(matrix_type) = self.matrix_type() {
			field(out, "type", matrix_type);
			field(out, "column_id", self.column_id());
		}
		field(out, "var_len", self.var_len());
		field(out, "system", self.system());
		list_field(out, "fargs", self.fargs());
		if self.kind() == VeKind::Matrix {
			list_field(out, "cp_fargs", self.cp_fargs());
		}
		close(out);
	}
}

impl DbString for DataColumn {
	fn write_db(&self, out: &mut String) {
		open(out, "DataColumn");
		field(out, "id", self.id());
		field(out, "name", self.name());
		field(out, "mve_id", self.mve_id());
		field(out, "type", self.matrix_type());
		let cells: Vec<String> = self.cells().iter().map(ToString::to_string).collect();
		field(out, "cells", format_args!("({})", cells.join(" ")));
		close(out);
	}
}

impl DbString for DataCell {
	fn write_db(&self, out: &mut String) {
		open(out, "DataCell");
		field(out, "id", self.id());
		field(out, "column_id", self.column_id());
		list_field(out, "args", self.args());
		close(out);
	}
}

impl<T: DbString> DbString for &T {
	fn write_db(&self, out: &mut String) {
		(**self).write_db(out);
	}
}

impl DbString for Database {
	fn write_db(&self, out: &mut String) {
		open(out, "Database");
		field(out, "tps", self.tps());
		let ves: Vec<&VocabElement> = self.vocab_list().iter().collect();
		list_field(out, "vocab", &ves);
		let columns: Vec<&DataColumn> = self.columns().collect();
		list_field(out, "columns", &columns);
		let cells: Vec<&DataCell> = columns
			.iter()
			.flat_map(|column| column.cells())
			.filter_map(|id| self.cell(*id).ok())
			.collect();
		list_field(out, "cells", &cells);
		close(out);
	}
}

#[cfg(test)]
mod tests;
