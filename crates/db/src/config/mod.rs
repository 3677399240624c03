//! Declarative vocabulary loading.
//!
//! A declaration file is TOML describing the tick rate plus the predicates and columns a new
//! database starts with:
//!
//! ```toml
//! ticks_per_second = 60
//!
//! [[predicate]]
//! name = "holds"
//! var_len = true
//! args = [
//!     { name = "<who>", type = "nominal", approved = ["alice", "bob"] },
//!     { name = "<what>", type = "untyped" },
//! ]
//!
//! [[column]]
//! name = "trial"
//! args = [
//!     { name = "<n>", type = "integer", min = 0, max = 100 },
//!     { name = "<act>", type = "predicate", approved = ["holds"] },
//! ]
//!
//! [[column]]
//! name = "notes"
//! type = "text"
//! ```
//!
//! Declarations are applied in file order, so an approved-predicate list may only name
//! predicates declared above it. Time-stamp bounds are tick counts at the declared rate.

mod error;

use std::path::Path;

use annota_primitives::{DbId, TimeStamp};
use serde::Deserialize;

pub use error::{ConfigError, Result};

use crate::database::{DEFAULT_TICKS_PER_SECOND, Database};
use crate::error::DbError;
use crate::farg::FormalArgument;
use crate::vocab::{MatrixType, VeKind, VocabElement};

/// Parsed declaration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
	/// Tick rate for every time stamp, in `1..=1000`.
	pub ticks_per_second: u32,
	pub predicate: Vec<PredicateDecl>,
	pub column: Vec<ColumnDecl>,
}

impl Default for DbConfig {
	fn default() -> Self {
		Self {
			ticks_per_second: DEFAULT_TICKS_PER_SECOND,
			predicate: Vec::new(),
			column: Vec::new(),
		}
	}
}

/// A predicate vocab element to create.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateDecl {
	pub name: String,
	#[serde(default)]
	pub var_len: bool,
	/// Registers the predicate as a system element, closed to user edits.
	#[serde(default)]
	pub system: bool,
	#[serde(default)]
	pub args: Vec<ArgDecl>,
}

/// A column, with its backing matrix element, to create.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDecl {
	pub name: String,
	#[serde(default, rename = "type")]
	pub matrix_type: MatrixType,
	/// Arguments of an untyped (`matrix`) column. Typed columns take none.
	#[serde(default)]
	pub args: Vec<ArgDecl>,
}

/// One formal argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArgDecl {
	pub name: String,
	#[serde(default)]
	pub hidden: bool,
	#[serde(flatten)]
	pub kind: ArgKindDecl,
}

/// Argument type and subrange, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgKindDecl {
	Untyped,
	Integer { min: Option<i64>, max: Option<i64> },
	Float { min: Option<f64>, max: Option<f64> },
	Nominal { approved: Option<Vec<String>> },
	/// `approved` names predicate vocab elements.
	Predicate { approved: Option<Vec<String>> },
	TimeStamp { min: Option<i64>, max: Option<i64> },
	QuoteString,
	Text,
	ColPredicate,
}

impl DbConfig {
	/// Parse a TOML string into a [`DbConfig`].
	pub fn parse(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Load a declaration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Creates a database holding the declared vocabulary.
	pub fn build(&self) -> Result<Database> {
		let mut db = Database::new(self.ticks_per_second)?;
		for decl in &self.predicate {
			decl.apply(&mut db).map_err(|err| match err {
				ConfigError::Db(error) => ConfigError::Predicate {
					name: decl.name.clone(),
					error,
				},
				other => other,
			})?;
		}
		for decl in &self.column {
			decl.apply(&mut db).map_err(|err| match err {
				ConfigError::Db(error) => ConfigError::Column {
					name: decl.name.clone(),
					error,
				},
				other => other,
			})?;
		}
		tracing::info!(
			tps = self.ticks_per_second,
			predicates = self.predicate.len(),
			columns = self.column.len(),
			"vocabulary loaded"
		);
		Ok(db)
	}
}

impl PredicateDecl {
	fn apply(&self, db: &mut Database) -> Result<DbId> {
		let mut ve = VocabElement::predicate(self.name.as_str())?;
		ve.set_var_len(self.var_len)?;
		for arg in &self.args {
			ve.append_formal_arg(arg.to_farg(db)?, false)?;
		}
		let id = if self.system {
			db.add_system_pred_ve(ve)?
		} else {
			db.add_pred_ve(ve)?
		};
		Ok(id)
	}
}

impl ColumnDecl {
	fn apply(&self, db: &mut Database) -> Result<DbId> {
		if self.args.is_empty() {
			return Ok(db.add_column(&self.name, self.matrix_type)?);
		}
		if self.matrix_type != MatrixType::Matrix {
			return Err(ConfigError::InvalidArg {
				arg: self.args[0].name.clone(),
				reason: "typed columns take no argument list",
			});
		}
		let fargs = self
			.args
			.iter()
			.map(|arg| arg.to_farg(db))
			.collect::<Result<Vec<_>>>()?;
		Ok(db.add_matrix_column(&self.name, fargs)?)
	}
}

impl ArgDecl {
	fn to_farg(&self, db: &Database) -> Result<FormalArgument> {
		let name = self.name.as_str();
		let mut farg = match &self.kind {
			ArgKindDecl::Untyped => FormalArgument::untyped(name)?,
			ArgKindDecl::Integer { min, max } => {
				let mut farg = FormalArgument::integer(name)?;
				if let Some((min, max)) = self.bounds(*min, *max)? {
					farg.set_int_range(min, max)?;
				}
				farg
			}
			ArgKindDecl::Float { min, max } => {
				let mut farg = FormalArgument::float(name)?;
				if let Some((min, max)) = self.bounds(*min, *max)? {
					farg.set_float_range(min, max)?;
				}
				farg
			}
			ArgKindDecl::TimeStamp { min, max } => {
				let mut farg = FormalArgument::time_stamp(name, db.tps())?;
				if let Some((min, max)) = self.bounds(*min, *max)? {
					let min = TimeStamp::new(db.tps(), min).map_err(DbError::from)?;
					let max = TimeStamp::new(db.tps(), max).map_err(DbError::from)?;
					farg.set_time_stamp_range(min, max)?;
				}
				farg
			}
			ArgKindDecl::Nominal { approved } => {
				let mut farg = FormalArgument::nominal(name)?;
				if let Some(approved) = approved {
					farg.set_approved_nominals(approved.iter().map(String::as_str))?;
				}
				farg
			}
			ArgKindDecl::Predicate { approved } => {
				let mut farg = FormalArgument::predicate(name)?;
				if let Some(approved) = approved {
					let ids = approved
						.iter()
						.map(|pred| {
							db.get_vocab_element_by_name(pred)
								.filter(|ve| ve.kind() == VeKind::Predicate)
								.map(VocabElement::id)
								.ok_or_else(|| ConfigError::UnknownPredicate {
									arg: self.name.clone(),
									name: pred.clone(),
								})
						})
						.collect::<Result<Vec<_>>>()?;
					farg.set_approved_predicates(ids)?;
				}
				farg
			}
			ArgKindDecl::QuoteString => FormalArgument::quote_string(name)?,
			ArgKindDecl::Text => FormalArgument::text(name)?,
			ArgKindDecl::ColPredicate => FormalArgument::col_predicate(name)?,
		};
		farg.set_hidden(self.hidden);
		Ok(farg)
	}

	fn bounds<T>(&self, min: Option<T>, max: Option<T>) -> Result<Option<(T, T)>> {
		match (min, max) {
			(Some(min), Some(max)) => Ok(Some((min, max))),
			(None, None) => Ok(None),
			_ => Err(ConfigError::InvalidArg {
				arg: self.name.clone(),
				reason: "min and max must be given together",
			}),
		}
	}
}

#[cfg(test)]
mod tests;
