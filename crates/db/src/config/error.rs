//! Error types for vocabulary declarations.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::DbError;

/// Errors that can occur when loading or applying a declaration file.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a declaration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A declared predicate was rejected by the database.
	#[error("predicate {name:?}: {error}")]
	Predicate { name: String, error: DbError },

	/// A declared column was rejected by the database.
	#[error("column {name:?}: {error}")]
	Column { name: String, error: DbError },

	/// An approved-predicate list names a predicate not declared above it.
	#[error("argument {arg} approves unknown predicate {name:?}")]
	UnknownPredicate { arg: String, name: String },

	/// A bound was given for an argument type without bounds.
	#[error("argument {arg}: {reason}")]
	InvalidArg { arg: String, reason: &'static str },

	#[error(transparent)]
	Db(#[from] DbError),
}

/// Result type for declaration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
