//! Error taxonomy.
//!
//! [`SystemError`] is an internal contract violation: a bug in the caller or in the database,
//! never a user-input problem. [`LogicError`] is user-facing (bad or duplicate names, illegal
//! argument types) and is meant to be shown and retried. [`DbError`] carries either.

use annota_primitives::{DbId, TimeStampError};

use crate::farg::FargType;
use crate::vocab::MatrixType;

/// Grammar a rejected name was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NameKind {
	Predicate,
	Column,
	FormalArg,
	Nominal,
	QuoteString,
	Text,
}

/// Internal invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SystemError {
	#[error("invalid id where a live element was required")]
	InvalidId,
	#[error("id {0} not found in index")]
	NotFound(DbId),
	#[error("element already carries id {0}")]
	AlreadyIndexed(DbId),
	#[error("element {id} is a {found}, expected a {expected}")]
	KindMismatch {
		id: DbId,
		expected: &'static str,
		found: &'static str,
	},
	#[error("vocab element {0} is a system element")]
	SystemElement(DbId),
	#[error("formal argument id {0} has no counterpart in the previous definition")]
	ArgIdVanished(DbId),
	#[error("formal argument {id} changed type from {old} to {new}")]
	ArgRetyped { id: DbId, old: FargType, new: FargType },
	#[error("duplicate formal argument id {0}")]
	DuplicateArgId(DbId),
	#[error("formal argument {id} belongs to vocab element {found}, expected {expected}")]
	ArgOwnerMismatch {
		id: DbId,
		expected: DbId,
		found: DbId,
	},
	#[error("formal argument {0} differs from its indexed copy")]
	ArgIndexMismatch(DbId),
	#[error("column predicate list has {found} entries, expected {expected}")]
	CpArgCount { expected: usize, found: usize },
	#[error("column predicate argument {0} does not mirror its formal argument")]
	CpArgMismatch(usize),
	#[error("argument list has {found} entries, expected {expected}")]
	ArityMismatch { expected: usize, found: usize },
	#[error("name map entry for {name:?} does not match vocab element {id}")]
	NameMapMismatch { name: String, id: DbId },
	#[error("value of type {found} cannot occupy a {expected} slot")]
	TypeMismatch { expected: FargType, found: FargType },
	#[error("value is bound to formal argument {found}, expected {expected}")]
	FargMismatch { expected: DbId, found: DbId },
	#[error("matrix type cannot change from {old} to {new}")]
	MatrixTypeChanged { old: MatrixType, new: MatrixType },
	#[error("matrix element is attached to column {found}, expected {expected}")]
	ColumnMismatch { expected: DbId, found: DbId },
	#[error("matrix vocab elements need a defined matrix type")]
	UndefinedMatrixType,
	#[error("argument index {index} out of range for a list of {len}")]
	ArgIndex { index: usize, len: usize },
	#[error("subrange minimum must be strictly below maximum")]
	BadRange,
	#[error("change already noted for vocab element {0}")]
	ChangeAlreadyNoted(DbId),
	#[error("no changes noted for vocab element {0}")]
	NoChangesNoted(DbId),
	#[error("listener {listener} already registered with {target}")]
	ListenerAlreadyRegistered { target: DbId, listener: u64 },
	#[error("listener {listener} not registered with {target}")]
	ListenerNotRegistered { target: DbId, listener: u64 },
	#[error("cascade end without matching begin")]
	CascadeUnderflow,
	#[error("column {0} notified outside of a cascade")]
	CascadeNotInProgress(DbId),
	#[error("vocab element {0} is not variable length")]
	NotVarLen(DbId),
	#[error("cached {field} of predicate {id} is stale")]
	StaleCache { id: DbId, field: &'static str },
	#[error("matrix element {0} backs a column; remove the column instead")]
	BacksColumn(DbId),
}

/// User-facing validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
	#[error("a vocab element named {0:?} already exists")]
	NameInUse(String),
	#[error("{name:?} is not a valid {kind} name")]
	InvalidName { kind: NameKind, name: String },
	#[error("formal argument name {0:?} is already used in this element")]
	DuplicateArgName(String),
	#[error("{farg_type} arguments are not allowed in {context}")]
	IllegalArgType {
		farg_type: FargType,
		context: String,
	},
	#[error("a vocab element needs at least one formal argument")]
	NoArguments,
	#[error("a column named {0:?} already exists")]
	ColumnExists(String),
	#[error("float values must be finite")]
	NonFiniteFloat,
	#[error(transparent)]
	TimeStamp(#[from] TimeStampError),
}

/// Any database failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
	#[error("system error: {0}")]
	System(#[from] SystemError),
	#[error("{0}")]
	Logic(#[from] LogicError),
}

impl DbError {
	/// Returns `true` for user-facing errors the caller may present and retry.
	pub fn is_logic(&self) -> bool {
		matches!(self, DbError::Logic(_))
	}

	pub fn is_system(&self) -> bool {
		matches!(self, DbError::System(_))
	}
}

impl From<TimeStampError> for DbError {
	fn from(err: TimeStampError) -> Self {
		DbError::Logic(LogicError::TimeStamp(err))
	}
}

/// Result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
