//! Core value types for the annota database: identifier handles, time stamps, and the
//! character grammars that govern every user-supplied name and string.

/// Name and string grammars (formal arguments, predicates, nominals, text).
pub mod grammar;
/// Opaque identifier handles assigned by the database index.
pub mod id;
/// Tick-based time stamps.
pub mod time_stamp;

pub use id::DbId;
pub use time_stamp::{TimeStamp, TimeStampError};
