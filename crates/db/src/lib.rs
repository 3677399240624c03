//! Vocabulary registry and cascading data-value model.
//!
//! The database holds a vocabulary of named schemas ([`VocabElement`]s) made of typed formal
//! arguments, and data values bound to those arguments. Editing a schema cascades to every
//! stored value built from it: values are rearranged, re-validated against new subranges,
//! renamed, or reset when their definition disappears.
//!
//! # Layout
//!
//! | Module | Concern |
//! |---|---|
//! | [`index`] | Id allocation and the arena every cross-reference resolves through |
//! | [`farg`] | Formal argument types, subranges, validity, salvage |
//! | [`value`] | Data values and nested predicates |
//! | [`vocab`] | Predicate and matrix vocab elements |
//! | [`vocab_list`] | The registry with its name namespace |
//! | [`listeners`] | Change notes, observer traits, cascade depth |
//! | [`database`] | The facade tying everything together, plus column and cell hosting |
//! | [`config`] | Declarative vocabulary loading |
//! | [`render`] | Debug rendering |

pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod farg;
pub mod index;
pub mod listeners;
pub mod render;
pub mod value;
pub mod vocab;
pub mod vocab_list;

pub use column::{DataCell, DataColumn};
pub use config::{ConfigError, DbConfig};
pub use database::{CascadeGuard, DEFAULT_TICKS_PER_SECOND, Database, SharedDatabase};
pub use error::{DbError, DbResult, LogicError, NameKind, SystemError};
pub use farg::{FargKind, FargType, FormalArgument};
pub use listeners::{
	ArgListChange, CascadeObserver, ListenerHandle, VeChange, VeObserver, VocabListObserver,
};
pub use render::DbString;
pub use value::{DataValue, Predicate, ValueKind};
pub use vocab::{MatrixType, VeKind, VocabElement};
pub use vocab_list::VocabList;

pub use annota_primitives::{DbId, TimeStamp};
