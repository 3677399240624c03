use std::io::Write;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::LogicError;
use crate::farg::{FargKind, FargType};

const EXAMPLE: &str = r#"
ticks_per_second = 60

[[predicate]]
name = "holds"
var_len = true
args = [
    { name = "<who>", type = "nominal", approved = ["alice", "bob"] },
    { name = "<what>", type = "untyped" },
]

[[column]]
name = "trial"
args = [
    { name = "<n>", type = "integer", min = 0, max = 100 },
    { name = "<act>", type = "predicate", approved = ["holds"] },
]

[[column]]
name = "notes"
type = "text"
"#;

/// The documented example builds the vocabulary it describes.
#[test]
fn test_example_builds() {
	let config = DbConfig::parse(EXAMPLE).unwrap();
	assert_eq!(config.predicate.len(), 1);
	assert_eq!(config.column[1].matrix_type, MatrixType::Text);

	let db = config.build().unwrap();
	let holds = db.get_vocab_element_by_name("holds").unwrap();
	assert!(holds.var_len());
	assert_eq!(holds.fargs()[0].farg_type(), FargType::Nominal);
	assert_eq!(holds.fargs()[1].farg_type(), FargType::Untyped);

	let trial = db.column_by_name("trial").unwrap();
	let mve = db.get_vocab_element(trial.mve_id()).unwrap();
	assert_eq!(mve.num_fargs(), 2);
	match mve.fargs()[1].kind() {
		FargKind::Predicate(set) => assert!(set.members.contains(&holds.id())),
		other => panic!("unexpected kind {other:?}"),
	}
	assert!(matches!(mve.fargs()[0].kind(), FargKind::Integer(b) if b.min == 0 && b.max == 100));
	assert_eq!(db.column_by_name("notes").unwrap().matrix_type(), MatrixType::Text);
}

/// An empty file is a database with the default tick rate and no vocabulary.
#[test]
fn test_empty_file_defaults() {
	let config = DbConfig::parse("").unwrap();
	assert_eq!(config, DbConfig::default());
	let db = config.build().unwrap();
	assert_eq!(db.tps(), DEFAULT_TICKS_PER_SECOND);
	assert!(db.vocab_list().is_empty());
}

/// Time-stamp bounds are ticks at the declared rate; flags carry through.
#[test]
fn test_arg_kinds() {
	let config = DbConfig::parse(
		r#"
ticks_per_second = 30

[[predicate]]
name = "span"
system = true
args = [
    { name = "<at>", type = "time_stamp", min = 0, max = 300 },
    { name = "<w>", type = "float", min = -1.0, max = 1.0 },
    { name = "<q>", type = "quote_string", hidden = true },
    { name = "<c>", type = "col_predicate" },
]
"#,
	)
	.unwrap();
	let db = config.build().unwrap();
	let span = db.get_vocab_element_by_name("span").unwrap();
	assert!(span.system());
	let fargs = span.fargs();
	match fargs[0].kind() {
		FargKind::TimeStamp(b) => {
			assert!(b.sub_range);
			assert_eq!(b.max, TimeStamp::new(30, 300).unwrap());
		}
		other => panic!("unexpected kind {other:?}"),
	}
	assert!(fargs[1].sub_range());
	assert!(fargs[2].hidden());
	assert_eq!(fargs[2].farg_type(), FargType::QuoteString);
	assert_eq!(fargs[3].farg_type(), FargType::ColPredicate);
}

#[test]
fn test_unknown_approved_predicate() {
	let err = DbConfig::parse(
		r#"
[[column]]
name = "trial"
args = [{ name = "<act>", type = "predicate", approved = ["ghost"] }]
"#,
	)
	.unwrap()
	.build()
	.unwrap_err();
	assert!(matches!(
		err,
		ConfigError::UnknownPredicate { ref arg, ref name } if arg == "<act>" && name == "ghost"
	));
}

/// Half-open bounds and argument lists on typed columns are refused.
#[test]
fn test_invalid_args() {
	let half = DbConfig::parse(
		r#"
[[predicate]]
name = "foo"
args = [{ name = "<n>", type = "integer", min = 1 }]
"#,
	)
	.unwrap();
	assert!(matches!(half.build(), Err(ConfigError::InvalidArg { .. })));

	let typed = DbConfig::parse(
		r#"
[[column]]
name = "count"
type = "integer"
args = [{ name = "<n>", type = "integer" }]
"#,
	)
	.unwrap();
	assert!(matches!(typed.build(), Err(ConfigError::InvalidArg { .. })));
}

/// Database rejections name the declaration they came from.
#[test]
fn test_rejections_carry_context() {
	let columns = DbConfig::parse(
		r#"
[[column]]
name = "trial"

[[column]]
name = "trial"
"#,
	)
	.unwrap();
	match columns.build() {
		Err(ConfigError::Column { name, error }) => {
			assert_eq!(name, "trial");
			assert_eq!(error, DbError::Logic(LogicError::ColumnExists("trial".into())));
		}
		other => panic!("unexpected result {other:?}"),
	}

	let empty = DbConfig::parse("[[predicate]]\nname = \"bare\"\n").unwrap();
	match empty.build() {
		Err(ConfigError::Predicate { name, error }) => {
			assert_eq!(name, "bare");
			assert_eq!(error, DbError::Logic(LogicError::NoArguments));
		}
		other => panic!("unexpected result {other:?}"),
	}

	let rate = DbConfig::parse("ticks_per_second = 0").unwrap();
	assert!(matches!(rate.build(), Err(ConfigError::Db(_))));
}

#[test]
fn test_unknown_field_is_parse_error() {
	assert!(matches!(
		DbConfig::parse("tick_rate = 60"),
		Err(ConfigError::Toml(_))
	));
	assert!(matches!(
		DbConfig::parse("[[column]]\nname = \"x\"\ntype = \"bogus\"\n"),
		Err(ConfigError::Toml(_))
	));
}

#[test]
fn test_load_from_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(EXAMPLE.as_bytes()).unwrap();
	let config = DbConfig::load(file.path()).unwrap();
	assert_eq!(config, DbConfig::parse(EXAMPLE).unwrap());
}

#[test]
fn test_load_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("missing.toml");
	match DbConfig::load(&path) {
		Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
		other => panic!("unexpected result {other:?}"),
	}
}
