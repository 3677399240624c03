//! Annota command-line loader.
//!
//! Builds a database from a vocabulary declaration file and prints its debug rendering, or
//! a one-line summary with `--summary`.

use std::path::PathBuf;

use annota_db::{DbConfig, DbString, VeKind};
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "annota")]
#[command(about = "Load an annota vocabulary declaration and print the resulting database")]
#[command(version)]
struct Args {
	/// Declaration file (TOML)
	#[arg(value_name = "PATH")]
	config: PathBuf,

	/// Print element and column counts instead of the full rendering
	#[arg(short, long)]
	summary: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if args.verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::WARN
		})
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	info!(path = %args.config.display(), "loading declarations");
	let config = DbConfig::load(&args.config)
		.with_context(|| format!("failed to read {}", args.config.display()))?;
	let db = config.build().context("declarations rejected")?;

	if args.summary {
		let count = |kind: VeKind| db.vocab_list().iter().filter(|ve| ve.kind() == kind).count();
		println!(
			"tps={} predicates={} matrices={} columns={}",
			db.tps(),
			count(VeKind::Predicate),
			count(VeKind::Matrix),
			db.columns().count()
		);
	} else {
		println!("{}", db.to_db_string());
	}
	Ok(())
}
