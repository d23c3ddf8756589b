use anyhow::Result;
use clap::Args;
use std::{path::PathBuf, time::Duration};
use urltile_container::{DEFAULT_PROVIDER, ImportOptions, TileCacheStore};
use urltile_core::KeyScheme;

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory with tile files named "{z}_{x}_{y}.png",
	/// or a "{z}/{x}/{y}.png" pyramid when --tree is set
	#[arg(required = true, verbatim_doc_comment)]
	input: PathBuf,

	/// directory of the tile cache, the database is stored as "cache.db"
	#[arg(long, short, default_value = ".")]
	cache_dir: PathBuf,

	/// provider name stored with every tile
	#[arg(long, short, default_value = DEFAULT_PROVIDER)]
	provider: String,

	/// read a "{z}/{x}/{y}.<ext>" directory tree instead of a flat directory
	#[arg(long)]
	tree: bool,

	/// lifetime of the imported tiles in seconds, defaults to ten years
	#[arg(long, value_name = "SECONDS")]
	max_age: Option<u64>,

	/// cache key scheme: "fixed_width" or "legacy"
	#[arg(long, default_value = "fixed_width", value_parser = parse_key_scheme)]
	key_scheme: KeyScheme,

	/// log progress every 10 %
	#[arg(long)]
	progress: bool,
}

fn parse_key_scheme(value: &str) -> Result<KeyScheme> {
	KeyScheme::try_from(value)
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("import {:?} into {:?}", arguments.input, arguments.cache_dir);

	let store = TileCacheStore::open_dir(&arguments.cache_dir)?.with_key_scheme(arguments.key_scheme);
	let options = ImportOptions {
		provider: arguments.provider.clone(),
		ttl: arguments.max_age.map(Duration::from_secs),
		progress: arguments.progress,
	};

	let report = if arguments.tree {
		store.import_tree(&arguments.input, &options)?
	} else {
		store.import_directory(&arguments.input, &options)?
	};

	println!("inserted {} tiles, skipped {} files", report.inserted, report.skipped);
	Ok(())
}
