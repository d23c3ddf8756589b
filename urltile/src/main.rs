mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Import tile files into a tile cache
	Import(tools::import::Subcommand),

	/// Print the URL or file path a tile request resolves to
	Resolve(tools::resolve::Subcommand),

	/// Load one tile through the configured source and cache
	Fetch(tools::fetch::Subcommand),

	/// Remove expired tiles from a tile cache
	Evict(tools::evict::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Import(arguments) => tools::import::run(arguments),
		Commands::Resolve(arguments) => tools::resolve::run(arguments),
		Commands::Fetch(arguments) => tools::fetch::run(arguments),
		Commands::Evict(arguments) => tools::evict::run(arguments),
	}
}
