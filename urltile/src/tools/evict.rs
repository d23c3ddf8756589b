use anyhow::{Result, ensure};
use clap::Args;
use std::path::PathBuf;
use urltile_container::{TileCacheStore, Timestamp};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory of the tile cache
	#[arg(required = true)]
	cache_dir: PathBuf,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let dir = &arguments.cache_dir;
	ensure!(dir.is_dir(), "cache directory {dir:?} does not exist");

	let store = TileCacheStore::open_dir(dir)?;
	let removed = store.evict_expired(Timestamp::now())?;
	println!("removed {removed} expired tiles, {} remaining", store.count()?);
	Ok(())
}
