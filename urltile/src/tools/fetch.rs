use anyhow::{Result, bail};
use clap::Args;
use std::{io::Write, path::PathBuf, sync::Arc};
use urltile_container::{TileLoader, TileSourceConfig, TileSourceSelector};
use urltile_core::TileAddress;

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML file with the tile source configuration
	#[arg(required = true)]
	config: PathBuf,

	/// zoom level
	z: u8,

	/// column
	x: u32,

	/// row
	y: u32,

	/// write the tile to this file instead of stdout
	#[arg(long, short)]
	output: Option<PathBuf>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = TileSourceConfig::from_path(&arguments.config)?;
	let selector = Arc::new(TileSourceSelector::new(config));
	let loader = TileLoader::with_http(selector)?;

	let requested = TileAddress::new(arguments.z, arguments.x, arguments.y)?;
	let Some(blob) = loader.load(&requested).await? else {
		bail!("tile {requested} not found");
	};

	match &arguments.output {
		Some(path) => {
			std::fs::write(path, blob.as_slice())?;
			eprintln!("wrote {} bytes to {path:?}", blob.len());
		}
		None => std::io::stdout().write_all(blob.as_slice())?,
	}
	Ok(())
}
