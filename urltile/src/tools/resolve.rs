use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use urltile_container::{SourceMode, TileSourceConfig, TileSourceSelector};
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
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = TileSourceConfig::from_path(&arguments.config)?;
	let selector = TileSourceSelector::new(config);
	let active = selector.active_or_neutral();
	if active.mode == SourceMode::Unconfigured {
		eprintln!("no usable tile source configured, using the neutral source");
	}

	let requested = TileAddress::new(arguments.z, arguments.x, arguments.y)?;
	match active.source.locate(&requested)? {
		Some(location) => println!("{location}"),
		None => bail!("zoom level {} is outside the served range", requested.z),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use assert_fs::{TempDir, prelude::*};

	#[test]
	fn resolve_online_tile() {
		let dir = TempDir::new().unwrap();
		let config = dir.child("source.yml");
		config
			.write_str("url_template: \"https://t/{z}/{x}/{y}.png\"\nmax_native_zoom: 15\nflip_y: true\n")
			.unwrap();

		run_command(vec!["urltile", "resolve", config.path().to_str().unwrap(), "18", "8", "16"]).unwrap();
	}

	#[test]
	fn resolve_rejects_out_of_range_tiles() {
		let dir = TempDir::new().unwrap();
		let config = dir.child("source.yml");
		config.write_str("url_template: \"https://t/{z}/{x}/{y}.png\"\n").unwrap();

		assert!(run_command(vec!["urltile", "resolve", config.path().to_str().unwrap(), "2", "4", "0"]).is_err());
	}
}
