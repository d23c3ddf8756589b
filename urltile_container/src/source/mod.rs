//! Tile sources derived from a [`TileSourceConfig`].
//!
//! A [`ResolvedTileSource`] is built once per configuration snapshot and never
//! mutated. It captures the template base, the file extension and the addressing
//! rules, and turns a requested [`TileAddress`] into a [`TileLocation`]:
//!
//! - `Online`: the address is clamped to `max_native_zoom` and optionally flipped,
//!   then substituted into the URL template.
//! - `LocalFile`: the address is only flipped and mapped to
//!   `{base_dir}/{z}/{x}/{y}{extension}`.

mod location;
mod overlay;

pub use location::*;
pub use overlay::*;

use crate::{NEUTRAL_TEMPLATE, TileSourceConfig};
use anyhow::{Result, ensure};
use std::{
	fmt::{self, Display},
	path::PathBuf,
};
use urltile_core::{AddressRules, MAX_ZOOM, TileAddress, TileExtension, parse_template, substitute};
use urltile_derive::context;

/// Zoom range, tile size and addressing rules shared by both source kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SourceLayout {
	pub rules: AddressRules,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub tile_size: u32,
}

impl Default for SourceLayout {
	fn default() -> Self {
		SourceLayout {
			rules: AddressRules::default(),
			min_zoom: 0,
			max_zoom: 20,
			tile_size: 256,
		}
	}
}

impl SourceLayout {
	#[context("checking zoom range and tile size")]
	fn from_config(config: &TileSourceConfig) -> Result<SourceLayout> {
		let TileSourceConfig { min_zoom, max_zoom, .. } = *config;
		ensure!(min_zoom <= max_zoom, "min_zoom ({min_zoom}) must be <= max_zoom ({max_zoom})");
		ensure!(max_zoom <= MAX_ZOOM, "max_zoom ({max_zoom}) must be <= {MAX_ZOOM}");
		let tile_size = config.effective_tile_size();
		ensure!(tile_size > 0, "tile_size must be positive");

		Ok(SourceLayout {
			rules: AddressRules::new(config.max_native_zoom, config.flip_y),
			min_zoom,
			max_zoom,
			tile_size,
		})
	}

	/// Whether requests at zoom `z` are served at all.
	pub fn covers(&self, z: u8) -> bool {
		(self.min_zoom..=self.max_zoom).contains(&z)
	}
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ResolvedTileSource {
	Online {
		base_url: String,
		extension: TileExtension,
		layout: SourceLayout,
	},
	LocalFile {
		base_dir: PathBuf,
		extension: TileExtension,
		layout: SourceLayout,
	},
}

impl ResolvedTileSource {
	/// Build the source for `config`.
	///
	/// # Errors
	/// Returns an error for an empty or malformed template, an inverted or too deep
	/// zoom range, and a zero tile size.
	#[context("building tile source for '{}'", config.url_template)]
	pub fn build(config: &TileSourceConfig) -> Result<ResolvedTileSource> {
		let parsed = parse_template(&config.url_template)?;
		let layout = SourceLayout::from_config(config)?;

		Ok(if config.is_local() {
			ResolvedTileSource::LocalFile {
				base_dir: PathBuf::from(parsed.base),
				extension: parsed.extension,
				layout,
			}
		} else {
			ResolvedTileSource::Online {
				base_url: parsed.base,
				extension: parsed.extension,
				layout,
			}
		})
	}

	/// The OpenStreetMap source used while nothing else is configured.
	pub fn neutral() -> ResolvedTileSource {
		ResolvedTileSource::Online {
			base_url: NEUTRAL_TEMPLATE.to_string(),
			extension: TileExtension::Png,
			layout: SourceLayout::default(),
		}
	}

	pub fn is_local(&self) -> bool {
		matches!(self, ResolvedTileSource::LocalFile { .. })
	}

	pub fn extension(&self) -> TileExtension {
		match self {
			ResolvedTileSource::Online { extension, .. } | ResolvedTileSource::LocalFile { extension, .. } => *extension,
		}
	}

	pub fn layout(&self) -> &SourceLayout {
		match self {
			ResolvedTileSource::Online { layout, .. } | ResolvedTileSource::LocalFile { layout, .. } => layout,
		}
	}

	/// Tile size in pixels, 512 when `double_tile_size` was set.
	pub fn tile_size(&self) -> u32 {
		self.layout().tile_size
	}

	pub fn covers(&self, z: u8) -> bool {
		self.layout().covers(z)
	}

	/// The address requested from the underlying source for `requested`.
	///
	/// Local pyramids hold files at every zoom they serve, so only the row flip applies.
	pub fn source_address(&self, requested: &TileAddress) -> Result<TileAddress> {
		match self {
			ResolvedTileSource::Online { layout, .. } => layout.rules.resolve(requested),
			ResolvedTileSource::LocalFile { layout, .. } => layout.rules.flip_only().resolve(requested),
		}
	}

	/// URL or file path of the tile, `None` when the zoom is outside the served range.
	///
	/// # Errors
	/// Returns an error if `requested` is not a valid address.
	pub fn locate(&self, requested: &TileAddress) -> Result<Option<TileLocation>> {
		if !self.covers(requested.z) {
			return Ok(None);
		}
		let address = self.source_address(requested)?;
		Ok(Some(match self {
			ResolvedTileSource::Online { base_url, .. } => TileLocation::Url(substitute(base_url, &address)),
			ResolvedTileSource::LocalFile {
				base_dir, extension, ..
			} => TileLocation::File(
				base_dir
					.join(address.z.to_string())
					.join(address.x.to_string())
					.join(format!("{}{}", address.y, extension.as_str())),
			),
		}))
	}
}

/// `online https://…` or `local /path/{z}/{x}/{y}.png`
impl Display for ResolvedTileSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResolvedTileSource::Online { base_url, .. } => write!(f, "online {base_url}"),
			ResolvedTileSource::LocalFile {
				base_dir, extension, ..
			} => write!(f, "local {}/{{z}}/{{x}}/{{y}}{extension}", base_dir.display()),
		}
	}
}
