//! Bulk import of tile files into a [`TileCacheStore`].
//!
//! Two layouts are understood:
//!
//! | layout | example              | method                                      |
//! |--------|----------------------|---------------------------------------------|
//! | flat   | `12_1331_2047.png`   | [`TileCacheStore::import_directory`]        |
//! | tree   | `12/1331/2047.png`   | [`TileCacheStore::import_tree`]             |
//!
//! Files that do not match the layout, or whose coordinates are out of range, are
//! skipped and counted. Unreadable tile files are stored as empty tiles.

use super::{TileCacheStore, store::read_tile_file};
use crate::DEFAULT_PROVIDER;
use anyhow::{Result, ensure};
use regex::{Regex, RegexBuilder};
use std::{
	fs,
	path::{Path, PathBuf},
	sync::LazyLock,
	time::Duration,
};
use urltile_core::{Blob, TileAddress, TileExtension, TileKey};
use urltile_derive::context;

/// Files read into memory before they are written in one transaction.
const BATCH_SIZE: usize = 256;

static RE_FLAT_NAME: LazyLock<Regex> = LazyLock::new(|| {
	RegexBuilder::new(r"^(\d+)_(\d+)_(\d+)\.(png|jpg|jpeg|webp)$")
		.case_insensitive(true)
		.build()
		.unwrap()
});

#[derive(Clone, Debug, PartialEq)]
pub struct ImportOptions {
	/// Provider name stored with every imported tile.
	pub provider: String,
	/// Lifetime of the imported tiles, `None` for the store default.
	pub ttl: Option<Duration>,
	/// Log progress every 10 %.
	pub progress: bool,
}

impl Default for ImportOptions {
	fn default() -> Self {
		ImportOptions {
			provider: DEFAULT_PROVIDER.to_string(),
			ttl: None,
			progress: false,
		}
	}
}

/// Outcome of an import.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ImportReport {
	pub inserted: u64,
	pub skipped: u64,
}

/// Parse a flat tile file name such as `12_1331_2047.png`.
///
/// ```
/// use urltile_container::parse_flat_filename;
///
/// let address = parse_flat_filename("12_100_200.png").unwrap();
/// assert_eq!((address.z, address.x, address.y), (12, 100, 200));
/// assert!(parse_flat_filename("12_100.png").is_none());
/// assert!(parse_flat_filename("2_4_0.png").is_none());
/// ```
pub fn parse_flat_filename(name: &str) -> Option<TileAddress> {
	let captures = RE_FLAT_NAME.captures(name)?;
	let z = captures.get(1)?.as_str().parse::<u8>().ok()?;
	let x = captures.get(2)?.as_str().parse::<u32>().ok()?;
	let y = captures.get(3)?.as_str().parse::<u32>().ok()?;
	TileAddress::new(z, x, y).ok()
}

impl TileCacheStore {
	/// Import every `{z}_{x}_{y}.<ext>` file of a flat directory.
	#[context("importing tiles from directory {:?}", dir)]
	pub fn import_directory(&self, dir: &Path, options: &ImportOptions) -> Result<ImportReport> {
		log::debug!("import flat directory {dir:?}");
		ensure!(dir.is_dir(), "path {dir:?} is not a directory");

		let mut report = ImportReport::default();
		let mut tiles = Vec::new();
		for entry in sorted_entries(dir)? {
			if !entry.is_file() {
				continue;
			}
			let name = entry.file_name().and_then(|name| name.to_str()).unwrap_or_default();
			if let Some(address) = parse_flat_filename(name) {
				tiles.push((address, entry));
			} else {
				log::debug!("skipping {entry:?}");
				report.skipped += 1;
			}
		}

		report.inserted = self.insert_files(tiles, options)?;
		log::info!("imported {} tiles from {dir:?}, skipped {}", report.inserted, report.skipped);
		Ok(report)
	}

	/// Import a `{z}/{x}/{y}.<ext>` pyramid, the layout of local tile sources.
	#[context("importing tile tree {:?}", dir)]
	pub fn import_tree(&self, dir: &Path, options: &ImportOptions) -> Result<ImportReport> {
		log::debug!("import tile tree {dir:?}");
		ensure!(dir.is_dir(), "path {dir:?} is not a directory");

		let mut report = ImportReport::default();
		let mut tiles = Vec::new();
		for level_dir in sorted_entries(dir)? {
			// z level
			let Some(level) = numeric_name::<u8>(&level_dir) else {
				continue;
			};
			if !level_dir.is_dir() {
				continue;
			}
			for column_dir in sorted_entries(&level_dir)? {
				// x level
				let Some(x) = numeric_name::<u32>(&column_dir) else {
					continue;
				};
				if !column_dir.is_dir() {
					continue;
				}
				for file in sorted_entries(&column_dir)? {
					// y level
					match tree_address(level, x, &file) {
						Some(address) => tiles.push((address, file)),
						None => {
							log::debug!("skipping {file:?}");
							report.skipped += 1;
						}
					}
				}
			}
		}

		report.inserted = self.insert_files(tiles, options)?;
		log::info!("imported {} tiles from {dir:?}, skipped {}", report.inserted, report.skipped);
		Ok(report)
	}

	fn insert_files(&self, tiles: Vec<(TileAddress, PathBuf)>, options: &ImportOptions) -> Result<u64> {
		let mut progress = Progress::new(tiles.len(), options.progress);
		let mut inserted = 0;
		for chunk in tiles.chunks(BATCH_SIZE) {
			let batch: Vec<(TileKey, Blob)> = chunk
				.iter()
				.map(|(address, path)| (self.key_for(address), read_tile_file(path)))
				.collect();
			self.insert_batch(&options.provider, &batch, options.ttl)?;
			inserted += batch.len();
			progress.set_position(inserted);
		}
		Ok(inserted as u64)
	}
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
	let mut entries = fs::read_dir(dir)?
		.filter_map(|entry| entry.ok().map(|entry| entry.path()))
		.collect::<Vec<_>>();
	entries.sort();
	Ok(entries)
}

fn numeric_name<T: std::str::FromStr>(path: &Path) -> Option<T> {
	path.file_name()?.to_str()?.parse::<T>().ok()
}

fn tree_address(z: u8, x: u32, file: &Path) -> Option<TileAddress> {
	if !file.is_file() {
		return None;
	}
	let mut name = file.file_name()?.to_str()?.to_string();
	TileExtension::from_filename(&mut name)?;
	let y = name.parse::<u32>().ok()?;
	TileAddress::new(z, x, y).ok()
}

/// Logs `done/total` at every 10 % step.
struct Progress {
	total: usize,
	next_step: usize,
	enabled: bool,
}

impl Progress {
	fn new(total: usize, enabled: bool) -> Self {
		Progress {
			total,
			next_step: 1,
			enabled,
		}
	}

	fn set_position(&mut self, done: usize) {
		if !self.enabled || self.total == 0 {
			return;
		}
		while self.next_step <= 10 && done * 10 >= self.next_step * self.total {
			log::info!("import {}% ({done}/{})", self.next_step * 10, self.total);
			self.next_step += 1;
		}
	}
}
