use super::{ConfigChange, ConfigField};
use anyhow::Result;
use enumset::EnumSet;
use serde::{Deserialize, Deserializer};
use std::{
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
	time::Duration,
};
use urltile_core::{FILE_SCHEME, KeyScheme, is_local_template};
use urltile_derive::context;

/// Provider name under which tiles are cached unless configured otherwise.
pub const DEFAULT_PROVIDER: &str = "OsmMapTileSource";

/// Template used while no source is configured.
pub const NEUTRAL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// File name of the cache database inside `cache_path`.
pub const CACHE_FILE_NAME: &str = "cache.db";

/// Tile size used when `double_tile_size` is set.
pub const DOUBLE_TILE_SIZE: u32 = 512;

/// Configuration of one tile source, as loaded from YAML.
///
/// ```yaml
/// url_template: "https://tile.example.org/{z}/{x}/{y}.png"
/// max_native_zoom: 15
/// cache_path: "/var/cache/tiles"
/// cache_max_age_seconds: 86400
/// opacity: 0.8
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TileSourceConfig {
	/// URL template with `{z}`, `{x}`, `{y}` placeholders, or a local tile directory.
	pub url_template: String,
	pub min_zoom: u8,
	pub max_zoom: u8,
	/// Highest zoom with real imagery. Negative values mean unrestricted.
	#[serde(deserialize_with = "deserialize_native_zoom")]
	pub max_native_zoom: Option<u8>,
	/// Serve remote sources from the cache only.
	pub offline_mode: bool,
	/// Directory of the tile cache. A `file://` prefix is accepted.
	#[serde(deserialize_with = "deserialize_cache_path")]
	pub cache_path: Option<PathBuf>,
	/// Lifetime of cached tiles. `0` keeps the default of ten years.
	pub cache_max_age_seconds: u64,
	pub tile_size: u32,
	pub double_tile_size: bool,
	/// Use TMS row numbering.
	pub flip_y: bool,
	/// Layer opacity in `[0, 1]`.
	#[serde(deserialize_with = "deserialize_opacity")]
	pub opacity: f32,
	/// Name under which tiles of this source are cached.
	pub provider: String,
	/// Packing of tile addresses into cache keys.
	#[serde(deserialize_with = "deserialize_key_scheme")]
	pub key_scheme: KeyScheme,
	/// Upper bound of concurrent tile fetches.
	pub max_concurrent_fetches: usize,
}

impl Default for TileSourceConfig {
	fn default() -> Self {
		TileSourceConfig {
			url_template: String::new(),
			min_zoom: 0,
			max_zoom: 20,
			max_native_zoom: None,
			offline_mode: false,
			cache_path: None,
			cache_max_age_seconds: 0,
			tile_size: 256,
			double_tile_size: false,
			flip_y: false,
			opacity: 1.0,
			provider: DEFAULT_PROVIDER.to_string(),
			key_scheme: KeyScheme::default(),
			max_concurrent_fetches: 12,
		}
	}
}

impl TileSourceConfig {
	/// A configuration for the given template with every other field at its default.
	pub fn from_template(url_template: &str) -> Self {
		TileSourceConfig {
			url_template: url_template.to_string(),
			..TileSourceConfig::default()
		}
	}

	/// The configuration of the neutral fallback source.
	pub fn neutral() -> Self {
		TileSourceConfig::from_template(NEUTRAL_TEMPLATE)
	}

	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	#[context("reading tile source config {:?}", path)]
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path)?;
		TileSourceConfig::from_reader(BufReader::new(file))
	}

	/// Whether the template points to a local tile directory.
	pub fn is_local(&self) -> bool {
		is_local_template(&self.url_template)
	}

	/// Tile size after applying `double_tile_size`.
	pub fn effective_tile_size(&self) -> u32 {
		if self.double_tile_size {
			DOUBLE_TILE_SIZE
		} else {
			self.tile_size
		}
	}

	/// Lifetime overriding the default expiration of cached tiles, `None` if not set.
	pub fn expiration_override(&self) -> Option<Duration> {
		(self.cache_max_age_seconds > 0).then(|| Duration::from_secs(self.cache_max_age_seconds))
	}

	/// The fields that differ between `old` and `new`.
	pub fn diff(old: &TileSourceConfig, new: &TileSourceConfig) -> EnumSet<ConfigField> {
		let mut fields = EnumSet::new();
		let mut check = |changed: bool, field: ConfigField| {
			if changed {
				fields.insert(field);
			}
		};
		check(old.url_template != new.url_template, ConfigField::UrlTemplate);
		check(old.min_zoom != new.min_zoom, ConfigField::MinZoom);
		check(old.max_zoom != new.max_zoom, ConfigField::MaxZoom);
		check(old.max_native_zoom != new.max_native_zoom, ConfigField::MaxNativeZoom);
		check(old.offline_mode != new.offline_mode, ConfigField::OfflineMode);
		check(old.cache_path != new.cache_path, ConfigField::CachePath);
		check(old.cache_max_age_seconds != new.cache_max_age_seconds, ConfigField::CacheMaxAge);
		check(old.tile_size != new.tile_size, ConfigField::TileSize);
		check(old.double_tile_size != new.double_tile_size, ConfigField::DoubleTileSize);
		check(old.flip_y != new.flip_y, ConfigField::FlipY);
		check(old.opacity.to_bits() != new.opacity.to_bits(), ConfigField::Opacity);
		check(old.provider != new.provider, ConfigField::Provider);
		check(old.key_scheme != new.key_scheme, ConfigField::KeyScheme);
		check(old.max_concurrent_fetches != new.max_concurrent_fetches, ConfigField::MaxConcurrentFetches);
		fields
	}

	/// Apply a single field change and report which field it was.
	pub fn apply(&mut self, change: ConfigChange) -> ConfigField {
		let field = change.field();
		match change {
			ConfigChange::UrlTemplate(value) => self.url_template = value,
			ConfigChange::MinZoom(value) => self.min_zoom = value,
			ConfigChange::MaxZoom(value) => self.max_zoom = value,
			ConfigChange::MaxNativeZoom(value) => self.max_native_zoom = native_zoom_from_signed(value),
			ConfigChange::OfflineMode(value) => self.offline_mode = value,
			ConfigChange::CachePath(value) => self.cache_path = value.as_deref().map(cache_path_from_str),
			ConfigChange::CacheMaxAge(value) => self.cache_max_age_seconds = value,
			ConfigChange::TileSize(value) => self.tile_size = value,
			ConfigChange::DoubleTileSize(value) => self.double_tile_size = value,
			ConfigChange::FlipY(value) => self.flip_y = value,
			ConfigChange::Opacity(value) => self.opacity = clamp_opacity(value),
			ConfigChange::Provider(value) => self.provider = value,
			ConfigChange::KeyScheme(value) => self.key_scheme = value,
			ConfigChange::MaxConcurrentFetches(value) => self.max_concurrent_fetches = value,
		}
		field
	}

	/// Clamp values that may have been set directly into their valid range.
	pub fn normalized(mut self) -> Self {
		self.opacity = clamp_opacity(self.opacity);
		self
	}
}

/// `[0, 1]`, with NaN treated as fully opaque.
pub fn clamp_opacity(opacity: f32) -> f32 {
	if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) }
}

fn native_zoom_from_signed(value: i64) -> Option<u8> {
	if value < 0 {
		None
	} else {
		Some(u8::try_from(value).unwrap_or(u8::MAX))
	}
}

fn cache_path_from_str(value: &str) -> PathBuf {
	PathBuf::from(value.strip_prefix(FILE_SCHEME).unwrap_or(value))
}

fn deserialize_native_zoom<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
	let value = Option::<i64>::deserialize(deserializer)?;
	Ok(value.and_then(native_zoom_from_signed))
}

fn deserialize_cache_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
	let value = Option::<String>::deserialize(deserializer)?;
	Ok(value.filter(|path| !path.trim().is_empty()).map(|path| cache_path_from_str(path.trim())))
}

fn deserialize_opacity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
	Ok(clamp_opacity(f32::deserialize(deserializer)?))
}

fn deserialize_key_scheme<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KeyScheme, D::Error> {
	let value = String::deserialize(deserializer)?;
	KeyScheme::try_from(value.as_str()).map_err(serde::de::Error::custom)
}
