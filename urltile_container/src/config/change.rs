use enumset::{EnumSet, EnumSetType};
use urltile_core::KeyScheme;

/// Derived state that depends on parts of a [`TileSourceConfig`](super::TileSourceConfig).
#[derive(EnumSetType, Debug)]
pub enum Artifact {
	/// The resolved tile source: template, zoom rules and mode.
	Source,
	/// The cache database handle.
	Cache,
	/// The opacity filter over the rendered layer.
	Overlay,
	/// The fetch concurrency limit.
	Loader,
}

impl Artifact {
	/// Artifacts whose rebuild changes which tiles are fetched or stored.
	pub fn rebuilding() -> EnumSet<Artifact> {
		Artifact::Source | Artifact::Cache
	}
}

/// One field of a [`TileSourceConfig`](super::TileSourceConfig).
#[derive(EnumSetType, Debug)]
pub enum ConfigField {
	UrlTemplate,
	MinZoom,
	MaxZoom,
	MaxNativeZoom,
	OfflineMode,
	CachePath,
	CacheMaxAge,
	TileSize,
	DoubleTileSize,
	FlipY,
	Opacity,
	Provider,
	KeyScheme,
	MaxConcurrentFetches,
}

impl ConfigField {
	/// The artifact that has to be rebuilt when this field changes.
	pub fn artifact(self) -> Artifact {
		match self {
			ConfigField::UrlTemplate
			| ConfigField::MinZoom
			| ConfigField::MaxZoom
			| ConfigField::MaxNativeZoom
			| ConfigField::OfflineMode
			| ConfigField::TileSize
			| ConfigField::DoubleTileSize
			| ConfigField::FlipY
			| ConfigField::Provider => Artifact::Source,
			ConfigField::CachePath | ConfigField::CacheMaxAge | ConfigField::KeyScheme => Artifact::Cache,
			ConfigField::Opacity => Artifact::Overlay,
			ConfigField::MaxConcurrentFetches => Artifact::Loader,
		}
	}

	/// The artifacts affected by a set of changed fields.
	pub fn artifacts(fields: EnumSet<ConfigField>) -> EnumSet<Artifact> {
		fields.iter().map(ConfigField::artifact).collect()
	}
}

/// A single property update, as delivered by a host that sets fields one by one.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigChange {
	UrlTemplate(String),
	MinZoom(u8),
	MaxZoom(u8),
	/// Negative values clear the native zoom.
	MaxNativeZoom(i64),
	OfflineMode(bool),
	CachePath(Option<String>),
	CacheMaxAge(u64),
	TileSize(u32),
	DoubleTileSize(bool),
	FlipY(bool),
	Opacity(f32),
	Provider(String),
	KeyScheme(KeyScheme),
	MaxConcurrentFetches(usize),
}

impl ConfigChange {
	pub fn field(&self) -> ConfigField {
		match self {
			ConfigChange::UrlTemplate(_) => ConfigField::UrlTemplate,
			ConfigChange::MinZoom(_) => ConfigField::MinZoom,
			ConfigChange::MaxZoom(_) => ConfigField::MaxZoom,
			ConfigChange::MaxNativeZoom(_) => ConfigField::MaxNativeZoom,
			ConfigChange::OfflineMode(_) => ConfigField::OfflineMode,
			ConfigChange::CachePath(_) => ConfigField::CachePath,
			ConfigChange::CacheMaxAge(_) => ConfigField::CacheMaxAge,
			ConfigChange::TileSize(_) => ConfigField::TileSize,
			ConfigChange::DoubleTileSize(_) => ConfigField::DoubleTileSize,
			ConfigChange::FlipY(_) => ConfigField::FlipY,
			ConfigChange::Opacity(_) => ConfigField::Opacity,
			ConfigChange::Provider(_) => ConfigField::Provider,
			ConfigChange::KeyScheme(_) => ConfigField::KeyScheme,
			ConfigChange::MaxConcurrentFetches(_) => ConfigField::MaxConcurrentFetches,
		}
	}
}
