//! Choice of the active tile source.
//!
//! [`TileSourceSelector`] owns the current [`TileSourceConfig`] snapshot and the
//! [`ActiveSource`] derived from it. Updates only mark derived state dirty; the
//! source is rebuilt lazily on the next [`active_source`](TileSourceSelector::active_source)
//! call and published with a single atomic swap, so readers never see a half-built
//! source.
//!
//! | template        | `offline_mode` | mode                      |
//! |-----------------|----------------|---------------------------|
//! | local / file:// | any            | [`SourceMode::LocalFile`] |
//! | URL             | `true`         | [`SourceMode::Offline`]   |
//! | URL             | `false`        | [`SourceMode::Online`]    |
//!
//! Every rebuild that changes the source identity gets a new generation number.
//! Fetches remember the generation they started under and must not write into the
//! cache once it is no longer current.

use crate::{
	Artifact, ConfigChange, ConfigField, DEFAULT_PROVIDER, OverlayFilter, ResolvedTileSource, TileCacheStore,
	TileSourceConfig,
};
use arc_swap::{ArcSwap, ArcSwapOption};
use enumset::EnumSet;
use parking_lot::Mutex;
use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicU64, Ordering},
};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SourceMode {
	#[default]
	Unconfigured,
	/// Remote template with network access.
	Online,
	/// Remote template served from the cache only.
	Offline,
	/// Local tile pyramid.
	LocalFile,
}

/// The source tiles are currently served from.
#[derive(Debug)]
pub struct ActiveSource {
	pub mode: SourceMode,
	pub source: ResolvedTileSource,
	/// Provider name used for cache reads and writes.
	pub provider: String,
	pub generation: u64,
	pub cache: Option<Arc<TileCacheStore>>,
}

impl ActiveSource {
	pub fn network_enabled(&self) -> bool {
		matches!(self.mode, SourceMode::Online | SourceMode::Unconfigured)
	}

	fn same_identity(&self, other: &ActiveSource) -> bool {
		self.mode == other.mode
			&& self.source == other.source
			&& self.provider == other.provider
			&& match (&self.cache, &other.cache) {
				(Some(a), Some(b)) => Arc::ptr_eq(a, b),
				(None, None) => true,
				_ => false,
			}
	}
}

pub struct TileSourceSelector {
	config: ArcSwap<TileSourceConfig>,
	active: ArcSwapOption<ActiveSource>,
	dirty: Mutex<EnumSet<Artifact>>,
	rebuild: Mutex<()>,
	generation: AtomicU64,
	attached: AtomicBool,
}

impl TileSourceSelector {
	/// Create an attached selector. Nothing is built until the first use.
	pub fn new(config: TileSourceConfig) -> Self {
		TileSourceSelector {
			config: ArcSwap::from_pointee(config.normalized()),
			active: ArcSwapOption::empty(),
			dirty: Mutex::new(Artifact::rebuilding()),
			rebuild: Mutex::new(()),
			generation: AtomicU64::new(0),
			attached: AtomicBool::new(true),
		}
	}

	/// The current configuration snapshot.
	pub fn config(&self) -> Arc<TileSourceConfig> {
		self.config.load_full()
	}

	/// Replace the configuration and mark the affected artifacts dirty.
	///
	/// Returns the fields that changed.
	pub fn update(&self, config: TileSourceConfig) -> EnumSet<ConfigField> {
		let mut dirty = self.dirty.lock();
		self.store_config(&mut dirty, config)
	}

	/// Apply a single property change.
	///
	/// The snapshot is read and replaced under the dirty lock, so concurrent changes
	/// to different fields all survive.
	pub fn invalidate(&self, change: ConfigChange) -> EnumSet<ConfigField> {
		let mut dirty = self.dirty.lock();
		let mut config = TileSourceConfig::clone(&self.config.load());
		config.apply(change);
		self.store_config(&mut dirty, config)
	}

	fn store_config(&self, dirty: &mut EnumSet<Artifact>, config: TileSourceConfig) -> EnumSet<ConfigField> {
		let config = config.normalized();
		let changed = TileSourceConfig::diff(&self.config.load(), &config);
		if changed.is_empty() {
			return changed;
		}
		let artifacts = ConfigField::artifacts(changed);
		log::debug!("config changed: {changed:?}, invalidating {artifacts:?}");
		self.config.store(Arc::new(config));
		*dirty |= artifacts & Artifact::rebuilding();
		changed
	}

	/// The active source, rebuilding it first if the configuration changed.
	///
	/// Returns `None` while detached or when the configuration yields no source.
	pub fn active_source(&self) -> Option<Arc<ActiveSource>> {
		if !self.attached.load(Ordering::Acquire) {
			return None;
		}
		if self.dirty.lock().is_disjoint(Artifact::rebuilding()) {
			return self.active.load_full();
		}

		let _rebuild = self.rebuild.lock();
		let (config, pending) = {
			let mut dirty = self.dirty.lock();
			let pending = *dirty & Artifact::rebuilding();
			dirty.remove_all(pending);
			(self.config.load_full(), pending)
		};
		if pending.is_empty() {
			return self.active.load_full();
		}

		let previous = self.active.load_full();
		let next = self.reconfigure(&config, pending, previous.as_deref());
		let next = match (previous, next) {
			(Some(previous), Some(next)) if previous.same_identity(&next) => Some(previous),
			(None, None) => None,
			(_, next) => {
				// a dropped source needs a new generation too, the neutral fallback takes it over
				let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
				let next = next.map(|mut next| {
					next.generation = generation;
					Arc::new(next)
				});
				if next.is_none() {
					log::debug!("dropped tile source, generation {generation}");
				}
				if let Some(active) = &next {
					log::debug!(
						"configured {:?} source {} (provider '{}', cache {:?}, tile size {})",
						active.mode,
						active.source,
						active.provider,
						active.cache.as_ref().map(|cache| cache.path()),
						active.source.tile_size()
					);
				}
				next
			}
		};
		self.active.store(next.clone());
		next
	}

	/// The active source, or the neutral OpenStreetMap source if there is none.
	pub fn active_or_neutral(&self) -> Arc<ActiveSource> {
		self.active_source().unwrap_or_else(|| {
			Arc::new(ActiveSource {
				mode: SourceMode::Unconfigured,
				source: ResolvedTileSource::neutral(),
				provider: DEFAULT_PROVIDER.to_string(),
				generation: self.generation.load(Ordering::Acquire),
				cache: None,
			})
		})
	}

	pub fn mode(&self) -> SourceMode {
		self.active_source().map_or(SourceMode::Unconfigured, |active| active.mode)
	}

	/// Opacity filter of the layer. Never triggers a source rebuild.
	pub fn overlay_filter(&self) -> Option<OverlayFilter> {
		OverlayFilter::from_opacity(self.config.load().opacity)
	}

	/// Enable lazy configuration after a [`detach`](Self::detach).
	pub fn attach(&self) {
		*self.dirty.lock() |= Artifact::rebuilding();
		self.attached.store(true, Ordering::Release);
	}

	/// Release the active source and its cache handle and cancel in-flight work.
	pub fn detach(&self) {
		let _rebuild = self.rebuild.lock();
		self.attached.store(false, Ordering::Release);
		self.active.store(None);
		self.generation.fetch_add(1, Ordering::AcqRel);
		*self.dirty.lock() |= Artifact::rebuilding();
		log::debug!("detached tile source");
	}

	pub fn is_attached(&self) -> bool {
		self.attached.load(Ordering::Acquire)
	}

	/// Whether results of work started under `generation` may still be stored.
	pub fn is_current(&self, generation: u64) -> bool {
		self.attached.load(Ordering::Acquire)
			&& self.generation.load(Ordering::Acquire) == generation
			&& self.dirty.lock().is_disjoint(Artifact::rebuilding())
	}

	fn reconfigure(
		&self,
		config: &TileSourceConfig,
		pending: EnumSet<Artifact>,
		previous: Option<&ActiveSource>,
	) -> Option<ActiveSource> {
		let source = match ResolvedTileSource::build(config) {
			Ok(source) => source,
			Err(error) => {
				log::warn!("no tile source configured: {error:#}");
				return None;
			}
		};

		let mode = if source.is_local() {
			SourceMode::LocalFile
		} else if config.offline_mode {
			SourceMode::Offline
		} else {
			SourceMode::Online
		};

		let cache = if mode == SourceMode::LocalFile {
			None
		} else {
			let reusable = previous
				.filter(|_| !pending.contains(Artifact::Cache))
				.and_then(|previous| previous.cache.clone());
			reusable.or_else(|| open_cache(config))
		};
		if mode == SourceMode::Offline && cache.is_none() {
			log::warn!("offline mode without a usable cache, no tiles will be served");
		}

		Some(ActiveSource {
			mode,
			source,
			provider: config.provider.clone(),
			generation: 0,
			cache,
		})
	}
}

/// Open the configured cache, degrading to no cache on failure.
fn open_cache(config: &TileSourceConfig) -> Option<Arc<TileCacheStore>> {
	let dir = config.cache_path.as_ref()?;
	match TileCacheStore::open_dir(dir) {
		Ok(store) => Some(Arc::new(
			store
				.with_key_scheme(config.key_scheme)
				.with_expiration_override(config.expiration_override()),
		)),
		Err(error) => {
			log::warn!("tile cache unavailable, continuing without it: {error:#}");
			None
		}
	}
}
