//! Loading tile bytes for the active source.
//!
//! [`TileLoader`] combines a [`TileSourceSelector`], the cache of the active source and
//! a [`TileFetcher`]:
//!
//! | mode        | cache read       | fetch | cache write |
//! |-------------|------------------|-------|-------------|
//! | `Online`    | fresh hits       | yes   | yes         |
//! | `Offline`   | stale hits too   | no    | no          |
//! | `LocalFile` | none             | yes   | no          |
//!
//! Fetches run under a semaphore sized by `max_concurrent_fetches`. Concurrent loads
//! of one tile under one source generation share a single fetch. Each fetch runs as
//! its own task and finishes even when every caller gave up waiting. A result whose
//! generation is no longer current is returned to its callers but not cached.

mod fetcher;

pub use fetcher::*;

use crate::{ActiveSource, SourceMode, Timestamp, TileSourceSelector};
use anyhow::{Result, anyhow};
use arc_swap::ArcSwap;
use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
	FutureExt,
	future::{BoxFuture, Shared},
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use urltile_core::{Blob, TileAddress};
use urltile_derive::context;

type SharedFetch = Shared<BoxFuture<'static, Result<Option<Blob>, Arc<anyhow::Error>>>>;

/// One fetch per tile, source generation and mode.
type FetchKey = (TileAddress, u64, SourceMode);

#[derive(Debug)]
struct Limiter {
	permits: usize,
	semaphore: Arc<Semaphore>,
}

impl Limiter {
	fn new(permits: usize) -> Self {
		let permits = permits.max(1);
		Limiter {
			permits,
			semaphore: Arc::new(Semaphore::new(permits)),
		}
	}
}

pub struct TileLoader {
	selector: Arc<TileSourceSelector>,
	fetcher: Arc<dyn TileFetcher>,
	limiter: ArcSwap<Limiter>,
	in_flight: Arc<DashMap<FetchKey, SharedFetch>>,
}

impl TileLoader {
	pub fn new(selector: Arc<TileSourceSelector>, fetcher: Arc<dyn TileFetcher>) -> Self {
		let permits = selector.config().max_concurrent_fetches;
		TileLoader {
			selector,
			fetcher,
			limiter: ArcSwap::from_pointee(Limiter::new(permits)),
			in_flight: Arc::new(DashMap::new()),
		}
	}

	/// A loader that downloads remote tiles with an [`HttpFetcher`].
	pub fn with_http(selector: Arc<TileSourceSelector>) -> Result<Self> {
		Ok(TileLoader::new(selector, Arc::new(HttpFetcher::new()?)))
	}

	pub fn selector(&self) -> &Arc<TileSourceSelector> {
		&self.selector
	}

	/// Number of distinct fetches currently running.
	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	/// Load the bytes of `requested` from the active (or neutral) source.
	///
	/// `Ok(None)` means the tile does not exist or is outside the served zoom range.
	#[context("loading tile {requested}")]
	pub async fn load(&self, requested: &TileAddress) -> Result<Option<Blob>> {
		requested.validate()?;
		let active = self.selector.active_or_neutral();
		if !active.source.covers(requested.z) {
			return Ok(None);
		}

		match active.mode {
			SourceMode::Offline => {
				let Some(cache) = &active.cache else {
					return Ok(None);
				};
				let record = cache.get(cache.key_for(requested), &active.provider)?;
				Ok(record.map(|record| record.bytes))
			}
			SourceMode::Online | SourceMode::Unconfigured => {
				if let Some(cache) = &active.cache {
					let key = cache.key_for(requested);
					if let Some(record) = cache.get_fresh(key, &active.provider, Timestamp::now())? {
						log::trace!("cache hit for {requested}");
						return Ok(Some(record.bytes));
					}
				}
				self.fetch_shared(*requested, active).await
			}
			SourceMode::LocalFile => self.fetch_shared(*requested, active).await,
		}
	}

	async fn fetch_shared(&self, requested: TileAddress, active: Arc<ActiveSource>) -> Result<Option<Blob>> {
		let key = (requested, active.generation, active.mode);
		let fetch = match self.in_flight.entry(key) {
			Entry::Occupied(entry) => entry.get().clone(),
			Entry::Vacant(entry) => {
				let registration = InFlight {
					map: Arc::clone(&self.in_flight),
					key,
				};
				let task = tokio::spawn({
					let selector = Arc::clone(&self.selector);
					let fetcher = Arc::clone(&self.fetcher);
					let semaphore = self.semaphore();
					async move {
						let _registration = registration;
						fetch_tile(requested, active, selector, fetcher, semaphore).await
					}
				});
				let fetch = async move {
					match task.await {
						Ok(result) => result,
						Err(error) => Err(Arc::new(anyhow::Error::from(error).context("tile fetch task failed"))),
					}
				}
				.boxed()
				.shared();
				entry.insert(fetch.clone());
				fetch
			}
		};

		fetch.await.map_err(|error| anyhow!("{error:#}"))
	}

	/// The semaphore for the configured limit, replaced when the limit changes.
	fn semaphore(&self) -> Arc<Semaphore> {
		let permits = self.selector.config().max_concurrent_fetches.max(1);
		let current = self.limiter.load();
		if current.permits == permits {
			return Arc::clone(&current.semaphore);
		}
		log::debug!("fetch limit changed from {} to {permits}", current.permits);
		let limiter = Arc::new(Limiter::new(permits));
		self.limiter.store(Arc::clone(&limiter));
		Arc::clone(&limiter.semaphore)
	}
}

/// Removes a fetch from the in-flight map once its task ends.
struct InFlight {
	map: Arc<DashMap<FetchKey, SharedFetch>>,
	key: FetchKey,
}

impl Drop for InFlight {
	fn drop(&mut self) {
		self.map.remove(&self.key);
	}
}

async fn fetch_tile(
	requested: TileAddress,
	active: Arc<ActiveSource>,
	selector: Arc<TileSourceSelector>,
	fetcher: Arc<dyn TileFetcher>,
	semaphore: Arc<Semaphore>,
) -> Result<Option<Blob>, Arc<anyhow::Error>> {
	let result: Result<Option<Blob>> = async {
		let Some(location) = active.source.locate(&requested)? else {
			return Ok(None);
		};
		let _permit = semaphore.acquire_owned().await?;
		log::trace!("fetch {requested} from {location}");
		let blob = fetcher.fetch(&location).await?;

		if let (Some(blob), Some(cache), SourceMode::Online) = (&blob, &active.cache, active.mode) {
			if selector.is_current(active.generation) {
				if let Err(error) = cache.insert_tile(&requested, &active.provider, blob.as_slice(), None) {
					log::warn!("could not cache tile {requested}: {error:#}");
				}
			} else {
				log::debug!(
					"discarding stale tile {requested} of generation {}, not caching it",
					active.generation
				);
			}
		}
		Ok(blob)
	}
	.await;
	result.map_err(Arc::new)
}
