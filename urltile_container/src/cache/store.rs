//! SQLite backed tile cache.
//!
//! The database holds a single table:
//!
//! ```sql
//! CREATE TABLE tiles (key INTEGER, provider TEXT, tile BLOB, expires INTEGER, UNIQUE (key, provider));
//! CREATE INDEX expires_index ON tiles (expires);
//! ```
//!
//! `key` is a packed [`TileKey`], `expires` is in Unix milliseconds. Inserts are
//! `INSERT OR REPLACE`, so concurrent writers of the same tile never see a partial row.

use super::Timestamp;
use anyhow::Result;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{OptionalExtension, params},
};
use std::{
	fmt::{self, Debug},
	fs,
	path::{Path, PathBuf},
	time::Duration,
};
use urltile_core::{Blob, KeyScheme, TileAddress, TileKey};
use urltile_derive::context;

use crate::CACHE_FILE_NAME;

/// Lifetime of cached tiles without an explicit TTL or expiration override.
pub const DEFAULT_EXPIRATION_YEARS: u16 = 10;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tiles (key INTEGER, provider TEXT, tile BLOB, expires INTEGER, UNIQUE (key, provider));
	CREATE INDEX IF NOT EXISTS expires_index ON tiles (expires);";

/// One row of the cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CachedTileRecord {
	pub key: TileKey,
	pub provider: String,
	pub bytes: Blob,
	pub expires_at: Timestamp,
}

impl CachedTileRecord {
	pub fn is_expired(&self, now: Timestamp) -> bool {
		self.expires_at < now
	}
}

/// Persistent mapping from `(TileKey, provider)` to tile bytes with an expiry time.
pub struct TileCacheStore {
	pool: Pool<SqliteConnectionManager>,
	path: PathBuf,
	key_scheme: KeyScheme,
	expiration_override: Option<Duration>,
}

impl TileCacheStore {
	/// Open or create `cache.db` inside `dir`, creating the directory if needed.
	#[context("opening tile cache in {:?}", dir)]
	pub fn open_dir(dir: &Path) -> Result<TileCacheStore> {
		fs::create_dir_all(dir)?;
		TileCacheStore::open(&dir.join(CACHE_FILE_NAME))
	}

	/// Open or create the cache database at `path`.
	#[context("opening tile cache database {:?}", path)]
	pub fn open(path: &Path) -> Result<TileCacheStore> {
		log::debug!("open tile cache {path:?}");

		let manager = SqliteConnectionManager::file(path).with_init(|connection| connection.busy_timeout(BUSY_TIMEOUT));
		let pool = Pool::builder().max_size(10).build(manager)?;
		pool.get()?.execute_batch(SCHEMA)?;

		Ok(TileCacheStore {
			pool,
			path: path.to_path_buf(),
			key_scheme: KeyScheme::default(),
			expiration_override: None,
		})
	}

	#[must_use]
	pub fn with_key_scheme(mut self, key_scheme: KeyScheme) -> Self {
		self.key_scheme = key_scheme;
		self
	}

	/// Lifetime applied to inserts without an explicit TTL. `None` keeps the ten year default.
	#[must_use]
	pub fn with_expiration_override(mut self, expiration_override: Option<Duration>) -> Self {
		self.expiration_override = expiration_override;
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn key_scheme(&self) -> KeyScheme {
		self.key_scheme
	}

	pub fn expiration_override(&self) -> Option<Duration> {
		self.expiration_override
	}

	/// The key under which `address` is stored in this cache.
	pub fn key_for(&self, address: &TileAddress) -> TileKey {
		TileKey::new(address, self.key_scheme)
	}

	/// Expiry of a tile inserted at `now`: `ttl`, else the override, else ten calendar years.
	pub fn expires_at(&self, now: Timestamp, ttl: Option<Duration>) -> Timestamp {
		match ttl.or(self.expiration_override) {
			Some(duration) => now.plus(duration),
			None => now.plus_years(DEFAULT_EXPIRATION_YEARS),
		}
	}

	/// Insert or replace the tile stored under `(key, provider)`.
	#[context("inserting tile {key:?} for provider '{provider}'")]
	pub fn insert(&self, key: TileKey, provider: &str, bytes: &[u8], ttl: Option<Duration>) -> Result<()> {
		let expires = self.expires_at(Timestamp::now(), ttl);
		self.pool.get()?.execute(
			"INSERT OR REPLACE INTO tiles (key, provider, tile, expires) VALUES (?1, ?2, ?3, ?4)",
			params![key.as_i64(), provider, bytes, expires.as_millis()],
		)?;
		Ok(())
	}

	pub fn insert_tile(&self, address: &TileAddress, provider: &str, bytes: &[u8], ttl: Option<Duration>) -> Result<()> {
		self.insert(self.key_for(address), provider, bytes, ttl)
	}

	/// Insert the contents of a tile file.
	///
	/// An unreadable file is logged and stored as an empty tile.
	pub fn insert_file(&self, address: &TileAddress, provider: &str, path: &Path, ttl: Option<Duration>) -> Result<()> {
		let blob = read_tile_file(path);
		self.insert_tile(address, provider, blob.as_slice(), ttl)
	}

	/// Insert many tiles of one provider in a single transaction.
	#[context("inserting {} tiles for provider '{provider}'", tiles.len())]
	pub fn insert_batch(&self, provider: &str, tiles: &[(TileKey, Blob)], ttl: Option<Duration>) -> Result<()> {
		let expires = self.expires_at(Timestamp::now(), ttl);
		let mut connection = self.pool.get()?;
		let transaction = connection.transaction()?;
		{
			let mut statement =
				transaction.prepare("INSERT OR REPLACE INTO tiles (key, provider, tile, expires) VALUES (?1, ?2, ?3, ?4)")?;
			for (key, blob) in tiles {
				statement.execute(params![key.as_i64(), provider, blob.as_slice(), expires.as_millis()])?;
			}
		}
		transaction.commit()?;
		Ok(())
	}

	/// The record stored under `(key, provider)`, expired or not.
	#[context("reading tile {key:?} for provider '{provider}'")]
	pub fn get(&self, key: TileKey, provider: &str) -> Result<Option<CachedTileRecord>> {
		log::trace!("read tile {key:?} of '{provider}'");

		let connection = self.pool.get()?;
		let row = connection
			.query_row(
				"SELECT tile, expires FROM tiles WHERE key = ?1 AND provider = ?2",
				params![key.as_i64(), provider],
				|row| Ok((row.get::<_, Option<Vec<u8>>>(0)?, row.get::<_, i64>(1)?)),
			)
			.optional()?;

		Ok(row.map(|(tile, expires)| CachedTileRecord {
			key,
			provider: provider.to_string(),
			bytes: Blob::from(tile.unwrap_or_default()),
			expires_at: Timestamp::from_millis(expires),
		}))
	}

	/// Like [`get`](Self::get), but treats expired records as missing.
	pub fn get_fresh(&self, key: TileKey, provider: &str, now: Timestamp) -> Result<Option<CachedTileRecord>> {
		Ok(self.get(key, provider)?.filter(|record| !record.is_expired(now)))
	}

	/// Delete every record that expired before `now`, returning how many were removed.
	#[context("evicting expired tiles from {:?}", self.path)]
	pub fn evict_expired(&self, now: Timestamp) -> Result<usize> {
		let removed = self
			.pool
			.get()?
			.execute("DELETE FROM tiles WHERE expires < ?1", params![now.as_millis()])?;
		log::debug!("evicted {removed} expired tiles from {:?}", self.path);
		Ok(removed)
	}

	/// Number of stored records over all providers.
	pub fn count(&self) -> Result<u64> {
		let count: i64 = self
			.pool
			.get()?
			.query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))?;
		Ok(count as u64)
	}
}

impl Debug for TileCacheStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TileCacheStore")
			.field("path", &self.path)
			.field("key_scheme", &self.key_scheme)
			.field("expiration_override", &self.expiration_override)
			.finish()
	}
}

/// Read a whole tile file, falling back to an empty blob on I/O errors.
pub(crate) fn read_tile_file(path: &Path) -> Blob {
	match fs::read(path) {
		Ok(bytes) => Blob::from(bytes),
		Err(error) => {
			log::warn!("could not read tile file {path:?}, storing an empty tile: {error}");
			Blob::new_empty()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::{TempDir, prelude::*};

	fn store() -> (TempDir, TileCacheStore) {
		let dir = TempDir::new().unwrap();
		let store = TileCacheStore::open_dir(dir.path()).unwrap();
		(dir, store)
	}

	fn address(z: u8, x: u32, y: u32) -> TileAddress {
		TileAddress::new(z, x, y).unwrap()
	}

	#[test]
	fn open_dir_creates_database() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("a").join("b");
		let store = TileCacheStore::open_dir(&nested).unwrap();
		assert_eq!(store.path(), nested.join("cache.db"));
		assert!(store.path().exists());
		assert_eq!(store.count().unwrap(), 0);
	}

	#[test]
	fn open_fails_for_unwritable_location() {
		let dir = TempDir::new().unwrap();
		let file = dir.child("occupied");
		file.write_str("not a directory").unwrap();
		let error = TileCacheStore::open_dir(file.path()).unwrap_err();
		assert!(format!("{error:#}").contains("opening tile cache"));
	}

	#[test]
	fn insert_and_get() {
		let (_dir, store) = store();
		let key = store.key_for(&address(12, 100, 200));
		store.insert(key, "OsmMapTileSource", b"png bytes", None).unwrap();

		let record = store.get(key, "OsmMapTileSource").unwrap().unwrap();
		assert_eq!(record.key, key);
		assert_eq!(record.provider, "OsmMapTileSource");
		assert_eq!(record.bytes.as_slice(), b"png bytes");
		assert!(!record.is_expired(Timestamp::now()));

		assert_eq!(store.get(key, "Other").unwrap(), None);
	}

	#[test]
	fn insert_replaces_per_provider() {
		let (_dir, store) = store();
		let key = store.key_for(&address(3, 1, 2));
		store.insert(key, "a", b"first", None).unwrap();
		store.insert(key, "a", b"second", None).unwrap();
		store.insert(key, "b", b"other", None).unwrap();

		assert_eq!(store.count().unwrap(), 2);
		assert_eq!(store.get(key, "a").unwrap().unwrap().bytes.as_slice(), b"second");
		assert_eq!(store.get(key, "b").unwrap().unwrap().bytes.as_slice(), b"other");
	}

	#[test]
	fn default_expiry_is_ten_years() {
		let (_dir, store) = store();
		let now = Timestamp::now();
		assert_eq!(store.expires_at(now, None), now.plus_years(10));
		assert_eq!(store.expires_at(now, Some(Duration::from_secs(1))), now.plus(Duration::from_secs(1)));

		let store = store.with_expiration_override(Some(Duration::from_secs(60)));
		assert_eq!(store.expires_at(now, None), now.plus(Duration::from_secs(60)));
		assert_eq!(store.expires_at(now, Some(Duration::from_secs(5))), now.plus(Duration::from_secs(5)));
	}

	#[test]
	fn get_fresh_and_evict() {
		let (_dir, store) = store();
		let fresh = store.key_for(&address(1, 0, 0));
		let stale = store.key_for(&address(1, 1, 0));
		store.insert(fresh, "p", b"fresh", None).unwrap();
		store.insert(stale, "p", b"stale", Some(Duration::ZERO)).unwrap();

		let later = Timestamp::now().plus(Duration::from_secs(1));
		assert!(store.get_fresh(fresh, "p", later).unwrap().is_some());
		assert_eq!(store.get_fresh(stale, "p", later).unwrap(), None);
		assert!(store.get(stale, "p").unwrap().unwrap().is_expired(later));

		assert_eq!(store.evict_expired(later).unwrap(), 1);
		assert_eq!(store.count().unwrap(), 1);
		assert_eq!(store.get(stale, "p").unwrap(), None);
	}

	#[test]
	fn insert_file_falls_back_to_empty_blob() {
		let (dir, store) = store();
		let tile = dir.child("tile.png");
		tile.write_binary(b"\x89PNG").unwrap();

		store.insert_file(&address(2, 1, 1), "p", tile.path(), None).unwrap();
		store
			.insert_file(&address(2, 1, 2), "p", &dir.path().join("missing.png"), None)
			.unwrap();

		let key = store.key_for(&address(2, 1, 1));
		assert_eq!(store.get(key, "p").unwrap().unwrap().bytes.as_slice(), b"\x89PNG");
		let key = store.key_for(&address(2, 1, 2));
		assert!(store.get(key, "p").unwrap().unwrap().bytes.is_empty());
	}

	#[test]
	fn legacy_scheme_uses_legacy_keys() {
		let (_dir, store) = store();
		let store = store.with_key_scheme(KeyScheme::Legacy);
		assert_eq!(store.key_for(&address(3, 5, 0)).as_u64(), 64);
		assert_eq!(store.key_for(&address(4, 0, 0)).as_u64(), 64);
	}

	#[test]
	fn insert_batch_writes_all_rows() {
		let (_dir, store) = store();
		let tiles: Vec<(TileKey, Blob)> = (0..4)
			.map(|x| (store.key_for(&address(2, x, 0)), Blob::from(vec![x as u8])))
			.collect();
		store.insert_batch("p", &tiles, None).unwrap();
		assert_eq!(store.count().unwrap(), 4);
	}
}
