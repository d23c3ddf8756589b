//! Tile sources, the persistent tile cache and tile loading for urltile.
//!
//! - [`TileSourceConfig`] is the declarative input, loaded from YAML.
//! - [`ResolvedTileSource`] turns requested addresses into URLs or file paths.
//! - [`TileCacheStore`] keeps fetched tiles in SQLite, with expiry and bulk import.
//! - [`TileSourceSelector`] decides which source is active and rebuilds it lazily.
//! - [`TileLoader`] fetches tile bytes with bounded concurrency and request coalescing.
//!
//! ```no_run
//! use std::sync::Arc;
//! use urltile_container::{TileLoader, TileSourceConfig, TileSourceSelector};
//! use urltile_core::TileAddress;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TileSourceConfig::from_string("url_template: https://tile.openstreetmap.org/{z}/{x}/{y}.png")?;
//!     let selector = Arc::new(TileSourceSelector::new(config));
//!     let loader = TileLoader::with_http(selector)?;
//!     let tile = loader.load(&TileAddress::new(3, 4, 2)?).await?;
//!     println!("{} bytes", tile.map_or(0, |blob| blob.len()));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod loader;
pub mod selector;
pub mod source;

pub use cache::*;
pub use config::*;
pub use loader::*;
pub use selector::*;
pub use source::*;
