//! # urltile
//!
//! Resolve tile requests against URL templates and local tile pyramids, and keep
//! fetched tiles in a persistent SQLite cache.
//!
//! This crate re-exports the building blocks:
//!
//! - [`core`]: tile addresses, storage keys, template parsing and the zoom/row resolver
//! - [`container`]: configuration, tile sources, the cache, the source selector and the loader
//!
//! ```
//! use urltile::{container::*, core::*};
//!
//! let config = TileSourceConfig::from_string(
//! 	"url_template: https://tiles.example.org/{z}/{x}/{y}.png\nmax_native_zoom: 15\nflip_y: true",
//! )
//! .unwrap();
//! let selector = TileSourceSelector::new(config);
//! let active = selector.active_source().unwrap();
//! let location = active.source.locate(&TileAddress::new(18, 8, 16).unwrap()).unwrap();
//! assert_eq!(location.unwrap().to_string(), "https://tiles.example.org/15/1/32765.png");
//! ```

pub use urltile_container as container;
pub use urltile_core as core;
