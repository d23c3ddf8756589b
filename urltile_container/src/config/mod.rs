//! Declarative configuration of a tile source.
//!
//! A [`TileSourceConfig`] is an immutable snapshot. Changes produce a new snapshot;
//! [`TileSourceConfig::diff`] reports which [`ConfigField`]s differ, and every field
//! maps to the derived [`Artifact`] that has to be rebuilt when it changes.

mod change;
mod tile_source;

pub use change::*;
pub use tile_source::*;
