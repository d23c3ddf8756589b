//! Tile addressing for urltile: coordinates, storage keys, URL/path templates and
//! the zoom-clamping / row-flipping resolver.
//!
//! Everything in this crate is pure and synchronous. It can be called from any thread
//! and holds no shared mutable state.

pub mod resolver;
pub mod template;
pub mod types;

pub use resolver::*;
pub use template::*;
pub use types::*;
