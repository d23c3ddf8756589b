//! Zoom clamping and row flipping.
//!
//! [`resolve`] turns a requested tile address into the address that is actually
//! requested from the source:
//!
//! 1. Above `max_native_zoom` the address is replaced by its ancestor at
//!    `max_native_zoom` (integer division of `x` and `y` by `2^diff`).
//! 2. With `flip_y` the row is mirrored, `y' = 2^z - 1 - y`, using the zoom
//!    left after step 1.
//!
//! The order matters: mirroring with the requested zoom instead of the clamped one
//! yields rows outside the clamped grid.
//!
//! ```
//! use urltile_core::{TileAddress, resolve};
//!
//! let requested = TileAddress::new(18, 8, 16).unwrap();
//! let effective = resolve(&requested, Some(15), true).unwrap();
//! assert_eq!(effective, TileAddress::new(15, 1, 32765).unwrap());
//! ```

use crate::TileAddress;
use anyhow::Result;
use urltile_derive::context;

/// Addressing rules applied to every request of a tile source.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AddressRules {
	/// Highest zoom with real imagery. `None` means unrestricted.
	pub max_native_zoom: Option<u8>,
	/// Mirror rows (TMS numbering).
	pub flip_y: bool,
}

impl AddressRules {
	pub fn new(max_native_zoom: Option<u8>, flip_y: bool) -> Self {
		Self { max_native_zoom, flip_y }
	}

	/// Flip only, for sources whose files exist at every requested zoom.
	pub fn flip_only(&self) -> Self {
		Self {
			max_native_zoom: None,
			flip_y: self.flip_y,
		}
	}

	pub fn resolve(&self, requested: &TileAddress) -> Result<TileAddress> {
		resolve(requested, self.max_native_zoom, self.flip_y)
	}
}

/// Map a requested address to the effective source address.
///
/// # Errors
/// Fails closed with an error if `requested` is not a valid address, rather than
/// producing a wrapped or clamped coordinate.
#[context("resolving tile {requested:?} (max_native_zoom: {max_native_zoom:?}, flip_y: {flip_y})")]
pub fn resolve(requested: &TileAddress, max_native_zoom: Option<u8>, flip_y: bool) -> Result<TileAddress> {
	requested.validate()?;

	let mut effective = match max_native_zoom {
		Some(native) if requested.z > native => requested.ancestor_at(native),
		_ => *requested,
	};

	if flip_y {
		effective = effective.flipped_y();
	}

	Ok(effective)
}
