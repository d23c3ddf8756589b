//! Three-dimensional tile addresses in a quad-tree tile pyramid.
//!
//! A [`TileAddress`] names one tile at zoom `z`; both `x` and `y` lie in `0..2^z`.
//!
//! ```
//! use urltile_core::TileAddress;
//!
//! let address = TileAddress::new(5, 6, 7).unwrap();
//! assert_eq!(address.max_index(), 31);
//! assert_eq!(address.flipped_y().y, 24);
//! assert!(TileAddress::new(2, 4, 0).is_err());
//! ```

use anyhow::{Result, ensure};
use std::fmt::{self, Debug, Display};

/// Highest zoom level a [`TileAddress`] may carry.
///
/// Chosen so that every valid address packs into a fixed-width 64 bit key
/// (see [`TileKey`](crate::TileKey)).
pub const MAX_ZOOM: u8 = 28;

/// A tile coordinate with zoom level `z` and column/row indices `x`, `y`.
#[derive(Eq, PartialEq, Clone, Copy, Hash)]
pub struct TileAddress {
	/// The zoom level of the tile.
	pub z: u8,
	/// The column index of the tile.
	pub x: u32,
	/// The row index of the tile.
	pub y: u32,
}

impl TileAddress {
	/// Create a new `TileAddress`.
	///
	/// # Errors
	/// Returns an error if `z` > [`MAX_ZOOM`] or if `x` or `y` are not below `2^z`.
	pub fn new(z: u8, x: u32, y: u32) -> Result<TileAddress> {
		let address = TileAddress { z, x, y };
		address.validate()?;
		Ok(address)
	}

	/// Check the invariants of an address whose fields were set directly.
	pub fn validate(&self) -> Result<()> {
		let TileAddress { z, x, y } = *self;
		ensure!(z <= MAX_ZOOM, "zoom ({z}) must be <= {MAX_ZOOM}");
		let size = 1u64 << z;
		ensure!(u64::from(x) < size, "x ({x}) out of bounds for zoom {z}");
		ensure!(u64::from(y) < size, "y ({y}) out of bounds for zoom {z}");
		Ok(())
	}

	/// Build an address from signed components, as delivered by hosts that
	/// encode "unset" as a negative number.
	///
	/// # Errors
	/// Returns an error for negative or out-of-range components instead of wrapping them.
	pub fn from_signed(z: i64, x: i64, y: i64) -> Result<TileAddress> {
		ensure!(z >= 0, "zoom ({z}) must not be negative");
		ensure!(x >= 0, "x ({x}) must not be negative");
		ensure!(y >= 0, "y ({y}) must not be negative");
		TileAddress::new(u8::try_from(z)?, u32::try_from(x)?, u32::try_from(y)?)
	}

	/// Largest valid `x` or `y` at this zoom level (`2^z - 1`).
	#[must_use]
	pub fn max_index(&self) -> u32 {
		((1u64 << self.z) - 1) as u32
	}

	/// Return a copy with the row flipped between XYZ and TMS numbering.
	///
	/// ```
	/// use urltile_core::TileAddress;
	///
	/// let address = TileAddress::new(3, 4, 2).unwrap();
	/// assert_eq!(address.flipped_y(), TileAddress::new(3, 4, 5).unwrap());
	/// ```
	#[must_use]
	pub fn flipped_y(&self) -> TileAddress {
		TileAddress {
			z: self.z,
			x: self.x,
			y: self.max_index() - self.y,
		}
	}

	/// Return the ancestor of this tile at the lower zoom `z`.
	///
	/// `x` and `y` are shifted right by the zoom difference, which equals floor division
	/// by `2^(self.z - z)`. A `z` at or above the current zoom returns `self` unchanged.
	#[must_use]
	pub fn ancestor_at(&self, z: u8) -> TileAddress {
		if z >= self.z {
			return *self;
		}
		let shift = u32::from(self.z - z);
		TileAddress {
			z,
			x: self.x >> shift,
			y: self.y >> shift,
		}
	}
}

/// `TileAddress(z, [x, y])`
impl Debug for TileAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileAddress({}, [{}, {}])", self.z, self.x, self.y)
	}
}

/// `z/x/y`, the form used in tile paths and log lines.
impl Display for TileAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}
