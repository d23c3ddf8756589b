//! 64 bit storage keys for tile addresses.
//!
//! Two packing schemes exist:
//!
//! | scheme                   | layout                          | injective |
//! |--------------------------|---------------------------------|-----------|
//! | [`KeyScheme::FixedWidth`] | `z:8 \| x:28 \| y:28`           | yes       |
//! | [`KeyScheme::Legacy`]     | `(z << z) + (x << z) + y`       | no        |
//!
//! The legacy scheme is kept only to read and write caches produced by older
//! tools. It collides across zoom levels, e.g. `3/5/0` and `4/0/0` both pack to `64`.
//!
//! ```
//! use urltile_core::{KeyScheme, TileAddress, TileKey, pack_key};
//!
//! let key = pack_key(100, 200, 12).unwrap();
//! assert_eq!(key.unpack().unwrap(), TileAddress::new(12, 100, 200).unwrap());
//!
//! let legacy = TileKey::new(&TileAddress::new(3, 5, 0).unwrap(), KeyScheme::Legacy);
//! assert_eq!(legacy.as_u64(), 64);
//! ```

use crate::{MAX_ZOOM, TileAddress};
use anyhow::{Result, bail, ensure};
use std::fmt::{self, Debug, Display};

const AXIS_BITS: u32 = 28;
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// How a [`TileAddress`] is packed into a [`TileKey`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum KeyScheme {
	/// Zoom in the top byte, 28 bits per axis below it.
	#[default]
	FixedWidth,
	/// `(z << z) + (x << z) + y`, compatible with older cache databases.
	Legacy,
}

impl KeyScheme {
	pub fn as_str(&self) -> &'static str {
		match self {
			KeyScheme::FixedWidth => "fixed_width",
			KeyScheme::Legacy => "legacy",
		}
	}
}

impl TryFrom<&str> for KeyScheme {
	type Error = anyhow::Error;

	fn try_from(value: &str) -> Result<Self> {
		Ok(match value.trim().to_lowercase().replace('-', "_").as_str() {
			"fixed_width" | "fixed" => KeyScheme::FixedWidth,
			"legacy" => KeyScheme::Legacy,
			other => bail!("unknown key scheme '{other}', expected 'fixed_width' or 'legacy'"),
		})
	}
}

impl Display for KeyScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A packed tile identifier used as the primary key of the tile cache.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TileKey(u64);

impl TileKey {
	/// Pack a valid address with the given scheme.
	#[must_use]
	pub fn new(address: &TileAddress, scheme: KeyScheme) -> TileKey {
		let z = u64::from(address.z);
		let x = u64::from(address.x);
		let y = u64::from(address.y);
		match scheme {
			KeyScheme::FixedWidth => TileKey((z << (2 * AXIS_BITS)) | (x << AXIS_BITS) | y),
			KeyScheme::Legacy => TileKey((z << z) + (x << z) + y),
		}
	}

	/// Recover the address from a [`KeyScheme::FixedWidth`] key.
	///
	/// # Errors
	/// Returns an error if the decoded components do not form a valid address.
	pub fn unpack(&self) -> Result<TileAddress> {
		let z = self.0 >> (2 * AXIS_BITS);
		ensure!(z <= u64::from(MAX_ZOOM), "key {self:?} has invalid zoom {z}");
		TileAddress::new(z as u8, ((self.0 >> AXIS_BITS) & AXIS_MASK) as u32, (self.0 & AXIS_MASK) as u32)
	}

	#[must_use]
	pub fn as_u64(&self) -> u64 {
		self.0
	}

	/// The key as SQLite stores integers. Both schemes stay below `2^63` for valid addresses.
	#[must_use]
	pub fn as_i64(&self) -> i64 {
		self.0 as i64
	}
}

impl Debug for TileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileKey({:#018x})", self.0)
	}
}

impl Display for TileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Pack `(x, y, z)` with the default fixed-width scheme.
///
/// # Errors
/// Returns an error if the components are not a valid [`TileAddress`].
pub fn pack_key(x: u32, y: u32, z: u8) -> Result<TileKey> {
	Ok(TileKey::new(&TileAddress::new(z, x, y)?, KeyScheme::FixedWidth))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	fn all_addresses(max_zoom: u8) -> impl Iterator<Item = TileAddress> {
		(0..=max_zoom).flat_map(|z| {
			let size = 1u32 << z;
			(0..size).flat_map(move |x| (0..size).map(move |y| TileAddress { z, x, y }))
		})
	}

	fn first_collision(scheme: KeyScheme, max_zoom: u8) -> Option<(TileAddress, TileAddress)> {
		let mut seen: HashMap<TileKey, TileAddress> = HashMap::new();
		for address in all_addresses(max_zoom) {
			if let Some(previous) = seen.insert(TileKey::new(&address, scheme), address) {
				return Some((previous, address));
			}
		}
		None
	}

	#[test]
	fn fixed_width_has_no_collisions_at_small_zooms() {
		assert_eq!(first_collision(KeyScheme::FixedWidth, 8), None);
	}

	#[test]
	fn legacy_collides() {
		let (a, b) = first_collision(KeyScheme::Legacy, 8).expect("legacy scheme should collide");
		assert_ne!(a, b);
		assert_eq!(TileKey::new(&a, KeyScheme::Legacy), TileKey::new(&b, KeyScheme::Legacy));

		let left = TileKey::new(&TileAddress::new(3, 5, 0).unwrap(), KeyScheme::Legacy);
		let right = TileKey::new(&TileAddress::new(4, 0, 0).unwrap(), KeyScheme::Legacy);
		assert_eq!(left, right);
	}

	#[rstest]
	#[case(0, 0, 0)]
	#[case(12, 100, 200)]
	#[case(22, (1 << 22) - 1, 0)]
	#[case(22, 0, (1 << 22) - 1)]
	#[case(22, 1_234_567, 3_456_789)]
	#[case(MAX_ZOOM, (1 << MAX_ZOOM) - 1, (1 << MAX_ZOOM) - 1)]
	fn fixed_width_unpacks(#[case] z: u8, #[case] x: u32, #[case] y: u32) {
		let address = TileAddress::new(z, x, y).unwrap();
		let key = TileKey::new(&address, KeyScheme::FixedWidth);
		assert_eq!(key.unpack().unwrap(), address);
		assert!(key.as_i64() >= 0);
	}

	#[test]
	fn fixed_width_separates_neighbouring_zooms_at_high_levels() {
		// the highest keys of zoom z stay below the lowest key of zoom z + 1
		for z in 0..MAX_ZOOM {
			let max = (1u32 << z) - 1;
			let top = TileKey::new(&TileAddress::new(z, max, max).unwrap(), KeyScheme::FixedWidth);
			let bottom = TileKey::new(&TileAddress::new(z + 1, 0, 0).unwrap(), KeyScheme::FixedWidth);
			assert!(top < bottom, "zoom {z}");
		}
	}

	#[test]
	fn pack_key_matches_layout() {
		let key = pack_key(100, 200, 12).unwrap();
		assert_eq!(key.as_u64(), (12u64 << 56) | (100 << 28) | 200);
		assert!(pack_key(4096, 0, 12).is_err());
	}

	#[test]
	fn unpack_rejects_garbage() {
		assert!(TileKey(u64::MAX).unpack().is_err());
		assert!(TileKey((1 << 56) | (5 << 28)).unpack().is_err());
	}

	#[rstest]
	#[case("fixed_width", KeyScheme::FixedWidth)]
	#[case("Fixed-Width", KeyScheme::FixedWidth)]
	#[case(" legacy ", KeyScheme::Legacy)]
	fn scheme_from_str(#[case] text: &str, #[case] expected: KeyScheme) {
		assert_eq!(KeyScheme::try_from(text).unwrap(), expected);
	}

	#[test]
	fn scheme_from_str_unknown() {
		assert!(KeyScheme::try_from("morton").is_err());
	}
}
