//! Raster tile file extensions recognised in templates and file names.

use std::fmt::{self, Display};

/// One of the four raster extensions a tile template may carry.
///
/// Parsing is case-insensitive; the canonical form is lower case with a leading dot.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TileExtension {
	#[default]
	Png,
	Jpg,
	Jpeg,
	Webp,
}

impl TileExtension {
	/// The extension including its leading dot, e.g. `".png"`.
	pub fn as_str(&self) -> &'static str {
		match self {
			TileExtension::Png => ".png",
			TileExtension::Jpg => ".jpg",
			TileExtension::Jpeg => ".jpeg",
			TileExtension::Webp => ".webp",
		}
	}

	/// Parse an extension with or without the leading dot.
	///
	/// Returns `None` for anything that is not one of the four raster extensions.
	pub fn parse(value: &str) -> Option<TileExtension> {
		let value = value.strip_prefix('.').unwrap_or(value);
		Some(match value.to_ascii_lowercase().as_str() {
			"png" => TileExtension::Png,
			"jpg" => TileExtension::Jpg,
			"jpeg" => TileExtension::Jpeg,
			"webp" => TileExtension::Webp,
			_ => return None,
		})
	}

	/// Split a recognised extension off the end of `filename`.
	///
	/// On success `filename` is truncated to the part before the dot.
	pub fn from_filename(filename: &mut String) -> Option<TileExtension> {
		let index = filename.rfind('.')?;
		let extension = TileExtension::parse(&filename[index..])?;
		filename.truncate(index);
		Some(extension)
	}
}

impl Display for TileExtension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("png", Some(TileExtension::Png))]
	#[case(".PNG", Some(TileExtension::Png))]
	#[case("jpg", Some(TileExtension::Jpg))]
	#[case(".JpEg", Some(TileExtension::Jpeg))]
	#[case("webp", Some(TileExtension::Webp))]
	#[case("gif", None)]
	#[case("", None)]
	#[case(".{ext}", None)]
	fn parse(#[case] input: &str, #[case] expected: Option<TileExtension>) {
		assert_eq!(TileExtension::parse(input), expected);
	}

	#[test]
	fn from_filename_truncates() {
		let mut name = String::from("12_100_200.JPEG");
		assert_eq!(TileExtension::from_filename(&mut name), Some(TileExtension::Jpeg));
		assert_eq!(name, "12_100_200");

		let mut name = String::from("notes.txt");
		assert_eq!(TileExtension::from_filename(&mut name), None);
		assert_eq!(name, "notes.txt");
	}

	#[test]
	fn display_and_default() {
		assert_eq!(TileExtension::Jpeg.to_string(), ".jpeg");
		assert_eq!(TileExtension::default(), TileExtension::Png);
	}
}
