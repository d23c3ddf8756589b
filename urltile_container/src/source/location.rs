use std::{
	fmt::{self, Display},
	path::PathBuf,
};

/// Where the bytes of one tile are read from.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TileLocation {
	/// A fully substituted tile URL.
	Url(String),
	/// A tile file inside a local pyramid.
	File(PathBuf),
}

impl TileLocation {
	pub fn as_url(&self) -> Option<&str> {
		match self {
			TileLocation::Url(url) => Some(url),
			TileLocation::File(_) => None,
		}
	}

	pub fn as_path(&self) -> Option<&PathBuf> {
		match self {
			TileLocation::Url(_) => None,
			TileLocation::File(path) => Some(path),
		}
	}
}

impl Display for TileLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TileLocation::Url(url) => f.write_str(url),
			TileLocation::File(path) => write!(f, "{}", path.display()),
		}
	}
}
