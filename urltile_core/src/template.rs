//! Parsing of tile templates.
//!
//! A template is either a URL such as `https://tile.example.org/{z}/{x}/{y}.png?key=abc`
//! or a local tile pyramid, given as a `file://` URL or a plain path. Local templates
//! come in two styles:
//!
//! | style       | example                           | base directory |
//! |-------------|-----------------------------------|----------------|
//! | placeholder | `file:///data/tiles/{z}/{x}/{y}.png` | `/data/tiles`  |
//! | directory   | `file:///data/tiles.jpg`          | `/data/tiles`  |
//!
//! In directory style a trailing extension only selects the tile file type.
//!
//! ```
//! use urltile_core::{TileExtension, extract_base_directory, extract_extension};
//!
//! assert_eq!(extract_extension("https://x/{z}/{x}/{y}.jpeg?token=abc"), TileExtension::Jpeg);
//! assert_eq!(extract_base_directory("file:///a/b/maps.jpg"), "/a/b/maps");
//! ```

use crate::{TileAddress, TileExtension};
use anyhow::{Result, ensure};
use urltile_derive::context;

/// URL scheme prefix of local tile templates.
pub const FILE_SCHEME: &str = "file://";

/// Result of parsing a template: where tiles live and which file type they have.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedTemplate {
	/// For URLs the unchanged template, for local templates the base directory.
	pub base: String,
	pub extension: TileExtension,
}

/// Whether `template` refers to local files rather than a remote server.
///
/// `file://` URLs and anything without a `scheme://` prefix count as local.
pub fn is_local_template(template: &str) -> bool {
	let template = template.trim();
	template.starts_with(FILE_SCHEME) || !template.contains("://")
}

/// Remove a leading `file://`, if present.
pub fn strip_file_scheme(template: &str) -> &str {
	template.strip_prefix(FILE_SCHEME).unwrap_or(template)
}

/// Cut off a `?query` or `#fragment` suffix, whichever starts first.
fn strip_query_and_fragment(template: &str) -> &str {
	match template.find(['?', '#']) {
		Some(index) => &template[..index],
		None => template,
	}
}

/// Position of a dot that starts a file extension in the last path segment.
///
/// A dot in front of a placeholder, as in `{y}.{ext}`, does not count.
fn extension_dot(path: &str) -> Option<usize> {
	let dot = path.rfind('.')?;
	if path.rfind('/').is_some_and(|slash| dot < slash) {
		return None;
	}
	if path[dot + 1..].starts_with('{') {
		return None;
	}
	Some(dot)
}

/// Detect the tile file extension of a template, defaulting to `.png`.
pub fn extract_extension(template: &str) -> TileExtension {
	let path = strip_query_and_fragment(strip_file_scheme(template.trim()));
	extension_dot(path)
		.and_then(|dot| TileExtension::parse(&path[dot..]))
		.unwrap_or_default()
}

/// Detect the base directory of a local template.
///
/// Placeholder style templates are cut at the first `{z}`. Directory style templates
/// lose trailing slashes and a trailing recognised extension. The `file://` prefix is
/// never part of the result.
pub fn extract_base_directory(template: &str) -> String {
	let path = strip_query_and_fragment(strip_file_scheme(template.trim()));

	let base = if let Some(index) = path.find("{z}") {
		&path[..index]
	} else {
		let trimmed = path.trim_end_matches('/');
		match extension_dot(trimmed) {
			Some(dot) if TileExtension::parse(&trimmed[dot..]).is_some() => &trimmed[..dot],
			_ => trimmed,
		}
	};

	let base = base.trim_end_matches('/');
	if base.is_empty() && path.starts_with('/') {
		return String::from("/");
	}
	base.to_string()
}

/// Parse a template into base and extension.
///
/// # Errors
/// Returns an error for empty templates and for local templates without a base directory.
#[context("parsing tile template '{template}'")]
pub fn parse_template(template: &str) -> Result<ParsedTemplate> {
	let trimmed = template.trim();
	ensure!(!trimmed.is_empty(), "template is empty");

	let extension = extract_extension(trimmed);
	if is_local_template(trimmed) {
		let base = extract_base_directory(trimmed);
		ensure!(!base.is_empty(), "template has no base directory");
		Ok(ParsedTemplate { base, extension })
	} else {
		ensure!(
			trimmed.contains("{z}") && trimmed.contains("{x}") && trimmed.contains("{y}"),
			"URL template must contain {{z}}, {{x}} and {{y}}"
		);
		Ok(ParsedTemplate {
			base: trimmed.to_string(),
			extension,
		})
	}
}

/// Replace every `{z}`, `{x}` and `{y}` token in `template` with the address components.
pub fn substitute(template: &str, address: &TileAddress) -> String {
	template
		.replace("{z}", &address.z.to_string())
		.replace("{x}", &address.x.to_string())
		.replace("{y}", &address.y.to_string())
}
