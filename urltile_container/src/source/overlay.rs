//! Opacity of a tile layer.
//!
//! Opacity is a presentation concern: it is applied to the rendered layer and never
//! to the bytes stored in the cache. An [`OverlayFilter`] multiplies the alpha channel
//! of a white destination-in color into the layer.

use crate::clamp_opacity;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayFilter {
	opacity: f32,
}

impl OverlayFilter {
	/// The filter for `opacity`, or `None` for a fully opaque layer.
	///
	/// ```
	/// use urltile_container::OverlayFilter;
	///
	/// assert!(OverlayFilter::from_opacity(1.0).is_none());
	/// assert_eq!(OverlayFilter::from_opacity(0.5).unwrap().alpha(), 127);
	/// ```
	pub fn from_opacity(opacity: f32) -> Option<OverlayFilter> {
		let opacity = clamp_opacity(opacity);
		(opacity < 1.0).then_some(OverlayFilter { opacity })
	}

	pub fn opacity(&self) -> f32 {
		self.opacity
	}

	/// Alpha byte of the filter color, truncated like an integer cast.
	pub fn alpha(&self) -> u8 {
		(self.opacity * 255.0) as u8
	}

	/// Multiply the alpha channel of RGBA pixels in place.
	pub fn apply(&self, rgba: &mut [u8]) {
		let alpha = u16::from(self.alpha());
		for pixel in rgba.chunks_exact_mut(4) {
			pixel[3] = (u16::from(pixel[3]) * alpha / 255) as u8;
		}
	}
}
