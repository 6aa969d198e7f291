use std::fmt::Display;

/// A rectangular block of pixels inside a raster: offset and size in pixel/line coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelWindow {
	pub x_off: usize,
	pub y_off: usize,
	pub width: usize,
	pub height: usize,
}

impl PixelWindow {
	pub fn new(x_off: usize, y_off: usize, width: usize, height: usize) -> PixelWindow {
		PixelWindow {
			x_off,
			y_off,
			width,
			height,
		}
	}

	/// The window covering a whole `width × height` raster.
	pub fn full(width: usize, height: usize) -> PixelWindow {
		PixelWindow::new(0, 0, width, height)
	}

	pub fn pixel_count(&self) -> usize {
		self.width * self.height
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	/// Returns `true` if the window lies inside a `width × height` raster.
	pub fn fits_into(&self, width: usize, height: usize) -> bool {
		self.x_off + self.width <= width && self.y_off + self.height <= height
	}
}

impl Display for PixelWindow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{},{},{},{}", self.x_off, self.y_off, self.width, self.height)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fits_into() {
		let window = PixelWindow::new(2, 1, 3, 4);
		assert!(window.fits_into(5, 5));
		assert!(!window.fits_into(4, 5));
		assert!(!window.fits_into(5, 4));
		assert_eq!(window.pixel_count(), 12);
		assert_eq!(window.to_string(), "2,1,3,4");
	}

	#[test]
	fn empty_windows() {
		assert!(PixelWindow::new(0, 0, 0, 3).is_empty());
		assert!(!PixelWindow::full(1, 1).is_empty());
	}
}
