//! The six-parameter affine mapping from pixel/line coordinates to ground coordinates.
//!
//! The layout follows GDAL: `[origin_x, pixel_width, rotation_x, origin_y, rotation_y, pixel_height]`.
//! For north-up rasters both rotation terms are `0` and `pixel_height` is negative.

use super::{GeoExtent, PixelSize};
use anyhow::{Result, ensure};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
	pub origin_x: f64,
	pub pixel_width: f64,
	pub rotation_x: f64,
	pub origin_y: f64,
	pub rotation_y: f64,
	pub pixel_height: f64,
}

impl GeoTransform {
	/// Builds a north-up geotransform anchored at the upper-left corner of `extent`.
	pub fn from_extent(extent: &GeoExtent, pixel_size: &PixelSize) -> GeoTransform {
		GeoTransform {
			origin_x: extent.ulx,
			pixel_width: pixel_size.x,
			rotation_x: 0.0,
			origin_y: extent.uly,
			rotation_y: 0.0,
			pixel_height: pixel_size.y,
		}
	}

	pub fn from_array(gt: [f64; 6]) -> GeoTransform {
		GeoTransform {
			origin_x: gt[0],
			pixel_width: gt[1],
			rotation_x: gt[2],
			origin_y: gt[3],
			rotation_y: gt[4],
			pixel_height: gt[5],
		}
	}

	pub fn as_array(&self) -> [f64; 6] {
		[
			self.origin_x,
			self.pixel_width,
			self.rotation_x,
			self.origin_y,
			self.rotation_y,
			self.pixel_height,
		]
	}

	pub fn is_north_up(&self) -> bool {
		self.rotation_x == 0.0 && self.rotation_y == 0.0
	}

	pub fn pixel_size(&self) -> Result<PixelSize> {
		PixelSize::new(self.pixel_width, self.pixel_height)
	}

	/// Ground extent covered by a raster of `width × height` pixels.
	///
	/// Fails for rotated geotransforms.
	pub fn extent(&self, width: usize, height: usize) -> Result<GeoExtent> {
		ensure!(self.is_north_up(), "raster must not be rotated: {self:?}");
		let x0 = self.origin_x;
		let y0 = self.origin_y;
		let x1 = self.origin_x + self.pixel_width * width as f64;
		let y1 = self.origin_y + self.pixel_height * height as f64;
		GeoExtent::new(x0.min(x1), y0.max(y1), x0.max(x1), y0.min(y1))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn array_round_trip_keeps_gdal_order() {
		let gt = GeoTransform::from_array([10.0, 0.5, 0.0, 20.0, 0.0, -0.5]);
		assert_eq!(gt.origin_x, 10.0);
		assert_eq!(gt.pixel_height, -0.5);
		assert_eq!(gt.as_array(), [10.0, 0.5, 0.0, 20.0, 0.0, -0.5]);
	}

	#[test]
	fn extent_of_north_up_raster() {
		let gt = GeoTransform::from_array([100.0, 2.0, 0.0, 50.0, 0.0, -0.5]);
		let extent = gt.extent(10, 40).unwrap();
		assert_eq!(extent.as_tuple(), (100.0, 50.0, 120.0, 30.0));
	}

	#[test]
	fn rotated_raster_has_no_extent() {
		let gt = GeoTransform::from_array([0.0, 1.0, 0.1, 0.0, 0.0, -1.0]);
		assert!(!gt.is_north_up());
		assert!(gt.extent(1, 1).is_err());
	}

	#[test]
	fn from_extent() {
		let extent = GeoExtent::new(0.0, 1.0, 2.0, 0.0).unwrap();
		let gt = GeoTransform::from_extent(&extent, &PixelSize::new(0.5, 0.5).unwrap());
		assert_eq!(gt.as_array(), [0.0, 0.5, 0.0, 1.0, 0.0, -0.5]);
		assert_eq!(gt.extent(4, 2).unwrap(), extent);
	}
}
