use super::PixelSize;
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::fmt::Debug;

/// The bounding rectangle of a raster in ground coordinates, given by its upper-left and
/// lower-right corners.
///
/// For north-up rasters `uly` is the northern and `lry` the southern edge, so `uly > lry`.
///
/// # Examples
///
/// ## Extending an extent
/// ```
/// use mosaic_core::GeoExtent;
///
/// let mut extent = GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap();
/// extent.extend(&GeoExtent::new(1.0, 2.0, 3.0, 0.5).unwrap());
/// assert_eq!(extent.as_tuple(), (0.0, 2.0, 3.0, 0.0));
/// ```
#[derive(Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "[f64; 4]")]
pub struct GeoExtent {
	pub ulx: f64,
	pub uly: f64,
	pub lrx: f64,
	pub lry: f64,
}

impl GeoExtent {
	/// Creates a new extent from `ulx, uly, lrx, lry`.
	///
	/// Fails if a coordinate is not finite or if the corners are swapped.
	pub fn new(ulx: f64, uly: f64, lrx: f64, lry: f64) -> Result<GeoExtent> {
		GeoExtent { ulx, uly, lrx, lry }.checked()
	}

	/// Returns the tightest extent containing every extent in `extents`, or `None` if the
	/// iterator is empty.
	pub fn union_of<'a>(extents: impl IntoIterator<Item = &'a GeoExtent>) -> Option<GeoExtent> {
		let mut iter = extents.into_iter();
		let first = *iter.next()?;
		Some(iter.fold(first, |acc, e| acc.extended(e)))
	}

	/// Expands the extent in place so it also covers `other`.
	///
	/// - `ulx` = `min(self.ulx, other.ulx)`
	/// - `uly` = `max(self.uly, other.uly)`
	/// - `lrx` = `max(self.lrx, other.lrx)`
	/// - `lry` = `min(self.lry, other.lry)`
	pub fn extend(&mut self, other: &GeoExtent) {
		self.ulx = self.ulx.min(other.ulx);
		self.uly = self.uly.max(other.uly);
		self.lrx = self.lrx.max(other.lrx);
		self.lry = self.lry.min(other.lry);
	}

	/// Non-mutating version of [`extend`](Self::extend).
	#[must_use]
	pub fn extended(mut self, other: &GeoExtent) -> GeoExtent {
		self.extend(other);
		self
	}

	/// Returns the overlapping area of both extents, or `None` if they do not overlap by a
	/// positive area.
	pub fn intersection(&self, other: &GeoExtent) -> Option<GeoExtent> {
		let ulx = self.ulx.max(other.ulx);
		let uly = self.uly.min(other.uly);
		let lrx = self.lrx.min(other.lrx);
		let lry = self.lry.max(other.lry);
		if ulx >= lrx || uly <= lry {
			return None;
		}
		Some(GeoExtent { ulx, uly, lrx, lry })
	}

	/// Returns `true` if `other` lies completely inside this extent.
	pub fn contains(&self, other: &GeoExtent) -> bool {
		self.ulx <= other.ulx && self.uly >= other.uly && self.lrx >= other.lrx && self.lry <= other.lry
	}

	/// Snaps the extent outward to multiples of the pixel size.
	///
	/// The x edges are aligned to `pixel_size.x` and the y edges to `|pixel_size.y|`, so the
	/// result always contains the original extent.
	#[must_use]
	pub fn aligned_to(&self, pixel_size: &PixelSize) -> GeoExtent {
		let psx = pixel_size.x;
		let psy = pixel_size.abs_y();
		GeoExtent {
			ulx: (self.ulx / psx).floor() * psx,
			uly: (self.uly / psy).ceil() * psy,
			lrx: (self.lrx / psx).ceil() * psx,
			lry: (self.lry / psy).floor() * psy,
		}
	}

	pub fn width(&self) -> f64 {
		self.lrx - self.ulx
	}

	pub fn height(&self) -> f64 {
		self.uly - self.lry
	}

	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.ulx, self.uly, self.lrx, self.lry)
	}

	pub fn as_array(&self) -> [f64; 4] {
		[self.ulx, self.uly, self.lrx, self.lry]
	}

	fn checked(self) -> Result<Self> {
		ensure!(
			self.as_array().iter().all(|v| v.is_finite()),
			"extent coordinates must be finite: {self:?}"
		);
		ensure!(self.ulx <= self.lrx, "ulx ({}) must be <= lrx ({})", self.ulx, self.lrx);
		ensure!(self.uly >= self.lry, "uly ({}) must be >= lry ({})", self.uly, self.lry);
		Ok(self)
	}
}

impl TryFrom<[f64; 4]> for GeoExtent {
	type Error = anyhow::Error;

	fn try_from(value: [f64; 4]) -> Result<Self> {
		GeoExtent::new(value[0], value[1], value[2], value[3])
	}
}

impl Debug for GeoExtent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "GeoExtent({}, {}, {}, {})", self.ulx, self.uly, self.lrx, self.lry)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use rstest::rstest;

	fn extent(ulx: f64, uly: f64, lrx: f64, lry: f64) -> GeoExtent {
		GeoExtent::new(ulx, uly, lrx, lry).unwrap()
	}

	#[test]
	fn new_rejects_swapped_corners() {
		assert!(GeoExtent::new(1.0, 1.0, 0.0, 0.0).is_err());
		assert!(GeoExtent::new(0.0, 0.0, 1.0, 1.0).is_err());
		assert!(GeoExtent::new(0.0, f64::NAN, 1.0, 0.0).is_err());
	}

	#[test]
	fn union_is_tightest_box() {
		let extents = [
			extent(10.0, 50.0, 20.0, 40.0),
			extent(5.0, 45.0, 12.0, 30.0),
			extent(15.0, 60.0, 25.0, 55.0),
		];
		let union = GeoExtent::union_of(&extents).unwrap();
		assert_eq!(union.as_tuple(), (5.0, 60.0, 25.0, 30.0));
		assert!(extents.iter().all(|e| union.contains(e)));
	}

	#[test]
	fn union_of_nothing_is_none() {
		assert_eq!(GeoExtent::union_of(&[]), None);
	}

	#[rstest]
	#[case(extent(0.0, 1.0, 1.0, 0.0), extent(1.0, 1.0, 2.0, 0.0), None)]
	#[case(extent(0.0, 1.0, 2.0, 0.0), extent(1.0, 3.0, 3.0, 0.5), Some((1.0, 1.0, 2.0, 0.5)))]
	#[case(extent(0.0, 4.0, 4.0, 0.0), extent(1.0, 3.0, 2.0, 2.0), Some((1.0, 3.0, 2.0, 2.0)))]
	fn intersection(#[case] a: GeoExtent, #[case] b: GeoExtent, #[case] expected: Option<(f64, f64, f64, f64)>) {
		assert_eq!(a.intersection(&b).map(|e| e.as_tuple()), expected);
		assert_eq!(b.intersection(&a).map(|e| e.as_tuple()), expected);
	}

	#[rstest]
	#[case(extent(0.3, 9.7, 5.2, 1.1), 1.0, -1.0, (0.0, 10.0, 6.0, 1.0))]
	#[case(extent(-7.5, 3.2, 2.5, -4.9), 2.5, -2.0, (-7.5, 4.0, 2.5, -6.0))]
	#[case(extent(0.0, 10.0, 10.0, 0.0), 0.5, -0.25, (0.0, 10.0, 10.0, 0.0))]
	fn aligned_to_snaps_outward(
		#[case] input: GeoExtent,
		#[case] psx: f64,
		#[case] psy: f64,
		#[case] expected: (f64, f64, f64, f64),
	) {
		let pixel_size = PixelSize::new(psx, psy).unwrap();
		let aligned = input.aligned_to(&pixel_size);
		assert_eq!(aligned.as_tuple(), expected);
		assert!(aligned.contains(&input));

		let columns = aligned.width() / pixel_size.x;
		let rows = aligned.height() / pixel_size.abs_y();
		assert_relative_eq!(columns, columns.round(), epsilon = 1e-9);
		assert_relative_eq!(rows, rows.round(), epsilon = 1e-9);
	}

	#[test]
	fn width_and_height() {
		let e = extent(2.0, 8.0, 5.0, 1.0);
		assert_eq!(e.width(), 3.0);
		assert_eq!(e.height(), 7.0);
	}

	#[test]
	fn try_from_array_and_debug() {
		let e = GeoExtent::try_from([1.0, 4.0, 3.0, 2.0]).unwrap();
		assert_eq!(format!("{e:?}"), "GeoExtent(1, 4, 3, 2)");
		assert!(GeoExtent::try_from([3.0, 4.0, 1.0, 2.0]).is_err());
	}
}
