//! Reconciliation of the source grids into one target grid.

use crate::config::MergeConfig;
use anyhow::Result;
use mosaic_core::{GeoExtent, GeoTransform, MergeError, PixelSize, PixelType, SourceDescriptor};

/// Extent, pixel size and pixel type the output is built on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetGrid {
	pub extent: GeoExtent,
	pub pixel_size: PixelSize,
	pub pixel_type: PixelType,
}

impl TargetGrid {
	pub fn geo_transform(&self) -> GeoTransform {
		GeoTransform::from_extent(&self.extent, &self.pixel_size)
	}

	/// Size of the grid in pixels, rounded to the nearest pixel.
	///
	/// Fails with a configuration error if either dimension is not positive.
	pub fn dimensions(&self) -> Result<(usize, usize)> {
		let width = ((self.extent.lrx - self.extent.ulx) / self.pixel_size.x).round();
		let height = ((self.extent.lry - self.extent.uly) / self.pixel_size.y).round();
		if !(width >= 1.0 && height >= 1.0) {
			return Err(MergeError::Configuration(format!(
				"output size of {width}x{height} pixels is not positive, check extent and pixel size"
			))
			.into());
		}
		Ok((width as usize, height as usize))
	}
}

/// Derives the [`TargetGrid`] from the sources, unless the configuration overrides it.
pub struct GridReconciler<'a> {
	config: &'a MergeConfig,
}

impl<'a> GridReconciler<'a> {
	pub fn new(config: &'a MergeConfig) -> Self {
		GridReconciler { config }
	}

	pub fn reconcile(&self, sources: &[SourceDescriptor]) -> Result<TargetGrid> {
		let Some(first) = sources.first() else {
			return Err(MergeError::Configuration("no source rasters to derive the output grid from".to_string()).into());
		};

		let extent = match self.config.target_extent {
			Some(extent) => extent,
			None => GeoExtent::union_of(sources.iter().map(|s| &s.extent)).unwrap_or(first.extent),
		};
		let pixel_size = self.config.pixel_size.unwrap_or_else(|| first.pixel_size());
		let pixel_type = self.config.pixel_type.unwrap_or(first.pixel_type);

		let extent = if self.config.target_aligned_pixels {
			extent.aligned_to(&pixel_size)
		} else {
			extent
		};

		let grid = TargetGrid {
			extent,
			pixel_size,
			pixel_type,
		};
		log::debug!("reconciled grid of {} sources: {grid:?}", sources.len());
		Ok(grid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use mosaic_core::RasterHandle;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn source(extent: [f64; 4], pixel: f64) -> SourceDescriptor {
		let extent = GeoExtent::try_from(extent).unwrap();
		let pixel_size = PixelSize::new(pixel, pixel).unwrap();
		SourceDescriptor {
			name: "source".to_string(),
			handle: RasterHandle::new(0),
			extent,
			geo_transform: GeoTransform::from_extent(&extent, &pixel_size),
			width: (extent.width() / pixel) as usize,
			height: (extent.height() / pixel) as usize,
			band_count: 1,
			pixel_type: PixelType::Byte,
			projection: String::new(),
			color_table: None,
		}
	}

	fn sources() -> Vec<SourceDescriptor> {
		vec![
			source([0.3, 10.0, 5.3, 4.0], 0.5),
			source([4.0, 12.7, 9.0, 6.0], 1.0),
			source([-2.0, 3.0, 1.0, -1.1], 0.25),
		]
	}

	#[test]
	fn union_of_sources() {
		let config = MergeConfig::new("out.tif");
		let grid = GridReconciler::new(&config).reconcile(&sources()).unwrap();
		assert_eq!(grid.extent, GeoExtent::new(-2.0, 12.7, 9.0, -1.1).unwrap());
		assert_eq!(grid.pixel_size, PixelSize::new(0.5, -0.5).unwrap());
		assert_eq!(grid.pixel_type, PixelType::Byte);
	}

	#[test]
	fn overrides_are_used_verbatim() {
		let config = MergeConfig {
			target_extent: Some(GeoExtent::new(1.0, 2.0, 3.0, 1.0).unwrap()),
			pixel_size: Some(PixelSize::new(0.1, 0.2).unwrap()),
			pixel_type: Some(PixelType::Float32),
			..MergeConfig::new("out.tif")
		};
		let grid = GridReconciler::new(&config).reconcile(&sources()).unwrap();
		assert_eq!(
			grid,
			TargetGrid {
				extent: GeoExtent::new(1.0, 2.0, 3.0, 1.0).unwrap(),
				pixel_size: PixelSize::new(0.1, -0.2).unwrap(),
				pixel_type: PixelType::Float32,
			}
		);
	}

	#[rstest]
	#[case(0.5)]
	#[case(0.3)]
	#[case(0.7)]
	#[case(2.0)]
	fn aligned_grid_contains_unaligned(#[case] pixel: f64) {
		let config = MergeConfig {
			pixel_size: Some(PixelSize::new(pixel, pixel).unwrap()),
			..MergeConfig::new("out.tif")
		};
		let unaligned = GridReconciler::new(&config).reconcile(&sources()).unwrap().extent;
		let config = MergeConfig {
			target_aligned_pixels: true,
			..config
		};
		let aligned = GridReconciler::new(&config).reconcile(&sources()).unwrap().extent;

		assert!(aligned.contains(&unaligned));
		let columns = aligned.width() / pixel;
		let rows = aligned.height() / pixel;
		assert_relative_eq!(columns, columns.round(), epsilon = 1e-9);
		assert_relative_eq!(rows, rows.round(), epsilon = 1e-9);
	}

	#[test]
	fn empty_sources() {
		let config = MergeConfig::new("out.tif");
		let err = GridReconciler::new(&config).reconcile(&[]).unwrap_err();
		assert!(matches!(MergeError::of(&err), Some(MergeError::Configuration(_))));
	}

	#[rstest]
	#[case([0.0, 1.0, 2.0, 0.0], 0.5, Some((4, 2)))]
	#[case([0.0, 1.0, 2.0, 0.0], 0.3, Some((7, 3)))]
	#[case([0.0, 1.0, 0.1, 0.9], 0.5, None)]
	fn grid_dimensions(#[case] extent: [f64; 4], #[case] pixel: f64, #[case] expected: Option<(usize, usize)>) {
		let grid = TargetGrid {
			extent: GeoExtent::try_from(extent).unwrap(),
			pixel_size: PixelSize::new(pixel, pixel).unwrap(),
			pixel_type: PixelType::Byte,
		};
		match expected {
			Some(size) => assert_eq!(grid.dimensions().unwrap(), size),
			None => assert!(matches!(
				MergeError::of(&grid.dimensions().unwrap_err()),
				Some(MergeError::Configuration(_))
			)),
		}
	}
}
