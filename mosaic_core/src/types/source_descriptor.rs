use super::{ColorTable, GeoExtent, GeoTransform, PixelSize, PixelType};
use crate::{RasterHandle, RasterStore};
use anyhow::{Context, Result, ensure};

/// Read-only summary of one input raster.
///
/// Built once per input at the start of a merge and never changed afterwards. The pixel type is
/// the type of band 1; bands of one source are assumed to share it.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceDescriptor {
	/// Path or name the raster was opened from.
	pub name: String,
	pub handle: RasterHandle,
	pub extent: GeoExtent,
	pub geo_transform: GeoTransform,
	pub width: usize,
	pub height: usize,
	pub band_count: usize,
	pub pixel_type: PixelType,
	/// Opaque spatial reference, assumed identical across all sources.
	pub projection: String,
	pub color_table: Option<ColorTable>,
}

impl SourceDescriptor {
	/// Collects the descriptor of an open raster from the store.
	pub fn read<S: RasterStore + ?Sized>(store: &S, handle: RasterHandle, name: &str) -> Result<SourceDescriptor> {
		let read = || -> Result<SourceDescriptor> {
			let (width, height) = store.raster_size(handle)?;
			let band_count = store.band_count(handle)?;
			ensure!(band_count >= 1, "raster has no bands");
			ensure!(width >= 1 && height >= 1, "raster has an empty size of {width}x{height}");

			let geo_transform = store.geo_transform(handle)?;
			let extent = geo_transform.extent(width, height)?;
			geo_transform.pixel_size()?;

			Ok(SourceDescriptor {
				name: name.to_string(),
				handle,
				extent,
				geo_transform,
				width,
				height,
				band_count,
				pixel_type: store.band_pixel_type(handle, 1)?,
				projection: store.projection(handle)?,
				color_table: store.color_table(handle, 1)?,
			})
		};
		let descriptor = read().with_context(|| format!("Failed to describe raster {name:?}"))?;
		log::trace!("{descriptor:?}");
		Ok(descriptor)
	}

	/// Pixel size taken from the geotransform, `y` negative.
	pub fn pixel_size(&self) -> PixelSize {
		PixelSize {
			x: self.geo_transform.pixel_width.abs(),
			y: -self.geo_transform.pixel_height.abs(),
		}
	}
}
