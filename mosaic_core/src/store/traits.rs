use crate::types::{
	ColorTable, DriverInfo, GeoTransform, MaskFlags, PixelType, PixelWindow, RasterBuffer, SourceDescriptor,
};
use anyhow::Result;
use std::fmt::Display;

/// Opaque reference to a raster opened in a [`RasterStore`]. Only valid for the store that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterHandle(usize);

impl RasterHandle {
	pub fn new(index: usize) -> RasterHandle {
		RasterHandle(index)
	}

	pub fn index(&self) -> usize {
		self.0
	}
}

impl Display for RasterHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Parameters of a raster to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateParameters {
	pub width: usize,
	pub height: usize,
	pub band_count: usize,
	pub pixel_type: PixelType,
	/// Ordered `KEY=VALUE` pairs, passed to the format driver unchanged.
	pub create_options: Vec<String>,
}

/// The capabilities the merge engine needs from a raster backend.
///
/// Bands are numbered from `1`, as in GDAL. All calls are synchronous.
pub trait RasterStore {
	/// Output formats known to the store.
	fn drivers(&self) -> Vec<DriverInfo>;

	/// Returns `true` if `format` names a driver that can create rasters and write them piecewise.
	fn driver_supports_create(&self, format: &str) -> bool {
		self.drivers()
			.iter()
			.any(|d| d.name.eq_ignore_ascii_case(format) && d.can_create && d.is_raster)
	}

	/// Opens an existing raster for reading.
	fn open(&mut self, path: &str) -> Result<RasterHandle>;

	/// Opens an existing raster for reading and writing. Returns `None`, without reporting an
	/// error, if `path` cannot be opened that way.
	fn open_for_update(&mut self, path: &str) -> Option<RasterHandle>;

	/// Creates a new raster with the driver named `format`.
	fn create(&mut self, format: &str, path: &str, parameters: &CreateParameters) -> Result<RasterHandle>;

	/// Flushes and releases a raster. The handle must not be used afterwards.
	fn close(&mut self, handle: RasterHandle) -> Result<()>;

	fn raster_size(&self, handle: RasterHandle) -> Result<(usize, usize)>;
	fn band_count(&self, handle: RasterHandle) -> Result<usize>;
	fn geo_transform(&self, handle: RasterHandle) -> Result<GeoTransform>;
	fn set_geo_transform(&mut self, handle: RasterHandle, geo_transform: &GeoTransform) -> Result<()>;
	fn projection(&self, handle: RasterHandle) -> Result<String>;
	fn set_projection(&mut self, handle: RasterHandle, projection: &str) -> Result<()>;

	fn band_pixel_type(&self, handle: RasterHandle, band: usize) -> Result<PixelType>;
	fn color_table(&self, handle: RasterHandle, band: usize) -> Result<Option<ColorTable>>;
	fn set_color_table(&mut self, handle: RasterHandle, band: usize, color_table: &ColorTable) -> Result<()>;
	fn set_no_data(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()>;
	fn fill_band(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()>;

	fn mask_flags(&self, handle: RasterHandle, band: usize) -> Result<MaskFlags>;
	fn is_alpha_band(&self, handle: RasterHandle, band: usize) -> Result<bool>;

	/// Reads `window` of a band, resampled (nearest neighbour) to `out_width × out_height` and
	/// converted to `pixel_type`.
	fn read_window(
		&self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		out_width: usize,
		out_height: usize,
		pixel_type: PixelType,
	) -> Result<RasterBuffer>;

	/// Reads `window` of the band's validity mask as `Byte` samples, `0` meaning invalid.
	fn read_mask_window(
		&self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		out_width: usize,
		out_height: usize,
	) -> Result<RasterBuffer>;

	/// Writes `buffer` into `window` of a band. Samples are converted to the band's pixel type.
	fn write_window(&mut self, handle: RasterHandle, band: usize, window: &PixelWindow, buffer: &RasterBuffer)
	-> Result<()>;

	/// Summarises an open raster, see [`SourceDescriptor::read`].
	fn descriptor(&self, handle: RasterHandle, name: &str) -> Result<SourceDescriptor> {
		SourceDescriptor::read(self, handle, name)
	}
}
