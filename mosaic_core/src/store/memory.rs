//! An in-memory [`RasterStore`], playing the role of GDAL's `MEM` driver.
//!
//! Rasters live in a map keyed by path, so a raster created under a path can later be opened
//! again under the same path, just like a file. Every handle opened on a path sees the same
//! pixels.
//!
//! # Examples
//!
//! ```
//! use mosaic_core::*;
//!
//! let mut store = MemoryRasterStore::new();
//! let raster = MemoryRaster::new(2, 2, 1, PixelType::Byte)
//! 	.with_extent(&GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap())
//! 	.with_fill(1, 5.0)
//! 	.unwrap();
//! store.insert("a.tif", raster);
//!
//! let handle = store.open("a.tif").unwrap();
//! let buffer = store
//! 	.read_window(handle, 1, &PixelWindow::full(2, 2), 2, 2, PixelType::Byte)
//! 	.unwrap();
//! assert_eq!(buffer.data(), &[5.0; 4]);
//! ```

use crate::{
	CreateParameters, RasterHandle, RasterStore,
	types::{
		ColorTable, DriverInfo, GeoExtent, GeoTransform, MaskFlag, MaskFlags, PixelType, PixelWindow, RasterBuffer,
	},
};
use anyhow::{Context, Result, bail, ensure};
use enumset::EnumSet;
use std::collections::HashMap;

/// One band of a [`MemoryRaster`].
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryBand {
	pub pixel_type: PixelType,
	pub data: Vec<f64>,
	pub no_data: Option<f64>,
	/// Explicit validity mask, `0` meaning invalid.
	pub mask: Option<Vec<u8>>,
	pub is_alpha: bool,
	pub color_table: Option<ColorTable>,
}

impl MemoryBand {
	fn new(pixel_type: PixelType, pixel_count: usize) -> MemoryBand {
		MemoryBand {
			pixel_type,
			data: vec![0.0; pixel_count],
			no_data: None,
			mask: None,
			is_alpha: false,
			color_table: None,
		}
	}

	fn is_no_data(&self, value: f64) -> bool {
		self
			.no_data
			.is_some_and(|no_data| self.pixel_type.is_no_data(value, no_data))
	}
}

/// A raster held by [`MemoryRasterStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryRaster {
	pub width: usize,
	pub height: usize,
	pub geo_transform: GeoTransform,
	pub projection: String,
	pub bands: Vec<MemoryBand>,
}

impl MemoryRaster {
	/// A raster filled with zeros, with a unit-pixel geotransform at the origin.
	pub fn new(width: usize, height: usize, band_count: usize, pixel_type: PixelType) -> MemoryRaster {
		MemoryRaster {
			width,
			height,
			geo_transform: GeoTransform::from_array([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]),
			projection: String::new(),
			bands: (0..band_count)
				.map(|_| MemoryBand::new(pixel_type, width * height))
				.collect(),
		}
	}

	#[must_use]
	pub fn with_geo_transform(mut self, geo_transform: GeoTransform) -> MemoryRaster {
		self.geo_transform = geo_transform;
		self
	}

	/// Sets a north-up geotransform so the raster covers exactly `extent`.
	#[must_use]
	pub fn with_extent(self, extent: &GeoExtent) -> MemoryRaster {
		let geo_transform = GeoTransform::from_array([
			extent.ulx,
			extent.width() / self.width as f64,
			0.0,
			extent.uly,
			0.0,
			-extent.height() / self.height as f64,
		]);
		self.with_geo_transform(geo_transform)
	}

	#[must_use]
	pub fn with_projection(mut self, projection: &str) -> MemoryRaster {
		self.projection = projection.to_string();
		self
	}

	pub fn with_fill(mut self, band: usize, value: f64) -> Result<MemoryRaster> {
		let band = self.band_mut(band)?;
		let value = band.pixel_type.convert(value);
		band.data.fill(value);
		Ok(self)
	}

	pub fn with_band_data(mut self, band: usize, data: Vec<f64>) -> Result<MemoryRaster> {
		let pixel_count = self.width * self.height;
		ensure!(
			data.len() == pixel_count,
			"band data needs {pixel_count} samples, got {}",
			data.len()
		);
		let band = self.band_mut(band)?;
		let pixel_type = band.pixel_type;
		band.data = data.into_iter().map(|v| pixel_type.convert(v)).collect();
		Ok(self)
	}

	pub fn with_no_data(mut self, band: usize, value: f64) -> Result<MemoryRaster> {
		self.band_mut(band)?.no_data = Some(value);
		Ok(self)
	}

	pub fn with_mask(mut self, band: usize, mask: Vec<u8>) -> Result<MemoryRaster> {
		let pixel_count = self.width * self.height;
		ensure!(
			mask.len() == pixel_count,
			"mask needs {pixel_count} samples, got {}",
			mask.len()
		);
		self.band_mut(band)?.mask = Some(mask);
		Ok(self)
	}

	pub fn with_alpha(mut self, band: usize) -> Result<MemoryRaster> {
		self.band_mut(band)?.is_alpha = true;
		Ok(self)
	}

	pub fn with_color_table(mut self, band: usize, color_table: ColorTable) -> Result<MemoryRaster> {
		self.band_mut(band)?.color_table = Some(color_table);
		Ok(self)
	}

	pub fn band(&self, band: usize) -> Result<&MemoryBand> {
		ensure!(band >= 1, "band numbers start at 1");
		self
			.bands
			.get(band - 1)
			.with_context(|| format!("band {band} out of range, raster has {} bands", self.bands.len()))
	}

	pub fn band_mut(&mut self, band: usize) -> Result<&mut MemoryBand> {
		ensure!(band >= 1, "band numbers start at 1");
		let band_count = self.bands.len();
		self
			.bands
			.get_mut(band - 1)
			.with_context(|| format!("band {band} out of range, raster has {band_count} bands"))
	}

	/// Samples of a band, row-major.
	pub fn band_data(&self, band: usize) -> Result<&[f64]> {
		Ok(&self.band(band)?.data)
	}

	fn alpha_band(&self) -> Option<&MemoryBand> {
		self.bands.iter().find(|b| b.is_alpha)
	}

	fn check_window(&self, window: &PixelWindow) -> Result<()> {
		ensure!(
			!window.is_empty() && window.fits_into(self.width, self.height),
			"access window {window} out of range for raster of {}x{} pixels",
			self.width,
			self.height
		);
		Ok(())
	}

	/// Nearest-neighbour sampling of `window` into `out_width × out_height` pixel indices.
	fn sample_indices(&self, window: &PixelWindow, out_width: usize, out_height: usize) -> Result<Vec<usize>> {
		self.check_window(window)?;
		ensure!(
			out_width > 0 && out_height > 0,
			"output size {out_width}x{out_height} must not be empty"
		);
		let source_coordinate = |out: usize, out_size: usize, offset: usize, size: usize| -> usize {
			let position = (out as f64 + 0.5) * size as f64 / out_size as f64;
			offset + (position.floor() as usize).min(size - 1)
		};
		let mut indices = Vec::with_capacity(out_width * out_height);
		for oy in 0..out_height {
			let y = source_coordinate(oy, out_height, window.y_off, window.height);
			for ox in 0..out_width {
				let x = source_coordinate(ox, out_width, window.x_off, window.width);
				indices.push(y * self.width + x);
			}
		}
		Ok(indices)
	}

	fn mask_flags(&self, band: usize) -> Result<MaskFlags> {
		let b = self.band(band)?;
		Ok(if b.mask.is_some() {
			EnumSet::only(MaskFlag::PerDataset)
		} else if b.no_data.is_some() {
			EnumSet::only(MaskFlag::NoData)
		} else if !b.is_alpha && self.alpha_band().is_some() {
			MaskFlag::Alpha | MaskFlag::PerDataset
		} else {
			EnumSet::only(MaskFlag::AllValid)
		})
	}

	fn mask_value(&self, band: &MemoryBand, index: usize) -> f64 {
		if let Some(mask) = &band.mask {
			f64::from(mask[index])
		} else if band.no_data.is_some() {
			if band.is_no_data(band.data[index]) { 0.0 } else { 255.0 }
		} else if let Some(alpha) = self.alpha_band().filter(|_| !band.is_alpha) {
			PixelType::Byte.convert(alpha.data[index])
		} else {
			255.0
		}
	}
}

/// In-memory raster store. See the [module documentation](self).
#[derive(Debug)]
pub struct MemoryRasterStore {
	drivers: Vec<DriverInfo>,
	rasters: HashMap<String, MemoryRaster>,
	handles: Vec<Option<OpenRaster>>,
	max_pixels: Option<usize>,
}

#[derive(Debug)]
struct OpenRaster {
	path: String,
	writable: bool,
}

impl Default for MemoryRasterStore {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryRasterStore {
	/// A store with the drivers `GTiff` and `MEM` (both creatable) and `PNG` (create-copy only).
	pub fn new() -> MemoryRasterStore {
		MemoryRasterStore {
			drivers: vec![
				DriverInfo::creatable("GTiff", &["tif", "tiff"]),
				DriverInfo::creatable("MEM", &[]),
				DriverInfo::copy_only("PNG", &["png"]),
			],
			rasters: HashMap::new(),
			handles: Vec::new(),
			max_pixels: None,
		}
	}

	/// Replaces the driver table.
	#[must_use]
	pub fn with_drivers(mut self, drivers: Vec<DriverInfo>) -> MemoryRasterStore {
		self.drivers = drivers;
		self
	}

	/// Limits the number of samples (`width × height × bands`) a created raster may hold.
	#[must_use]
	pub fn with_max_pixels(mut self, max_pixels: usize) -> MemoryRasterStore {
		self.max_pixels = Some(max_pixels);
		self
	}

	/// Stores `raster` under `path`, replacing whatever was there.
	pub fn insert(&mut self, path: &str, raster: MemoryRaster) {
		self.rasters.insert(path.to_string(), raster);
	}

	pub fn raster(&self, path: &str) -> Option<&MemoryRaster> {
		self.rasters.get(path)
	}

	pub fn raster_mut(&mut self, path: &str) -> Option<&mut MemoryRaster> {
		self.rasters.get_mut(path)
	}

	/// Number of handles that are currently open.
	pub fn open_handle_count(&self) -> usize {
		self.handles.iter().filter(|h| h.is_some()).count()
	}

	fn register(&mut self, path: &str, writable: bool) -> RasterHandle {
		self.handles.push(Some(OpenRaster {
			path: path.to_string(),
			writable,
		}));
		RasterHandle::new(self.handles.len() - 1)
	}

	fn entry(&self, handle: RasterHandle) -> Result<&OpenRaster> {
		self
			.handles
			.get(handle.index())
			.and_then(|h| h.as_ref())
			.with_context(|| format!("raster handle {handle} is not open"))
	}

	fn get(&self, handle: RasterHandle) -> Result<&MemoryRaster> {
		let path = &self.entry(handle)?.path;
		self
			.rasters
			.get(path)
			.with_context(|| format!("raster {path:?} no longer exists"))
	}

	fn get_mut(&mut self, handle: RasterHandle) -> Result<&mut MemoryRaster> {
		let entry = self.entry(handle)?;
		ensure!(entry.writable, "raster {:?} is opened read-only", entry.path);
		let path = entry.path.clone();
		self
			.rasters
			.get_mut(&path)
			.with_context(|| format!("raster {path:?} no longer exists"))
	}
}

impl RasterStore for MemoryRasterStore {
	fn drivers(&self) -> Vec<DriverInfo> {
		self.drivers.clone()
	}

	fn open(&mut self, path: &str) -> Result<RasterHandle> {
		ensure!(self.rasters.contains_key(path), "raster {path:?} does not exist");
		Ok(self.register(path, false))
	}

	fn open_for_update(&mut self, path: &str) -> Option<RasterHandle> {
		if self.rasters.contains_key(path) {
			Some(self.register(path, true))
		} else {
			None
		}
	}

	fn create(&mut self, format: &str, path: &str, parameters: &CreateParameters) -> Result<RasterHandle> {
		let Some(driver) = self.drivers.iter().find(|d| d.name.eq_ignore_ascii_case(format)) else {
			bail!("format driver {format} not found");
		};
		ensure!(driver.can_create, "format driver {} does not support creation", driver.name);
		ensure!(
			parameters.width > 0 && parameters.height > 0 && parameters.band_count > 0,
			"cannot create a raster of {}x{} pixels with {} bands",
			parameters.width,
			parameters.height,
			parameters.band_count
		);
		let Some(samples) = parameters
			.width
			.checked_mul(parameters.height)
			.and_then(|pixels| pixels.checked_mul(parameters.band_count))
		else {
			bail!(
				"cannot allocate {}x{} pixels with {} bands, the sample count overflows",
				parameters.width,
				parameters.height,
				parameters.band_count
			);
		};
		if let Some(max_pixels) = self.max_pixels {
			ensure!(
				samples <= max_pixels,
				"cannot allocate {samples} samples, the store is limited to {max_pixels}"
			);
		}
		for option in &parameters.create_options {
			ensure!(option.contains('='), "create option {option:?} is not of the form KEY=VALUE");
		}

		let raster = MemoryRaster::new(
			parameters.width,
			parameters.height,
			parameters.band_count,
			parameters.pixel_type,
		);
		self.rasters.insert(path.to_string(), raster);
		Ok(self.register(path, true))
	}

	fn close(&mut self, handle: RasterHandle) -> Result<()> {
		self.entry(handle)?;
		self.handles[handle.index()] = None;
		Ok(())
	}

	fn raster_size(&self, handle: RasterHandle) -> Result<(usize, usize)> {
		let raster = self.get(handle)?;
		Ok((raster.width, raster.height))
	}

	fn band_count(&self, handle: RasterHandle) -> Result<usize> {
		Ok(self.get(handle)?.bands.len())
	}

	fn geo_transform(&self, handle: RasterHandle) -> Result<GeoTransform> {
		Ok(self.get(handle)?.geo_transform)
	}

	fn set_geo_transform(&mut self, handle: RasterHandle, geo_transform: &GeoTransform) -> Result<()> {
		self.get_mut(handle)?.geo_transform = *geo_transform;
		Ok(())
	}

	fn projection(&self, handle: RasterHandle) -> Result<String> {
		Ok(self.get(handle)?.projection.clone())
	}

	fn set_projection(&mut self, handle: RasterHandle, projection: &str) -> Result<()> {
		self.get_mut(handle)?.projection = projection.to_string();
		Ok(())
	}

	fn band_pixel_type(&self, handle: RasterHandle, band: usize) -> Result<PixelType> {
		Ok(self.get(handle)?.band(band)?.pixel_type)
	}

	fn color_table(&self, handle: RasterHandle, band: usize) -> Result<Option<ColorTable>> {
		Ok(self.get(handle)?.band(band)?.color_table.clone())
	}

	fn set_color_table(&mut self, handle: RasterHandle, band: usize, color_table: &ColorTable) -> Result<()> {
		self.get_mut(handle)?.band_mut(band)?.color_table = Some(color_table.clone());
		Ok(())
	}

	fn set_no_data(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()> {
		self.get_mut(handle)?.band_mut(band)?.no_data = Some(value);
		Ok(())
	}

	fn fill_band(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()> {
		let band = self.get_mut(handle)?.band_mut(band)?;
		let value = band.pixel_type.convert(value);
		band.data.fill(value);
		Ok(())
	}

	fn mask_flags(&self, handle: RasterHandle, band: usize) -> Result<MaskFlags> {
		self.get(handle)?.mask_flags(band)
	}

	fn is_alpha_band(&self, handle: RasterHandle, band: usize) -> Result<bool> {
		Ok(self.get(handle)?.band(band)?.is_alpha)
	}

	fn read_window(
		&self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		out_width: usize,
		out_height: usize,
		pixel_type: PixelType,
	) -> Result<RasterBuffer> {
		let raster = self.get(handle)?;
		let band = raster.band(band)?;
		let data = raster
			.sample_indices(window, out_width, out_height)?
			.into_iter()
			.map(|i| pixel_type.convert(band.data[i]))
			.collect();
		RasterBuffer::new(out_width, out_height, pixel_type, data)
	}

	fn read_mask_window(
		&self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		out_width: usize,
		out_height: usize,
	) -> Result<RasterBuffer> {
		let raster = self.get(handle)?;
		let band = raster.band(band)?;
		let data = raster
			.sample_indices(window, out_width, out_height)?
			.into_iter()
			.map(|i| raster.mask_value(band, i))
			.collect();
		RasterBuffer::new(out_width, out_height, PixelType::Byte, data)
	}

	fn write_window(
		&mut self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		buffer: &RasterBuffer,
	) -> Result<()> {
		let raster = self.get_mut(handle)?;
		raster.check_window(window)?;
		ensure!(
			buffer.width() == window.width && buffer.height() == window.height,
			"buffer of {}x{} pixels does not match window {window}",
			buffer.width(),
			buffer.height()
		);
		let width = raster.width;
		let band = raster.band_mut(band)?;
		for (row, samples) in buffer.data().chunks(window.width).enumerate() {
			let start = (window.y_off + row) * width + window.x_off;
			for (target, value) in band.data[start..start + window.width].iter_mut().zip(samples) {
				*target = band.pixel_type.convert(*value);
			}
		}
		Ok(())
	}
}
