use anyhow::{Context, Result, bail};
use enumset::EnumSet;
use gdal::{
	Dataset, DatasetOptions, DriverManager, GdalOpenFlags, Metadata,
	cpl::CslStringList,
	raster::{
		Buffer, ColorEntry as GdalColorEntry, ColorInterpretation, GdalDataType, PaletteInterpretation, RasterBand,
		ResampleAlg, RgbaEntry,
	},
};
use mosaic_core::{
	ColorEntry, ColorTable, CreateParameters, DriverInfo, GeoTransform, MaskFlag, MaskFlags, PixelType, PixelWindow,
	RasterBuffer, RasterHandle, RasterStore,
};

/// Raster store reading and writing files through GDAL.
///
/// Datasets stay open until [`RasterStore::close`] is called, which flushes them to disk.
#[derive(Debug, Default)]
pub struct GdalRasterStore {
	datasets: Vec<Option<Dataset>>,
}

impl GdalRasterStore {
	pub fn new() -> GdalRasterStore {
		DriverManager::register_all();
		GdalRasterStore::default()
	}

	fn register(&mut self, dataset: Dataset) -> RasterHandle {
		self.datasets.push(Some(dataset));
		RasterHandle::new(self.datasets.len() - 1)
	}

	fn dataset(&self, handle: RasterHandle) -> Result<&Dataset> {
		self
			.datasets
			.get(handle.index())
			.and_then(|d| d.as_ref())
			.with_context(|| format!("raster handle {handle} is not open"))
	}

	fn dataset_mut(&mut self, handle: RasterHandle) -> Result<&mut Dataset> {
		self
			.datasets
			.get_mut(handle.index())
			.and_then(|d| d.as_mut())
			.with_context(|| format!("raster handle {handle} is not open"))
	}

	fn band(&self, handle: RasterHandle, band: usize) -> Result<RasterBand<'_>> {
		self
			.dataset(handle)?
			.rasterband(band)
			.with_context(|| format!("Failed to get band {band} of raster {handle}"))
	}
}

fn pixel_type_of(data_type: GdalDataType) -> Result<PixelType> {
	Ok(match data_type {
		GdalDataType::UInt8 => PixelType::Byte,
		GdalDataType::UInt16 => PixelType::UInt16,
		GdalDataType::Int16 => PixelType::Int16,
		GdalDataType::UInt32 => PixelType::UInt32,
		GdalDataType::Int32 => PixelType::Int32,
		GdalDataType::Float32 => PixelType::Float32,
		GdalDataType::Float64 => PixelType::Float64,
		other => bail!("unsupported GDAL data type {other:?}"),
	})
}

fn driver_info(driver: &gdal::Driver) -> DriverInfo {
	let item = |key: &str| driver.metadata_item(key, "");
	DriverInfo {
		name: driver.short_name(),
		extensions: item("DMD_EXTENSIONS")
			.map(|e| e.split_whitespace().map(str::to_lowercase).collect())
			.unwrap_or_default(),
		connection_prefix: item("DMD_CONNECTION_PREFIX"),
		can_create: item("DCAP_CREATE").is_some(),
		can_create_copy: item("DCAP_CREATECOPY").is_some(),
		is_raster: item("DCAP_RASTER").is_some(),
	}
}

fn check_window(band: &RasterBand, window: &PixelWindow) -> Result<()> {
	let (width, height) = band.size();
	if window.is_empty() || !window.fits_into(width, height) {
		bail!("access window {window} out of range for raster of {width}x{height} pixels");
	}
	Ok(())
}

impl RasterStore for GdalRasterStore {
	fn drivers(&self) -> Vec<DriverInfo> {
		(0..DriverManager::count())
			.filter_map(|index| DriverManager::get_driver(index).ok())
			.map(|driver| driver_info(&driver))
			.collect()
	}

	fn open(&mut self, path: &str) -> Result<RasterHandle> {
		let dataset = Dataset::open(path).with_context(|| format!("Failed to open raster {path:?}"))?;
		let (width, height) = dataset.raster_size();
		log::trace!("opened {path:?} ({width}x{height}, {} bands)", dataset.raster_count());
		Ok(self.register(dataset))
	}

	fn open_for_update(&mut self, path: &str) -> Option<RasterHandle> {
		// Without GDAL_OF_VERBOSE_ERROR a failed open stays quiet, which also covers
		// virtual paths and connection strings that are not plain files.
		let options = DatasetOptions {
			open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
			..DatasetOptions::default()
		};
		match Dataset::open_ex(path, options) {
			Ok(dataset) => Some(self.register(dataset)),
			Err(err) => {
				log::debug!("cannot open {path:?} for update: {err}");
				None
			}
		}
	}

	fn create(&mut self, format: &str, path: &str, parameters: &CreateParameters) -> Result<RasterHandle> {
		let driver = DriverManager::get_driver_by_name(format)
			.with_context(|| format!("format driver {format} not found"))?;

		let mut options = CslStringList::new();
		for option in &parameters.create_options {
			options.add_string(option)?;
		}

		let CreateParameters {
			width,
			height,
			band_count,
			..
		} = *parameters;
		let dataset = match parameters.pixel_type {
			PixelType::Byte => driver.create_with_band_type_with_options::<u8, _>(path, width, height, band_count, &options),
			PixelType::UInt16 => {
				driver.create_with_band_type_with_options::<u16, _>(path, width, height, band_count, &options)
			}
			PixelType::Int16 => {
				driver.create_with_band_type_with_options::<i16, _>(path, width, height, band_count, &options)
			}
			PixelType::UInt32 => {
				driver.create_with_band_type_with_options::<u32, _>(path, width, height, band_count, &options)
			}
			PixelType::Int32 => {
				driver.create_with_band_type_with_options::<i32, _>(path, width, height, band_count, &options)
			}
			PixelType::Float32 => {
				driver.create_with_band_type_with_options::<f32, _>(path, width, height, band_count, &options)
			}
			PixelType::Float64 => {
				driver.create_with_band_type_with_options::<f64, _>(path, width, height, band_count, &options)
			}
		}
		.with_context(|| format!("Failed to create {path:?} with driver {format}"))?;

		log::trace!("created {path:?} ({width}x{height}, {band_count} bands, {})", parameters.pixel_type);
		Ok(self.register(dataset))
	}

	fn close(&mut self, handle: RasterHandle) -> Result<()> {
		let Some(mut dataset) = self.datasets.get_mut(handle.index()).and_then(Option::take) else {
			bail!("raster handle {handle} is not open");
		};
		dataset.flush_cache()?;
		Ok(())
	}

	fn raster_size(&self, handle: RasterHandle) -> Result<(usize, usize)> {
		Ok(self.dataset(handle)?.raster_size())
	}

	fn band_count(&self, handle: RasterHandle) -> Result<usize> {
		Ok(self.dataset(handle)?.raster_count())
	}

	fn geo_transform(&self, handle: RasterHandle) -> Result<GeoTransform> {
		let gt = self
			.dataset(handle)?
			.geo_transform()
			.with_context(|| format!("raster {handle} has no geotransform"))?;
		Ok(GeoTransform::from_array(gt))
	}

	fn set_geo_transform(&mut self, handle: RasterHandle, geo_transform: &GeoTransform) -> Result<()> {
		self.dataset_mut(handle)?.set_geo_transform(&geo_transform.as_array())?;
		Ok(())
	}

	fn projection(&self, handle: RasterHandle) -> Result<String> {
		Ok(self.dataset(handle)?.projection())
	}

	fn set_projection(&mut self, handle: RasterHandle, projection: &str) -> Result<()> {
		if projection.is_empty() {
			return Ok(());
		}
		self.dataset_mut(handle)?.set_projection(projection)?;
		Ok(())
	}

	fn band_pixel_type(&self, handle: RasterHandle, band: usize) -> Result<PixelType> {
		pixel_type_of(self.band(handle, band)?.band_type())
	}

	fn color_table(&self, handle: RasterHandle, band: usize) -> Result<Option<ColorTable>> {
		let band = self.band(handle, band)?;
		let Some(table) = band.color_table() else {
			return Ok(None);
		};
		let entries = (0..table.entry_count())
			.filter_map(|index| table.entry_as_rgb(index))
			.map(|e| ColorEntry::rgba(e.r, e.g, e.b, e.a))
			.collect();
		Ok(Some(ColorTable::new(entries)))
	}

	fn set_color_table(&mut self, handle: RasterHandle, band: usize, color_table: &ColorTable) -> Result<()> {
		let mut table = gdal::raster::ColorTable::new(PaletteInterpretation::Rgba);
		for (index, entry) in color_table.entries.iter().enumerate() {
			let index = u16::try_from(index).context("color table has more than 65536 entries")?;
			let rgba = RgbaEntry {
				r: entry.r,
				g: entry.g,
				b: entry.b,
				a: entry.a,
			};
			table.set_color_entry(index, &GdalColorEntry::Rgba(rgba));
		}
		self.band(handle, band)?.set_color_table(&table);
		Ok(())
	}

	fn set_no_data(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()> {
		self.band(handle, band)?.set_no_data_value(Some(value))?;
		Ok(())
	}

	fn fill_band(&mut self, handle: RasterHandle, band: usize, value: f64) -> Result<()> {
		self.band(handle, band)?.fill(value, None)?;
		Ok(())
	}

	fn mask_flags(&self, handle: RasterHandle, band: usize) -> Result<MaskFlags> {
		let flags = self.band(handle, band)?.mask_flags()?;
		let mut result = EnumSet::empty();
		if flags.is_all_valid() {
			result |= MaskFlag::AllValid;
		}
		if flags.is_per_dataset() {
			result |= MaskFlag::PerDataset;
		}
		if flags.is_alpha() {
			result |= MaskFlag::Alpha;
		}
		if flags.is_nodata() {
			result |= MaskFlag::NoData;
		}
		Ok(result)
	}

	fn is_alpha_band(&self, handle: RasterHandle, band: usize) -> Result<bool> {
		Ok(matches!(
			self.band(handle, band)?.color_interpretation(),
			ColorInterpretation::AlphaBand
		))
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
		let band = self.band(handle, band)?;
		check_window(&band, window)?;
		let buffer = band.read_as::<f64>(
			(window.x_off as isize, window.y_off as isize),
			(window.width, window.height),
			(out_width, out_height),
			Some(ResampleAlg::NearestNeighbour),
		)?;
		let data = buffer.data().iter().map(|v| pixel_type.convert(*v)).collect();
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
		let band = self.band(handle, band)?;
		check_window(&band, window)?;
		let mask = band.open_mask_band()?;
		let buffer = mask.read_as::<u8>(
			(window.x_off as isize, window.y_off as isize),
			(window.width, window.height),
			(out_width, out_height),
			Some(ResampleAlg::NearestNeighbour),
		)?;
		let data = buffer.data().iter().map(|v| f64::from(*v)).collect();
		RasterBuffer::new(out_width, out_height, PixelType::Byte, data)
	}

	fn write_window(
		&mut self,
		handle: RasterHandle,
		band: usize,
		window: &PixelWindow,
		buffer: &RasterBuffer,
	) -> Result<()> {
		let mut band = self.band(handle, band)?;
		check_window(&band, window)?;
		if buffer.width() != window.width || buffer.height() != window.height {
			bail!(
				"buffer of {}x{} pixels does not match window {window}",
				buffer.width(),
				buffer.height()
			);
		}
		let pixel_type = pixel_type_of(band.band_type())?;
		let data = buffer.data().iter().map(|v| pixel_type.convert(*v)).collect();
		let mut data = Buffer::new((window.width, window.height), data);
		band.write(
			(window.x_off as isize, window.y_off as isize),
			(window.width, window.height),
			&mut data,
		)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{config::MergeConfig, merge::merge_files};
	use mosaic_core::{GeoExtent, MergeError};
	use pretty_assertions::assert_eq;

	fn path(dir: &tempfile::TempDir, name: &str) -> String {
		dir.path().join(name).to_string_lossy().to_string()
	}

	fn write_source(store: &mut GdalRasterStore, path: &str, extent: &GeoExtent, value: f64) {
		let parameters = CreateParameters {
			width: 2,
			height: 2,
			band_count: 1,
			pixel_type: PixelType::Byte,
			create_options: vec![],
		};
		let handle = store.create("GTiff", path, &parameters).unwrap();
		let gt = GeoTransform::from_array([extent.ulx, extent.width() / 2.0, 0.0, extent.uly, 0.0, -extent.height() / 2.0]);
		store.set_geo_transform(handle, &gt).unwrap();
		store.fill_band(handle, 1, value).unwrap();
		store.close(handle).unwrap();
	}

	#[test]
	fn drivers_include_gtiff() {
		let store = GdalRasterStore::new();
		let gtiff = store.drivers().into_iter().find(|d| d.name == "GTiff").unwrap();
		assert!(gtiff.can_create);
		assert!(gtiff.handles_extension("tif"));
		assert!(store.driver_supports_create("GTiff"));
	}

	#[test]
	fn write_and_read_window() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = GdalRasterStore::new();
		let parameters = CreateParameters {
			width: 3,
			height: 2,
			band_count: 1,
			pixel_type: PixelType::Int16,
			create_options: vec!["COMPRESS=LZW".to_string()],
		};
		let handle = store.create("GTiff", &path(&dir, "a.tif"), &parameters).unwrap();
		let buffer = RasterBuffer::new(2, 1, PixelType::Float64, vec![-3.6, 70000.0]).unwrap();
		store.write_window(handle, 1, &PixelWindow::new(1, 1, 2, 1), &buffer).unwrap();

		let read = store
			.read_window(handle, 1, &PixelWindow::full(3, 2), 3, 2, PixelType::Int16)
			.unwrap();
		assert_eq!(read.data(), &[0.0, 0.0, 0.0, 0.0, -4.0, 32767.0]);
		assert_eq!(store.band_pixel_type(handle, 1).unwrap(), PixelType::Int16);
		assert!(
			store
				.read_window(handle, 1, &PixelWindow::new(2, 0, 2, 1), 2, 1, PixelType::Int16)
				.is_err()
		);
	}

	#[test]
	fn open_for_update_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = GdalRasterStore::new();
		assert_eq!(store.open_for_update(&path(&dir, "missing.tif")), None);
	}

	#[test]
	fn no_data_mask() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = GdalRasterStore::new();
		let source = path(&dir, "a.tif");
		write_source(&mut store, &source, &GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap(), 0.0);
		let handle = store.open_for_update(&source).unwrap();
		store.set_no_data(handle, 1, 0.0).unwrap();
		assert!(store.mask_flags(handle, 1).unwrap().contains(MaskFlag::NoData));
		let mask = store
			.read_mask_window(handle, 1, &PixelWindow::full(2, 2), 2, 2)
			.unwrap();
		assert_eq!(mask.data(), &[0.0; 4]);
	}

	#[test]
	fn merge_two_files() {
		let dir = tempfile::tempdir().unwrap();
		let mut store = GdalRasterStore::new();
		let a = path(&dir, "a.tif");
		let b = path(&dir, "b.tif");
		write_source(&mut store, &a, &GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap(), 5.0);
		write_source(&mut store, &b, &GeoExtent::new(1.0, 1.0, 2.0, 0.0).unwrap(), 7.0);

		let output = path(&dir, "out.tif");
		let plan = merge_files(&mut store, &MergeConfig::new(&output), &[&a, &b]).unwrap();
		store.close(plan.handle).unwrap();

		let handle = store.open(&output).unwrap();
		assert_eq!(store.raster_size(handle).unwrap(), (4, 2));
		let data = store
			.read_window(handle, 1, &PixelWindow::full(4, 2), 4, 2, PixelType::Byte)
			.unwrap();
		assert_eq!(data.data(), &[5.0, 5.0, 7.0, 7.0, 5.0, 5.0, 7.0, 7.0]);

		let config = MergeConfig {
			separate_bands: true,
			..MergeConfig::new(&output)
		};
		let err = merge_files(&mut store, &config, &[&a, &b]).unwrap_err();
		assert!(matches!(MergeError::of(&err), Some(MergeError::Layout { .. })));
	}

	#[test]
	fn reuses_virtual_file_output() {
		let mut store = GdalRasterStore::new();
		let a = "/vsimem/mosaic_reuse/a.tif";
		let b = "/vsimem/mosaic_reuse/b.tif";
		write_source(&mut store, a, &GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap(), 5.0);
		write_source(&mut store, b, &GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap(), 7.0);

		let output = "/vsimem/mosaic_reuse/out.tif";
		let plan = merge_files(&mut store, &MergeConfig::new(output), &[a]).unwrap();
		assert!(plan.created);
		store.close(plan.handle).unwrap();

		let handle = store.open_for_update(output).unwrap();
		store.close(handle).unwrap();

		let plan = merge_files(&mut store, &MergeConfig::new(output), &[b]).unwrap();
		assert!(!plan.created);
		store.close(plan.handle).unwrap();

		let config = MergeConfig {
			separate_bands: true,
			..MergeConfig::new(output)
		};
		let err = merge_files(&mut store, &config, &[a, b]).unwrap_err();
		assert!(matches!(MergeError::of(&err), Some(MergeError::Layout { .. })));
	}
}
