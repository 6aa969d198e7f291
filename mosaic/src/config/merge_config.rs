use anyhow::{Context, Result};
use mosaic_core::{GeoExtent, MergeError, PixelSize, PixelType};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// Options of a single merge run. Immutable while the run executes.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
	/// Raster to reuse or create.
	pub output_path: Option<String>,

	/// Name of the output format driver. Guessed from `output_path` when missing.
	pub format: Option<String>,

	/// Ordered `KEY=VALUE` pairs, passed to the driver when the output is created.
	pub create_options: Vec<String>,

	/// Output pixel size. The y component is always stored negative.
	pub pixel_size: Option<PixelSize>,

	/// Output extent as `[ulx, uly, lrx, lry]`.
	pub target_extent: Option<GeoExtent>,

	/// Snap the output extent outward to multiples of the pixel size.
	pub target_aligned_pixels: bool,

	/// Give every source band its own output band instead of overwriting shared bands.
	pub separate_bands: bool,

	/// Values to fill the output bands with before copying. One value per band, or a single
	/// value for all bands.
	pub pre_init: Vec<f64>,

	/// Source value that is treated as transparent.
	pub src_nodata: Option<f64>,

	/// No-data value assigned to every output band.
	pub dst_nodata: Option<f64>,

	/// Pixel type of a newly created output.
	pub pixel_type: Option<PixelType>,

	/// Allocate the output but copy no pixels.
	pub create_only: bool,

	/// Copy the color table of the first source to band 1 of a new output.
	pub copy_color_table: bool,

	/// Suppress progress output.
	pub quiet: bool,
}

impl MergeConfig {
	pub fn new(output_path: &str) -> MergeConfig {
		MergeConfig {
			output_path: Some(output_path.to_string()),
			..MergeConfig::default()
		}
	}

	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		serde_yaml_ng::from_reader(reader)
			.context(MergeError::Configuration("invalid merge configuration".to_string()))
	}

	pub fn from_string(text: &str) -> Result<Self> {
		serde_yaml_ng::from_str(text).context(MergeError::Configuration("invalid merge configuration".to_string()))
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path)
			.with_context(|| MergeError::Configuration(format!("cannot open configuration file {path:?}")))?;
		Self::from_reader(BufReader::new(file)).with_context(|| format!("Failed to read configuration file {path:?}"))
	}

	/// The output path, or a configuration error if none is set.
	pub fn output_path(&self) -> Result<&str> {
		match self.output_path.as_deref() {
			Some(path) if !path.is_empty() => Ok(path),
			_ => Err(MergeError::Configuration("missing output path".to_string()).into()),
		}
	}

	/// Values to fill each of `band_count` bands with, following the pre-init rule: one value per
	/// band if there are enough values, the only value for every band if there is exactly one.
	/// Returns `None` if no fill applies.
	pub fn pre_init_values(&self, band_count: usize) -> Option<Vec<f64>> {
		if self.pre_init.is_empty() {
			None
		} else if self.pre_init.len() >= band_count {
			Some(self.pre_init[..band_count].to_vec())
		} else if self.pre_init.len() == 1 {
			Some(vec![self.pre_init[0]; band_count])
		} else {
			log::warn!(
				"ignoring {} pre-init values for an output with {band_count} bands",
				self.pre_init.len()
			);
			None
		}
	}
}
