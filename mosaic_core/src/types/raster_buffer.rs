use super::PixelType;
use anyhow::{Result, ensure};

/// Row-major samples of one band window.
///
/// Samples are kept as `f64`, which represents every supported integer type exactly. The
/// `pixel_type` records which type the samples were read as (or should be written as).
#[derive(Clone, Debug, PartialEq)]
pub struct RasterBuffer {
	width: usize,
	height: usize,
	pixel_type: PixelType,
	data: Vec<f64>,
}

impl RasterBuffer {
	pub fn new(width: usize, height: usize, pixel_type: PixelType, data: Vec<f64>) -> Result<RasterBuffer> {
		ensure!(
			data.len() == width * height,
			"buffer of {width}x{height} pixels needs {} samples, got {}",
			width * height,
			data.len()
		);
		Ok(RasterBuffer {
			width,
			height,
			pixel_type,
			data,
		})
	}

	/// A buffer where every sample is `value`, converted to `pixel_type`.
	pub fn filled(width: usize, height: usize, pixel_type: PixelType, value: f64) -> RasterBuffer {
		RasterBuffer {
			width,
			height,
			pixel_type,
			data: vec![pixel_type.convert(value); width * height],
		}
	}

	pub fn width(&self) -> usize {
		self.width
	}

	pub fn height(&self) -> usize {
		self.height
	}

	pub fn pixel_type(&self) -> PixelType {
		self.pixel_type
	}

	pub fn data(&self) -> &[f64] {
		&self.data
	}

	pub fn into_data(self) -> Vec<f64> {
		self.data
	}

	pub fn get(&self, x: usize, y: usize) -> Option<f64> {
		if x < self.width && y < self.height {
			Some(self.data[y * self.width + x])
		} else {
			None
		}
	}

	/// Returns a copy with every sample converted to `pixel_type`.
	#[must_use]
	pub fn converted(&self, pixel_type: PixelType) -> RasterBuffer {
		RasterBuffer {
			width: self.width,
			height: self.height,
			pixel_type,
			data: self.data.iter().map(|v| pixel_type.convert(*v)).collect(),
		}
	}

	pub fn has_same_size(&self, other: &RasterBuffer) -> bool {
		self.width == other.width && self.height == other.height
	}
}
