use anyhow::{Result, ensure};
use serde::Deserialize;

/// The ground size of one pixel.
///
/// `y` is always stored negative (north-up convention), whatever sign it was given with.
///
/// ```
/// use mosaic_core::PixelSize;
///
/// let size = PixelSize::new(0.5, 0.25).unwrap();
/// assert_eq!((size.x, size.y), (0.5, -0.25));
/// assert_eq!(size.abs_y(), 0.25);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "[f64; 2]")]
pub struct PixelSize {
	pub x: f64,
	pub y: f64,
}

impl PixelSize {
	pub fn new(x: f64, y: f64) -> Result<PixelSize> {
		ensure!(x.is_finite() && x > 0.0, "pixel width must be a positive number, got {x}");
		ensure!(y.is_finite() && y != 0.0, "pixel height must be a non-zero number, got {y}");
		Ok(PixelSize { x, y: -y.abs() })
	}

	pub fn abs_y(&self) -> f64 {
		self.y.abs()
	}
}

impl TryFrom<[f64; 2]> for PixelSize {
	type Error = anyhow::Error;

	fn try_from(value: [f64; 2]) -> Result<Self> {
		PixelSize::new(value[0], value[1])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(1.0, 1.0, (1.0, -1.0))]
	#[case(1.0, -1.0, (1.0, -1.0))]
	#[case(0.25, 30.0, (0.25, -30.0))]
	fn y_is_negative(#[case] x: f64, #[case] y: f64, #[case] expected: (f64, f64)) {
		let size = PixelSize::new(x, y).unwrap();
		assert_eq!((size.x, size.y), expected);
	}

	#[rstest]
	#[case(0.0, 1.0)]
	#[case(-1.0, 1.0)]
	#[case(1.0, 0.0)]
	#[case(f64::INFINITY, 1.0)]
	fn invalid_sizes(#[case] x: f64, #[case] y: f64) {
		assert!(PixelSize::new(x, y).is_err());
	}
}
