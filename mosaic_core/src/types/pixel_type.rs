//! This module defines the `PixelType` enum, the sample types a raster band can store.
//!
//! Names follow GDAL (`Byte`, `UInt16`, `Int16`, `UInt32`, `Int32`, `Float32`, `Float64`) and are
//! parsed case-insensitively.
//!
//! # Examples
//!
//! ```
//! use mosaic_core::PixelType;
//!
//! let pixel_type: PixelType = "uint16".parse().unwrap();
//! assert_eq!(pixel_type, PixelType::UInt16);
//! assert_eq!(pixel_type.to_string(), "UInt16");
//!
//! // Values are rounded and saturated when converted into an integer type.
//! assert_eq!(PixelType::Byte.convert(300.0), 255.0);
//! assert_eq!(PixelType::Int16.convert(-2.6), -3.0);
//! ```

use anyhow::{Result, bail};
use serde::Deserialize;
use std::{fmt::Display, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum PixelType {
	Byte,
	UInt16,
	Int16,
	UInt32,
	Int32,
	Float32,
	Float64,
}

impl PixelType {
	pub const ALL: [PixelType; 7] = [
		PixelType::Byte,
		PixelType::UInt16,
		PixelType::Int16,
		PixelType::UInt32,
		PixelType::Int32,
		PixelType::Float32,
		PixelType::Float64,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			PixelType::Byte => "Byte",
			PixelType::UInt16 => "UInt16",
			PixelType::Int16 => "Int16",
			PixelType::UInt32 => "UInt32",
			PixelType::Int32 => "Int32",
			PixelType::Float32 => "Float32",
			PixelType::Float64 => "Float64",
		}
	}

	pub fn size_bits(&self) -> u32 {
		match self {
			PixelType::Byte => 8,
			PixelType::UInt16 | PixelType::Int16 => 16,
			PixelType::UInt32 | PixelType::Int32 | PixelType::Float32 => 32,
			PixelType::Float64 => 64,
		}
	}

	pub fn is_integer(&self) -> bool {
		!matches!(self, PixelType::Float32 | PixelType::Float64)
	}

	/// The value range of integer types, `None` for floating point types.
	fn range(&self) -> Option<(f64, f64)> {
		match self {
			PixelType::Byte => Some((0.0, f64::from(u8::MAX))),
			PixelType::UInt16 => Some((0.0, f64::from(u16::MAX))),
			PixelType::Int16 => Some((f64::from(i16::MIN), f64::from(i16::MAX))),
			PixelType::UInt32 => Some((0.0, f64::from(u32::MAX))),
			PixelType::Int32 => Some((f64::from(i32::MIN), f64::from(i32::MAX))),
			PixelType::Float32 | PixelType::Float64 => None,
		}
	}

	/// Converts a sample into this type the way a raster write would store it.
	///
	/// Integer types round to the nearest value and saturate at their bounds; `NaN` becomes `0`.
	/// `Float32` loses precision, `Float64` keeps the value unchanged.
	pub fn convert(&self, value: f64) -> f64 {
		match self.range() {
			Some((min, max)) => {
				if value.is_nan() {
					0.0
				} else {
					value.round().clamp(min, max)
				}
			}
			None => match self {
				PixelType::Float32 => f64::from(value as f32),
				_ => value,
			},
		}
	}

	/// Whether a sample stored in this type equals `no_data` compared in this type.
	///
	/// Integer types only match a whole `no_data` within their range. `Float32` compares against
	/// `no_data` rounded to `f32`. A `NaN` no-data value matches `NaN` samples.
	pub fn is_no_data(&self, value: f64, no_data: f64) -> bool {
		if no_data.is_nan() {
			return value.is_nan();
		}
		match self.range() {
			Some((min, max)) => no_data.fract() == 0.0 && (min..=max).contains(&no_data) && value == no_data,
			None => value == self.convert(no_data),
		}
	}
}

impl Display for PixelType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PixelType {
	type Err = anyhow::Error;

	fn from_str(value: &str) -> Result<Self> {
		for pixel_type in PixelType::ALL {
			if pixel_type.as_str().eq_ignore_ascii_case(value) {
				return Ok(pixel_type);
			}
		}
		bail!("Unknown pixel data type: {value}")
	}
}

impl TryFrom<String> for PixelType {
	type Error = anyhow::Error;

	fn try_from(value: String) -> Result<Self> {
		value.parse()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Byte", PixelType::Byte)]
	#[case("byte", PixelType::Byte)]
	#[case("UINT16", PixelType::UInt16)]
	#[case("Int16", PixelType::Int16)]
	#[case("uint32", PixelType::UInt32)]
	#[case("int32", PixelType::Int32)]
	#[case("Float32", PixelType::Float32)]
	#[case("float64", PixelType::Float64)]
	fn parse_names(#[case] name: &str, #[case] expected: PixelType) {
		assert_eq!(name.parse::<PixelType>().unwrap(), expected);
	}

	#[test]
	fn parse_unknown_name() {
		let err = "CFloat64".parse::<PixelType>().unwrap_err();
		assert_eq!(err.to_string(), "Unknown pixel data type: CFloat64");
	}

	#[test]
	fn display_matches_parse() {
		for pixel_type in PixelType::ALL {
			assert_eq!(pixel_type.to_string().parse::<PixelType>().unwrap(), pixel_type);
		}
	}

	#[rstest]
	#[case(PixelType::Byte, -5.0, 0.0)]
	#[case(PixelType::Byte, 254.6, 255.0)]
	#[case(PixelType::Byte, 1000.0, 255.0)]
	#[case(PixelType::Byte, f64::NAN, 0.0)]
	#[case(PixelType::UInt16, 70000.0, 65535.0)]
	#[case(PixelType::Int16, -40000.0, -32768.0)]
	#[case(PixelType::Int16, 12.4, 12.0)]
	#[case(PixelType::UInt32, -1.0, 0.0)]
	#[case(PixelType::Int32, 3e10, 2_147_483_647.0)]
	#[case(PixelType::Float32, 0.1, 0.100_000_001_490_116_12)]
	#[case(PixelType::Float64, 0.1, 0.1)]
	fn convert(#[case] pixel_type: PixelType, #[case] value: f64, #[case] expected: f64) {
		assert_eq!(pixel_type.convert(value), expected);
	}

	#[rstest]
	#[case(PixelType::Float32, 0.100_000_001_490_116_12, 0.1, true)]
	#[case(PixelType::Float32, 0.2, 0.1, false)]
	#[case(PixelType::Float64, 0.1, 0.1, true)]
	#[case(PixelType::Float64, 0.100_000_001_490_116_12, 0.1, false)]
	#[case(PixelType::Byte, 0.0, 0.4, false)]
	#[case(PixelType::Byte, 255.0, 300.0, false)]
	#[case(PixelType::Byte, 255.0, 255.0, true)]
	#[case(PixelType::Int16, -9999.0, -9999.0, true)]
	#[case(PixelType::UInt16, 0.0, -1.0, false)]
	#[case(PixelType::Float32, f64::NAN, f64::NAN, true)]
	#[case(PixelType::Byte, 0.0, f64::NAN, false)]
	fn is_no_data(#[case] pixel_type: PixelType, #[case] value: f64, #[case] no_data: f64, #[case] expected: bool) {
		assert_eq!(pixel_type.is_no_data(value, no_data), expected);
	}

	#[test]
	fn float_types_keep_nan() {
		assert!(PixelType::Float32.convert(f64::NAN).is_nan());
		assert!(PixelType::Float64.convert(f64::NAN).is_nan());
	}

	#[test]
	fn size_bits() {
		assert_eq!(PixelType::Byte.size_bits(), 8);
		assert_eq!(PixelType::Int16.size_bits(), 16);
		assert_eq!(PixelType::Float32.size_bits(), 32);
		assert_eq!(PixelType::Float64.size_bits(), 64);
		assert!(PixelType::UInt32.is_integer());
		assert!(!PixelType::Float64.is_integer());
	}
}
