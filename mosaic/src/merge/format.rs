//! Selection of the output format driver.

use anyhow::Result;
use mosaic_core::{DriverInfo, MergeError, RasterStore};
use std::path::Path;

/// Format used when nothing in the driver table matches the output path.
pub const DEFAULT_FORMAT: &str = "GTiff";

fn extension_of(path: &str) -> &str {
	Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Names of all drivers that could write `path`, in driver-table order.
///
/// A driver qualifies if it is a raster driver that can create or create-copy, and if it either
/// lists the file extension of `path` or `path` starts with its connection prefix.
pub fn output_drivers_for(drivers: &[DriverInfo], path: &str) -> Vec<String> {
	let extension = extension_of(path);
	let lower_path = path.to_lowercase();

	let mut names: Vec<String> = drivers
		.iter()
		.filter(|d| d.is_raster && (d.can_create || d.can_create_copy))
		.filter(|d| {
			if !extension.is_empty() && d.handles_extension(extension) {
				return true;
			}
			d.connection_prefix
				.as_ref()
				.is_some_and(|prefix| lower_path.starts_with(&prefix.to_lowercase()))
		})
		.map(|d| d.name.clone())
		.collect();

	// GMT is registered before netCDF, but netCDF is the better writer for .nc files
	if extension.eq_ignore_ascii_case("nc")
		&& names.len() >= 2
		&& names[0].eq_ignore_ascii_case("GMT")
		&& names[1].eq_ignore_ascii_case("netCDF")
	{
		names.swap(0, 1);
	}

	names
}

/// Guesses the output driver for `path`. Falls back to [`DEFAULT_FORMAT`].
pub fn output_driver_for(drivers: &[DriverInfo], path: &str) -> String {
	let mut names = output_drivers_for(drivers, path);
	if names.is_empty() {
		return DEFAULT_FORMAT.to_string();
	}
	if names.len() > 1 {
		log::info!(
			"Several drivers matching {} extension. Using {}",
			extension_of(path),
			names[0]
		);
	}
	names.swap_remove(0)
}

/// Returns the driver the output is written with: the configured `format`, or the one guessed
/// from `output_path`.
///
/// Fails with a configuration error if the driver is unknown or cannot create rasters.
pub fn resolve_format<S: RasterStore + ?Sized>(store: &S, format: Option<&str>, output_path: &str) -> Result<String> {
	let drivers = store.drivers();
	let format = match format {
		Some(format) => format.to_string(),
		None => output_driver_for(&drivers, output_path),
	};

	let Some(driver) = drivers.iter().find(|d| d.name.eq_ignore_ascii_case(&format)) else {
		return Err(MergeError::Configuration(format!("format driver {format} not found")).into());
	};
	if !store.driver_supports_create(&driver.name) {
		return Err(MergeError::Configuration(format!(
			"format driver {} does not support creation and piecewise writing",
			driver.name
		))
		.into());
	}
	log::debug!("writing {output_path:?} with driver {}", driver.name);
	Ok(driver.name.clone())
}
