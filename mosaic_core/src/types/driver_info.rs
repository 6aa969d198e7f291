/// Capabilities of one output format as advertised by a raster store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverInfo {
	/// Short driver name, e.g. `GTiff`.
	pub name: String,
	/// File extensions handled by the driver, lower case, without dots.
	pub extensions: Vec<String>,
	/// Connection prefix for non-file formats, e.g. `PG:`.
	pub connection_prefix: Option<String>,
	/// Rasters can be created and written piecewise.
	pub can_create: bool,
	/// Rasters can be written by copying a finished raster.
	pub can_create_copy: bool,
	pub is_raster: bool,
}

impl DriverInfo {
	/// A raster driver with the given extensions that supports `Create`.
	pub fn creatable(name: &str, extensions: &[&str]) -> DriverInfo {
		DriverInfo {
			name: name.to_string(),
			extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
			connection_prefix: None,
			can_create: true,
			can_create_copy: true,
			is_raster: true,
		}
	}

	/// A raster driver that can only write through `CreateCopy`.
	pub fn copy_only(name: &str, extensions: &[&str]) -> DriverInfo {
		DriverInfo {
			can_create: false,
			..DriverInfo::creatable(name, extensions)
		}
	}

	#[must_use]
	pub fn with_connection_prefix(mut self, prefix: &str) -> DriverInfo {
		self.connection_prefix = Some(prefix.to_string());
		self
	}

	pub fn handles_extension(&self, extension: &str) -> bool {
		let extension = extension.to_lowercase();
		self.extensions.iter().any(|e| *e == extension)
	}
}
