use anyhow::Result;
use mosaic_core::{RasterStore, SourceDescriptor};
use std::fmt::Write;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// raster file you want to probe
	#[arg(required = true)]
	filename: String,
}

pub fn run<S: RasterStore + ?Sized>(arguments: &Subcommand, store: &mut S) -> Result<()> {
	let handle = store.open(&arguments.filename)?;
	let descriptor = store.descriptor(handle, &arguments.filename);
	store.close(handle)?;
	print!("{}", describe(&descriptor?));
	Ok(())
}

/// Human readable summary of a raster, as printed by `mosaic probe`.
pub fn describe(descriptor: &SourceDescriptor) -> String {
	let extent = &descriptor.extent;
	let pixel_size = descriptor.pixel_size();
	let mut text = String::new();
	let _ = writeln!(text, "raster:      {:?}", descriptor.name);
	let _ = writeln!(text, "size:        {}x{} pixels", descriptor.width, descriptor.height);
	let _ = writeln!(text, "bands:       {} ({})", descriptor.band_count, descriptor.pixel_type);
	let _ = writeln!(
		text,
		"extent:      {}, {}, {}, {}",
		extent.ulx, extent.uly, extent.lrx, extent.lry
	);
	let _ = writeln!(text, "pixel size:  {}, {}", pixel_size.x, pixel_size.y);
	if !descriptor.projection.is_empty() {
		let _ = writeln!(text, "projection:  {}", descriptor.projection);
	}
	if let Some(color_table) = &descriptor.color_table {
		let _ = writeln!(text, "color table: {} entries", color_table.len());
	}
	text
}
