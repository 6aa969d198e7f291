use crate::{config::MergeConfig, merge::merge_files};
use anyhow::{Context, Result};
use mosaic_core::{GeoExtent, MergeError, PixelSize, PixelType, RasterStore};
use std::path::PathBuf;

#[allow(clippy::struct_excessive_bools)]
#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// input rasters, merged in this order, later ones overwrite earlier ones
	#[arg(value_name = "INPUT_FILES")]
	input_files: Vec<String>,

	/// output raster, reused if it exists
	#[arg(long, short, value_name = "FILE", display_order = 1)]
	output: Option<String>,

	/// output format driver, e.g. GTiff, guessed from the file name if missing
	#[arg(long = "of", value_name = "FORMAT", display_order = 1)]
	format: Option<String>,

	/// creation option passed to the driver, may be repeated
	#[arg(long = "co", value_name = "NAME=VALUE", display_order = 1)]
	create_options: Vec<String>,

	/// configuration file in YAML, command line flags take precedence
	#[arg(long, value_name = "FILE", display_order = 1)]
	config: Option<PathBuf>,

	/// output pixel size
	#[arg(long = "ps", num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true, display_order = 2)]
	pixel_size: Option<Vec<f64>>,

	/// output extent
	#[arg(long = "ul-lr", num_args = 4, value_names = ["ULX", "ULY", "LRX", "LRY"], allow_negative_numbers = true, display_order = 2)]
	extent: Option<Vec<f64>>,

	/// align the output extent to multiples of the pixel size
	#[arg(long, display_order = 2)]
	tap: bool,

	/// place the bands of each input in separate output bands
	#[arg(long, display_order = 3)]
	separate: bool,

	/// copy the color table of the first input
	#[arg(long, display_order = 3)]
	pct: bool,

	/// pre-initialise the output bands with these values
	#[arg(long, value_name = "\"VALUE [VALUE...]\"", allow_hyphen_values = true, display_order = 3)]
	init: Option<String>,

	/// ignore input pixels with this value
	#[arg(short = 'n', value_name = "VALUE", allow_negative_numbers = true, display_order = 3)]
	nodata: Option<f64>,

	/// assign this no-data value to the output bands
	#[arg(long = "a-nodata", value_name = "VALUE", allow_negative_numbers = true, display_order = 3)]
	a_nodata: Option<f64>,

	/// pixel type of a new output: Byte, UInt16, Int16, UInt32, Int32, Float32 or Float64
	#[arg(long = "ot", value_name = "TYPE", display_order = 3)]
	pixel_type: Option<PixelType>,

	/// create the output, but do not copy any pixels
	#[arg(long, display_order = 4)]
	createonly: bool,
}

fn configuration_error(message: &str) -> MergeError {
	MergeError::Configuration(message.to_string())
}

impl Subcommand {
	/// Builds the merge configuration: the config file if given, overridden by the flags.
	pub fn to_config(&self) -> Result<MergeConfig> {
		let mut config = match &self.config {
			Some(path) => MergeConfig::from_path(path)?,
			None => MergeConfig::default(),
		};

		if let Some(output) = &self.output {
			config.output_path = Some(output.clone());
		}
		if let Some(format) = &self.format {
			config.format = Some(format.clone());
		}
		if !self.create_options.is_empty() {
			config.create_options = self.create_options.clone();
		}
		if let Some(size) = &self.pixel_size {
			let pixel_size = PixelSize::new(size[0], size[1]).context(configuration_error("invalid pixel size"))?;
			config.pixel_size = Some(pixel_size);
		}
		if let Some(e) = &self.extent {
			let extent = GeoExtent::new(e[0], e[1], e[2], e[3]).context(configuration_error("invalid extent"))?;
			config.target_extent = Some(extent);
		}
		if let Some(init) = &self.init {
			config.pre_init = init
				.split_whitespace()
				.map(str::parse::<f64>)
				.collect::<Result<_, _>>()
				.with_context(|| configuration_error(&format!("invalid init values {init:?}")))?;
		}
		if self.nodata.is_some() {
			config.src_nodata = self.nodata;
		}
		if self.a_nodata.is_some() {
			config.dst_nodata = self.a_nodata;
		}
		if self.pixel_type.is_some() {
			config.pixel_type = self.pixel_type;
		}
		config.target_aligned_pixels |= self.tap;
		config.separate_bands |= self.separate;
		config.copy_color_table |= self.pct;
		config.create_only |= self.createonly;

		config.output_path().context("Use -o to set the output file")?;
		Ok(config)
	}
}

pub fn run<S: RasterStore + ?Sized>(arguments: &Subcommand, store: &mut S, quiet: bool) -> Result<()> {
	if arguments.input_files.is_empty() {
		return Err(configuration_error("no input files provided").into());
	}
	let mut config = arguments.to_config()?;
	config.quiet |= quiet;

	let plan = merge_files(store, &config, &arguments.input_files)?;
	store.close(plan.handle)?;

	log::info!(
		"{} {:?}: {}x{} pixels, {} bands",
		if plan.created { "created" } else { "updated" },
		config.output_path()?,
		plan.width,
		plan.height,
		plan.band_count
	);
	Ok(())
}
