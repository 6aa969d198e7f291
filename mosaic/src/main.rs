use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use mosaic::{gdal::GdalRasterStore, tools};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Mosaic rasters into one output raster
	Merge(tools::merge::Subcommand),

	/// Show information about a raster
	Probe(tools::probe::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	let mut store = GdalRasterStore::new();
	match &cli.command {
		Commands::Merge(arguments) => tools::merge::run(arguments, &mut store, cli.verbose.is_silent()),
		Commands::Probe(arguments) => tools::probe::run(arguments, &mut store),
	}
}
