mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	name = "cadastre-tiles",
	author,
	version,
	about = "Streams the cadastre archives of all départements into vector tiles.",
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Build the tiles of all layers and merge them into one tile set
	Build(tools::build::Subcommand),

	/// Write the features of one layer as newline-delimited GeoJSON to standard output
	Stream(tools::stream::Subcommand),
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
	match &cli.command {
		Commands::Build(arguments) => tools::build::run(arguments),
		Commands::Stream(arguments) => tools::stream::run(arguments),
	}
}
