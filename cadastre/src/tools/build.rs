use super::SourceArgs;
use anyhow::Result;
use cadastre::config::select_regions;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true)]
pub struct Subcommand {
	/// Département codes to include, e.g. 01 2A 971. All départements if omitted.
	#[arg(value_name = "REGIONS")]
	pub regions: Vec<String>,

	#[command(flatten)]
	pub source: SourceArgs,

	/// Directory receiving the tile sets. Default: dist
	#[arg(short, long, value_name = "DIR", display_order = 1)]
	pub output_dir: Option<PathBuf>,

	/// Exit successfully even if some regions could not be read
	#[arg(long, display_order = 3)]
	pub allow_incomplete: bool,

	/// Program building the tiles of one layer. Default: tippecanoe
	#[arg(long, value_name = "PROGRAM", display_order = 4)]
	pub tile_builder: Option<String>,

	/// Program merging the layers. Default: tile-join
	#[arg(long, value_name = "PROGRAM", display_order = 4)]
	pub tile_merger: Option<String>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = arguments.source.load_config()?;
	if let Some(output_dir) = &arguments.output_dir {
		config.output_dir.clone_from(output_dir);
	}
	if let Some(tile_builder) = &arguments.tile_builder {
		config.tile_builder.clone_from(tile_builder);
	}
	if let Some(tile_merger) = &arguments.tile_merger {
		config.tile_merger.clone_from(tile_merger);
	}
	if arguments.allow_incomplete {
		config.allow_incomplete = true;
	}

	let regions = select_regions(&arguments.regions)?;
	log::info!(
		"building {} regions from {} into {}",
		regions.len(),
		config.base_url,
		config.output_dir.display()
	);

	let summary = config.build_run(regions)?.run()?;
	summary.ensure_complete(config.allow_incomplete)
}
