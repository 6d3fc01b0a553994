use super::SourceArgs;
use anyhow::Result;
use cadastre::config::select_regions;
use cadastre_core::Layer;
use cadastre_pipeline::{BuildSummary, is_broken_pipe};
use std::io::{self, BufWriter};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// Layer to stream: parcelles, batiments or sections
	#[arg()]
	pub layer: Layer,

	/// Département codes to include, e.g. 01 2A 971. All départements if omitted.
	#[arg(value_name = "REGIONS")]
	pub regions: Vec<String>,

	#[command(flatten)]
	pub source: SourceArgs,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = arguments.source.load_config()?;
	let regions = select_regions(&arguments.regions)?;
	let source = config.feature_source()?;

	let mut stream = source.stream(arguments.layer, &regions);
	let mut output = BufWriter::new(io::stdout().lock());
	match stream.write_to(&mut output) {
		Ok(count) => log::info!("{count} features of layer {} written", arguments.layer),
		Err(error) if is_broken_pipe(&error) => log::debug!("standard output was closed"),
		Err(error) => return Err(error),
	}
	drop(output);

	let summary = BuildSummary {
		reports: vec![stream.into_report()],
	};
	summary.ensure_complete(config.allow_incomplete)
}
