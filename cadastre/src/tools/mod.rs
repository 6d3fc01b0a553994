pub mod build;
pub mod stream;

use anyhow::Result;
use cadastre::Config;
use std::path::PathBuf;

/// Options shared by all subcommands that read archives.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
	/// YAML file with run settings. Command line arguments override its values.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Base location of the archives: an http(s) URL or a local directory
	#[arg(long, value_name = "URL", display_order = 1)]
	pub base_url: Option<String>,

	/// Directory of the persistent HTTP cache
	#[arg(long, value_name = "DIR", display_order = 2)]
	pub cache_dir: Option<PathBuf>,

	/// Always download, neither read nor write the HTTP cache
	#[arg(long, display_order = 2)]
	pub no_cache: bool,
}

impl SourceArgs {
	/// Loads the config file, if any, and applies the overrides of the command line.
	pub fn load_config(&self) -> Result<Config> {
		let mut config = Config::load(self.config.as_deref())?;
		if let Some(base_url) = &self.base_url {
			config.base_url.clone_from(base_url);
		}
		if let Some(cache_dir) = &self.cache_dir {
			config.cache.directory.clone_from(cache_dir);
		}
		if self.no_cache {
			config.cache.enabled = false;
		}
		Ok(config)
	}
}
