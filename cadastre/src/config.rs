//! Layered run settings: built-in defaults, an optional YAML file, then command line flags.

use anyhow::{Context, Result};
use cadastre_core::{
	RegionCode, SourceResolver,
	cache::HttpCache,
	config::{CacheConfig, HttpConfig},
	io::{ArchiveFetcher, ReqwestTransport},
};
use cadastre_pipeline::{BuildRun, FeatureSource, TileBuilder, TileMerger};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Base location of the archives, an http(s) URL or a local directory.
	pub base_url: String,

	/// Directory receiving the tile sets, created if missing.
	pub output_dir: PathBuf,

	pub cache: CacheConfig,

	pub http: HttpConfig,

	/// Program building the tile set of one layer.
	pub tile_builder: String,

	/// Program merging the layer tile sets.
	pub tile_merger: String,

	pub attribution: String,

	/// Dataset name of the merged tile set.
	pub name: String,

	/// Succeed even if some regions could not be read.
	pub allow_incomplete: bool,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			base_url: cadastre_core::DEFAULT_BASE_URL.to_string(),
			output_dir: PathBuf::from("dist"),
			cache: CacheConfig::default(),
			http: HttpConfig::default(),
			tile_builder: String::from("tippecanoe"),
			tile_merger: String::from("tile-join"),
			attribution: String::from("Etalab"),
			name: String::from("cadastre"),
			allow_incomplete: false,
		}
	}
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config file {}", path.display()))?;
		Config::from_reader(BufReader::new(file)).with_context(|| format!("parsing config file {}", path.display()))
	}

	/// The configured settings, or the defaults when no file is given.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => Config::from_path(path),
			None => Ok(Config::default()),
		}
	}

	/// Wires resolver, transport and cache into a feature source.
	///
	/// The cache directory is opened here, once per run, and only for remote sources.
	pub fn feature_source(&self) -> Result<FeatureSource> {
		let resolver = SourceResolver::new(&self.base_url)?;
		let cache = if self.cache.enabled && resolver.is_remote() {
			Some(HttpCache::open(&self.cache.directory)?)
		} else {
			None
		};
		let transport = ReqwestTransport::new(&self.http)?;
		Ok(FeatureSource::new(resolver, ArchiveFetcher::new(Box::new(transport), cache)))
	}

	pub fn build_run(&self, regions: Vec<RegionCode>) -> Result<BuildRun> {
		Ok(BuildRun {
			source: self.feature_source()?,
			regions,
			output_dir: self.output_dir.clone(),
			builder: TileBuilder::new(&self.tile_builder, &self.output_dir),
			merger: TileMerger::new(&self.tile_merger, &self.output_dir, &self.attribution, &self.name),
		})
	}
}

/// Parses the requested region codes. No codes select every region of the catalog.
pub fn select_regions(codes: &[String]) -> Result<Vec<RegionCode>> {
	if codes.is_empty() {
		return Ok(RegionCode::catalog());
	}
	Ok(RegionCode::parse_all(codes)?)
}
