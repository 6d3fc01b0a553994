//! Resolution of (layer, region) pairs into concrete source locations.

use super::{Layer, RegionCode};
use crate::SourceError;
use std::{fmt, path::PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://cadastre.data.gouv.fr/data/etalab-cadastre/latest/geojson/departements";

/// Where the archive of one region and layer lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
	Remote(String),
	Local(PathBuf),
}

impl fmt::Display for SourceLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SourceLocation::Remote(url) => f.write_str(url),
			SourceLocation::Local(path) => write!(f, "{}", path.display()),
		}
	}
}

/// Builds source locations from a base URL or base directory.
#[derive(Clone, Debug)]
pub struct SourceResolver {
	base: String,
	is_remote: bool,
}

impl SourceResolver {
	pub fn new(base: &str) -> Result<Self, SourceError> {
		let base = base.trim().trim_end_matches('/');
		if base.is_empty() {
			return Err(SourceError::Configuration("empty base location".to_string()));
		}
		Ok(SourceResolver {
			base: base.to_string(),
			is_remote: base.starts_with("http"),
		})
	}

	#[must_use]
	pub fn is_remote(&self) -> bool {
		self.is_remote
	}

	#[must_use]
	pub fn resolve(&self, layer: Layer, region: &RegionCode) -> SourceLocation {
		let location = format!("{}/{region}/cadastre-{region}-{layer}.json.gz", self.base);
		if self.is_remote {
			SourceLocation::Remote(location)
		} else {
			SourceLocation::Local(PathBuf::from(location))
		}
	}
}

impl Default for SourceResolver {
	fn default() -> Self {
		SourceResolver {
			base: DEFAULT_BASE_URL.to_string(),
			is_remote: true,
		}
	}
}
