//! The three cadastre layers and their tile-building parameters.

use crate::SourceError;
use std::{fmt, str::FromStr};

/// How the tile builder thins out features in overfull tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityStrategy {
	CoalesceDensest,
	DropDensest,
}

impl DensityStrategy {
	/// The tile builder flag selecting this strategy.
	#[must_use]
	pub fn as_flag(self) -> &'static str {
		match self {
			DensityStrategy::CoalesceDensest => "--coalesce-densest-as-needed",
			DensityStrategy::DropDensest => "--drop-densest-as-needed",
		}
	}
}

/// A logical dataset layer.
///
/// The names are part of the upstream URL scheme and must not be translated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
	Parcelles,
	Batiments,
	Sections,
}

impl Layer {
	/// All layers, in build order.
	pub const ALL: [Layer; 3] = [Layer::Parcelles, Layer::Batiments, Layer::Sections];

	/// Layer order of the merged artifact.
	pub const MERGE_ORDER: [Layer; 3] = [Layer::Parcelles, Layer::Sections, Layer::Batiments];

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Layer::Parcelles => "parcelles",
			Layer::Batiments => "batiments",
			Layer::Sections => "sections",
		}
	}

	#[must_use]
	pub fn zoom_range(self) -> (u8, u8) {
		match self {
			Layer::Parcelles => (13, 16),
			Layer::Batiments => (14, 16),
			Layer::Sections => (11, 16),
		}
	}

	#[must_use]
	pub fn density_strategy(self) -> DensityStrategy {
		match self {
			Layer::Batiments => DensityStrategy::DropDensest,
			Layer::Parcelles | Layer::Sections => DensityStrategy::CoalesceDensest,
		}
	}

	/// File name of the tile set built for this layer.
	#[must_use]
	pub fn output_file_name(self) -> String {
		format!("{}.mbtiles", self.name())
	}
}

impl FromStr for Layer {
	type Err = SourceError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Layer::ALL
			.into_iter()
			.find(|layer| layer.name() == name)
			.ok_or_else(|| {
				SourceError::Configuration(format!(
					"unknown layer '{name}', expected one of: parcelles, batiments, sections"
				))
			})
	}
}

impl fmt::Display for Layer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
