//! The full build: every layer through the tile builder, then the merge.

use crate::{FeatureSource, IngestReport, RegionFailure, TileBuilder, TileMerger};
use anyhow::{Context, Result, bail};
use cadastre_core::{Layer, RegionCode};
use std::{fs::create_dir_all, path::PathBuf};

pub struct BuildRun {
	pub source: FeatureSource,
	pub regions: Vec<RegionCode>,
	pub output_dir: PathBuf,
	pub builder: TileBuilder,
	pub merger: TileMerger,
}

impl BuildRun {
	/// Builds the layers one after the other and merges them once all builds succeeded.
	///
	/// Region failures do not stop the run; they are collected in the returned summary. Any failure
	/// of the external programs, or a fatal source error, aborts before the merge.
	pub fn run(&self) -> Result<BuildSummary> {
		create_dir_all(&self.output_dir)
			.with_context(|| format!("creating output directory {}", self.output_dir.display()))?;

		let mut reports = Vec::with_capacity(Layer::ALL.len());
		for layer in Layer::ALL {
			let mut stream = self.source.stream(layer, &self.regions);
			self.builder
				.build(&mut stream)
				.with_context(|| format!("building layer {layer}"))?;
			reports.push(stream.into_report());
		}

		self.merger.merge().context("merging layers")?;

		let summary = BuildSummary { reports };
		log::info!(
			"{} features from {} regions, {} region failures, merged into {}",
			summary.total_features(),
			self.regions.len(),
			summary.failures().count(),
			self.merger.output_path().display()
		);
		Ok(summary)
	}
}

#[derive(Clone, Debug)]
pub struct BuildSummary {
	pub reports: Vec<IngestReport>,
}

impl BuildSummary {
	#[must_use]
	pub fn total_features(&self) -> u64 {
		self.reports.iter().map(IngestReport::total_features).sum()
	}

	pub fn failures(&self) -> impl Iterator<Item = &RegionFailure> {
		self.reports.iter().flat_map(IngestReport::failures)
	}

	/// Fails if any region was skipped, unless incomplete output is allowed.
	pub fn ensure_complete(&self, allow_incomplete: bool) -> Result<()> {
		let failures: Vec<&RegionFailure> = self.failures().collect();
		if failures.is_empty() {
			return Ok(());
		}
		if allow_incomplete {
			log::warn!("{} region failures ignored, the output is incomplete", failures.len());
			return Ok(());
		}
		let list = failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  ");
		bail!("the output is incomplete, {} region failures:\n  {list}", failures.len())
	}
}
