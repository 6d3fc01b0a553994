//! What happened to each region of a layer.

use cadastre_core::{Layer, RegionCode, SourceErrorKind};
use std::fmt;

/// An isolated failure: the region was skipped (or cut short) and the stream moved on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionFailure {
	pub layer: Layer,
	pub region: RegionCode,
	pub kind: SourceErrorKind,
	pub message: String,
}

impl fmt::Display for RegionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"layer {}, region {}: {}: {}",
			self.layer, self.region, self.kind, self.message
		)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSummary {
	pub region: RegionCode,
	/// Features contributed to the stream, including those read before a failure.
	pub features: u64,
	pub failure: Option<RegionFailure>,
}

/// Per-region outcome of streaming one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestReport {
	pub layer: Layer,
	pub regions: Vec<RegionSummary>,
}

impl IngestReport {
	#[must_use]
	pub fn new(layer: Layer) -> Self {
		IngestReport {
			layer,
			regions: Vec::new(),
		}
	}

	pub(crate) fn record(&mut self, region: RegionCode, features: u64, failure: Option<RegionFailure>) {
		self.regions.push(RegionSummary {
			region,
			features,
			failure,
		});
	}

	#[must_use]
	pub fn total_features(&self) -> u64 {
		self.regions.iter().map(|r| r.features).sum()
	}

	pub fn failures(&self) -> impl Iterator<Item = &RegionFailure> {
		self.regions.iter().filter_map(|r| r.failure.as_ref())
	}

	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.failures().next().is_none()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn region(code: &str) -> RegionCode {
		RegionCode::parse(code).unwrap()
	}

	#[test]
	fn totals_and_failures() {
		let mut report = IngestReport::new(Layer::Sections);
		assert!(report.is_complete());

		report.record(region("01"), 0, None);
		report.record(
			region("02"),
			7,
			Some(RegionFailure {
				layer: Layer::Sections,
				region: region("02"),
				kind: SourceErrorKind::Parse,
				message: "expected ':' at position 12".to_string(),
			}),
		);
		report.record(region("03"), 5, None);

		assert_eq!(report.total_features(), 12);
		assert!(!report.is_complete());
		let failures: Vec<String> = report.failures().map(ToString::to_string).collect();
		assert_eq!(
			failures,
			vec!["layer sections, region 02: ParseError: expected ':' at position 12"]
		);
	}
}
