//! Sequential concatenation of per-region feature readers.
//!
//! A [`FeatureStream`] owns the queue of regions still to read for one layer. Whenever the current
//! region is exhausted (or fails) it opens the next one, so at most one archive is being fetched,
//! decompressed and parsed at any time. Records come out in queue order and, within a region, in
//! document order.
//!
//! Fetch, decode and parse failures are isolated: they are logged, recorded in the
//! [`IngestReport`] and the stream moves on to the next region. Missing local files and
//! configuration errors are fatal and end the stream with an error.

use crate::{IngestReport, RegionFailure};
use anyhow::{Error, Result};
use cadastre_core::{
	Layer, RegionCode, SourceError, SourceErrorKind, SourceResolver, compression::decompress_gzip_stream,
	io::ArchiveFetcher,
};
use cadastre_geometry::{FeatureReader, FeatureRecord};
use std::{collections::VecDeque, io::Write, mem};

/// Resolves, fetches and opens the feature reader of one region.
pub struct FeatureSource {
	resolver: SourceResolver,
	fetcher: ArchiveFetcher,
}

impl FeatureSource {
	pub fn new(resolver: SourceResolver, fetcher: ArchiveFetcher) -> Self {
		FeatureSource { resolver, fetcher }
	}

	pub fn open(&self, layer: Layer, region: &RegionCode) -> Result<FeatureReader<'static>> {
		let location = self.resolver.resolve(layer, region);
		log::debug!("opening {location}");
		let compressed = self.fetcher.open(&location)?;
		Ok(FeatureReader::new(decompress_gzip_stream(compressed)))
	}

	/// Creates the concatenated stream of `layer` over `regions`. Nothing is opened until the
	/// first record is requested.
	pub fn stream(&self, layer: Layer, regions: &[RegionCode]) -> FeatureStream<'_> {
		FeatureStream {
			source: self,
			layer,
			queue: regions.iter().cloned().collect(),
			state: StreamState::Idle,
			report: IngestReport::new(layer),
		}
	}
}

enum StreamState {
	Idle,
	Active {
		region: RegionCode,
		reader: FeatureReader<'static>,
	},
	Exhausted,
}

pub struct FeatureStream<'a> {
	source: &'a FeatureSource,
	layer: Layer,
	queue: VecDeque<RegionCode>,
	state: StreamState,
	report: IngestReport,
}

impl FeatureStream<'_> {
	#[must_use]
	pub fn layer(&self) -> Layer {
		self.layer
	}

	#[must_use]
	pub fn report(&self) -> &IngestReport {
		&self.report
	}

	#[must_use]
	pub fn into_report(self) -> IngestReport {
		self.report
	}

	/// Writes every remaining record as one line of newline-delimited JSON and returns the number
	/// of lines written.
	pub fn write_to(&mut self, writer: &mut impl Write) -> Result<u64> {
		let mut count = 0;
		for record in self.by_ref() {
			writer.write_all(record?.to_line().as_bytes())?;
			count += 1;
		}
		writer.flush()?;
		Ok(count)
	}

	/// Records a failed region. Returns the error if it must end the whole stream.
	fn isolate(&mut self, region: RegionCode, features: u64, error: Error) -> Option<Error> {
		let kind = SourceError::classify(&error, SourceErrorKind::Fetch);
		if kind.is_fatal() {
			self.queue.clear();
			self.state = StreamState::Exhausted;
			return Some(error.context(format!("layer {}, region {region}", self.layer)));
		}

		let failure = RegionFailure {
			layer: self.layer,
			region: region.clone(),
			kind,
			message: format!("{error:#}"),
		};
		log::warn!("skipping the rest of {failure} ({features} features read)");
		self.report.record(region, features, Some(failure));
		None
	}
}

impl Iterator for FeatureStream<'_> {
	type Item = Result<FeatureRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match mem::replace(&mut self.state, StreamState::Idle) {
				StreamState::Exhausted => {
					self.state = StreamState::Exhausted;
					return None;
				}
				StreamState::Idle => {
					let Some(region) = self.queue.pop_front() else {
						log::debug!(
							"layer {} finished: {} features from {} regions",
							self.layer,
							self.report.total_features(),
							self.report.regions.len()
						);
						self.state = StreamState::Exhausted;
						return None;
					};
					match self.source.open(self.layer, &region) {
						Ok(reader) => self.state = StreamState::Active { region, reader },
						Err(error) => {
							if let Some(fatal) = self.isolate(region, 0, error) {
								return Some(Err(fatal));
							}
						}
					}
				}
				StreamState::Active { region, mut reader } => match reader.next() {
					Some(Ok(record)) => {
						self.state = StreamState::Active { region, reader };
						return Some(Ok(record));
					}
					Some(Err(error)) => {
						if let Some(fatal) = self.isolate(region, reader.features_read(), error) {
							return Some(Err(fatal));
						}
					}
					None => {
						log::info!("layer {}, region {region}: {} features", self.layer, reader.features_read());
						self.report.record(region, reader.features_read(), None);
					}
				},
			}
		}
	}
}
