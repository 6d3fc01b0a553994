//! Incremental reader for GeoJSON feature collections.
//!
//! The reader walks the top-level object byte by byte and hands out the members of the
//! `features` array one at a time, as soon as each element is complete. Nothing before or after
//! the current element is kept in memory, so arbitrarily large collections can be streamed.

use crate::FeatureRecord;
use anyhow::{Error, Result};
use cadastre_core::{
	SourceError,
	byte_iterator::{ByteIterator, parse_quoted_json_string},
	json::{JsonValue, parse_json_iter},
};
use std::io::{self, Read};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReaderState {
	/// Before the opening brace of the collection.
	Start,
	/// Inside the `features` array, positioned at the next element.
	InFeatures,
	/// The array is closed, the remaining members of the collection are still to be checked.
	AfterFeatures,
	/// End of input, or an error was reported.
	Done,
}

/// Yields the projected features of one GeoJSON feature collection in document order.
///
/// Errors are classified as [`SourceError`]: a failing source stream is a `Decode` error (or the
/// `Fetch` error it carries), malformed JSON is a `Parse` error. After the first error the reader
/// yields nothing more.
pub struct FeatureReader<'a> {
	iter: ByteIterator<'a>,
	state: ReaderState,
	has_features: bool,
	count: u64,
}

impl<'a> FeatureReader<'a> {
	pub fn new(reader: impl Read + 'a) -> Self {
		FeatureReader {
			iter: ByteIterator::from_reader(reader, true),
			state: ReaderState::Start,
			has_features: false,
			count: 0,
		}
	}

	/// Number of features yielded so far.
	#[must_use]
	pub fn features_read(&self) -> u64 {
		self.count
	}

	fn classify(&mut self, error: Error) -> Error {
		let source_error = match self.iter.take_read_error() {
			Some(io_error) => classify_read_error(io_error, self.iter.position()),
			None => SourceError::Parse(format!("{error:#}")),
		};
		Error::from(source_error)
	}

	fn open_collection(&mut self) -> Result<ReaderState> {
		self.iter.skip_whitespace();
		if self.iter.expect_next_byte()? != b'{' {
			return Err(self.iter.format_error("expected '{' at the start of a feature collection"));
		}
		self.iter.skip_whitespace();
		if self.iter.expect_peeked_byte()? == b'}' {
			self.iter.advance();
			return self.finish();
		}
		self.read_members(true)
	}

	/// Walks the members of the collection until the `features` array has an element to read, or
	/// the collection is closed.
	fn read_members(&mut self, mut at_member: bool) -> Result<ReaderState> {
		loop {
			if !at_member {
				self.iter.skip_whitespace();
				match self.iter.expect_next_byte()? {
					b',' => {}
					b'}' => return self.finish(),
					_ => return Err(self.iter.format_error("expected ',' or '}' in feature collection")),
				}
			}
			at_member = false;

			let key = self.read_key()?;
			if key == "features" {
				if self.open_features()? {
					return Ok(ReaderState::InFeatures);
				}
				continue;
			}

			let value = parse_json_iter(&mut self.iter)?;
			if key == "type" && value != JsonValue::from("FeatureCollection") {
				let message = format!("expected a FeatureCollection, found type {}", value.stringify());
				return Err(self.iter.format_error(&message));
			}
		}
	}

	fn read_key(&mut self) -> Result<String> {
		self.iter.skip_whitespace();
		if self.iter.expect_peeked_byte()? != b'"' {
			return Err(self.iter.format_error("expected '\"'"));
		}
		let key = parse_quoted_json_string(&mut self.iter)?;
		self.iter.skip_whitespace();
		if self.iter.expect_next_byte()? != b':' {
			return Err(self.iter.format_error("expected ':'"));
		}
		Ok(key)
	}

	/// Consumes the opening bracket and returns whether an element follows.
	fn open_features(&mut self) -> Result<bool> {
		if self.has_features {
			return Err(self.iter.format_error("duplicate 'features' member"));
		}
		self.has_features = true;

		self.iter.skip_whitespace();
		if self.iter.expect_next_byte()? != b'[' {
			return Err(self.iter.format_error("'features' must be an array"));
		}
		self.iter.skip_whitespace();
		if self.iter.expect_peeked_byte()? == b']' {
			self.iter.advance();
			return Ok(false);
		}
		Ok(true)
	}

	fn finish(&mut self) -> Result<ReaderState> {
		if !self.has_features {
			return Err(self.iter.format_error("feature collection has no 'features' array"));
		}
		self.iter.skip_whitespace();
		if self.iter.peek().is_some() || self.iter.has_read_error() {
			return Err(self.iter.format_error("unexpected data after the feature collection"));
		}
		log::trace!("feature collection finished after {} features", self.count);
		Ok(ReaderState::Done)
	}

	fn read_feature(&mut self) -> Result<FeatureRecord> {
		let value = parse_json_iter(&mut self.iter)?;
		let record = FeatureRecord::from_json(value).map_err(|e| self.iter.format_error(&e.to_string()))?;

		self.iter.skip_whitespace();
		match self.iter.expect_next_byte()? {
			b',' => {}
			b']' => self.state = ReaderState::AfterFeatures,
			_ => return Err(self.iter.format_error("expected ',' or ']' after a feature")),
		}
		Ok(record)
	}

	fn step(&mut self) -> Result<Option<FeatureRecord>> {
		loop {
			match self.state {
				ReaderState::Start => self.state = self.open_collection()?,
				ReaderState::InFeatures => {
					let record = self.read_feature()?;
					self.count += 1;
					return Ok(Some(record));
				}
				ReaderState::AfterFeatures => self.state = self.read_members(false)?,
				ReaderState::Done => return Ok(None),
			}
		}
	}
}

// A read error either carries the classified failure of the transport or comes from the decoder.
fn classify_read_error(error: io::Error, position: usize) -> SourceError {
	let message = format!("{error} after {position} decompressed bytes");
	match error.into_inner().map(|inner| inner.downcast::<SourceError>()) {
		Some(Ok(source_error)) => *source_error,
		_ => SourceError::Decode(message),
	}
}

impl Iterator for FeatureReader<'_> {
	type Item = Result<FeatureRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.step() {
			Ok(record) => record.map(Ok),
			Err(error) => {
				self.state = ReaderState::Done;
				Some(Err(self.classify(error)))
			}
		}
	}
}
