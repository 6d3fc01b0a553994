//! Classified failures of a single region source.
//!
//! Most of the crate propagates `anyhow::Error`. When the kind of a failure decides what happens
//! next (skip the region, or abort the layer), it is raised as a [`SourceError`] and recovered
//! further up with [`SourceError::classify`].

use std::{fmt, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
	/// Unknown layer, bad base location, invalid region code.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// A local archive that does not exist.
	#[error("archive not found: {0}")]
	NotFound(String),

	/// Network failure, timeout or non-success status, including failures while the body is read.
	#[error("fetch error: {0}")]
	Fetch(String),

	/// The compressed stream is corrupt or truncated.
	#[error("decode error: {0}")]
	Decode(String),

	/// The decompressed text is not a GeoJSON feature collection.
	#[error("parse error: {0}")]
	Parse(String),
}

/// The kind of a [`SourceError`], without its message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceErrorKind {
	Configuration,
	NotFound,
	Fetch,
	Decode,
	Parse,
}

impl SourceError {
	#[must_use]
	pub fn kind(&self) -> SourceErrorKind {
		match self {
			SourceError::Configuration(_) => SourceErrorKind::Configuration,
			SourceError::NotFound(_) => SourceErrorKind::NotFound,
			SourceError::Fetch(_) => SourceErrorKind::Fetch,
			SourceError::Decode(_) => SourceErrorKind::Decode,
			SourceError::Parse(_) => SourceErrorKind::Parse,
		}
	}

	/// Fatal errors stop the whole stream instead of skipping one region.
	#[must_use]
	pub fn is_fatal(&self) -> bool {
		self.kind().is_fatal()
	}

	/// Finds a `SourceError` anywhere in an error chain, including inside wrapped I/O errors.
	#[must_use]
	pub fn find_in(error: &anyhow::Error) -> Option<&SourceError> {
		error.chain().find_map(|cause| {
			cause.downcast_ref::<SourceError>().or_else(|| {
				cause
					.downcast_ref::<io::Error>()
					.and_then(|io_error| io_error.get_ref())
					.and_then(|inner| inner.downcast_ref::<SourceError>())
			})
		})
	}

	/// Classifies an error, falling back to `fallback` when the chain carries no `SourceError`.
	#[must_use]
	pub fn classify(error: &anyhow::Error, fallback: SourceErrorKind) -> SourceErrorKind {
		SourceError::find_in(error).map_or(fallback, SourceError::kind)
	}

	/// Wraps this error so it can travel through an `io::Read` implementation.
	#[must_use]
	pub fn into_io(self) -> io::Error {
		io::Error::other(self)
	}
}

impl SourceErrorKind {
	#[must_use]
	pub fn is_fatal(self) -> bool {
		matches!(self, SourceErrorKind::Configuration | SourceErrorKind::NotFound)
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			SourceErrorKind::Configuration => "ConfigurationError",
			SourceErrorKind::NotFound => "NotFoundError",
			SourceErrorKind::Fetch => "FetchError",
			SourceErrorKind::Decode => "DecodeError",
			SourceErrorKind::Parse => "ParseError",
		}
	}
}

impl fmt::Display for SourceErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
