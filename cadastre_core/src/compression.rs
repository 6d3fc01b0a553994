//! Streaming gzip decompression.

use flate2::bufread::MultiGzDecoder;
use std::io::{BufReader, Read};

/// Wraps a compressed byte stream with a gzip decoder.
///
/// Concatenated gzip members are decoded as one stream. Corrupt or truncated input surfaces as an
/// `io::Error` from `read`, never as a silent end of data.
pub fn decompress_gzip_stream<'a>(reader: impl Read + 'a) -> Box<dyn Read + 'a> {
	Box::new(MultiGzDecoder::new(BufReader::new(reader)))
}

#[cfg(test)]
pub(crate) fn compress_gzip(data: &[u8]) -> Vec<u8> {
	use flate2::{Compression, write::GzEncoder};
	use std::io::Write;

	let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
	encoder.write_all(data).unwrap();
	encoder.finish().unwrap()
}
