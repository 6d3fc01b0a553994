//! A byte-level cursor over a streaming reader.
//!
//! `ByteIterator` pulls fixed-size chunks from any `std::io::Read` and hands them out one byte at a
//! time with a single byte of lookahead. Only the current chunk is held in memory, which is what
//! allows the feature reader to walk multi-gigabyte documents.
//!
//! A failing read does not look like a clean end of input: the error is kept and reported by
//! [`ByteIterator::format_error`], and callers can take it out with [`ByteIterator::take_read_error`]
//! to classify the failure.

use anyhow::{Error, Result, anyhow};
use std::io::{self, Read};

const DEBUG_RING_BUFFER_SIZE: usize = 16;
const BUFFER_SIZE: usize = 64 * 1024;

pub struct ByteIterator<'a> {
	buffer: Box<[u8]>,
	buffer_len: usize,
	buffer_pos: usize,
	source: Box<dyn Read + 'a>,
	peeked_byte: Option<u8>,
	position: usize,
	read_error: Option<io::Error>,
	is_debug_enabled: bool,
	debug_buffer: [u8; DEBUG_RING_BUFFER_SIZE],
}

impl<'a> ByteIterator<'a> {
	/// Creates a new iterator and loads the first byte.
	///
	/// With `debug` enabled the last few bytes are kept in a ring buffer and included in error
	/// messages.
	pub fn from_reader(reader: impl Read + 'a, debug: bool) -> Self {
		let mut instance = ByteIterator {
			buffer: vec![0; BUFFER_SIZE].into_boxed_slice(),
			buffer_len: 0,
			buffer_pos: 0,
			source: Box::new(reader),
			peeked_byte: None,
			position: 0,
			read_error: None,
			is_debug_enabled: debug,
			debug_buffer: [0; DEBUG_RING_BUFFER_SIZE],
		};
		instance.advance();
		instance
	}

	fn fill_buffer(&mut self) {
		self.buffer_pos = 0;
		self.buffer_len = 0;
		if self.read_error.is_some() {
			return;
		}
		loop {
			match self.source.read(&mut self.buffer) {
				Ok(n) => {
					self.buffer_len = n;
					return;
				}
				Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
				Err(e) => {
					self.read_error = Some(e);
					return;
				}
			}
		}
	}

	#[inline]
	fn next_byte(&mut self) -> Option<u8> {
		if self.buffer_pos >= self.buffer_len {
			self.fill_buffer();
			if self.buffer_len == 0 {
				return None;
			}
		}
		let byte = self.buffer[self.buffer_pos];
		self.buffer_pos += 1;
		Some(byte)
	}

	/// Builds an error that carries the current byte position.
	///
	/// If the underlying reader failed, the read error is reported instead of `msg`, since the
	/// structural complaint is only a symptom of the truncated input.
	#[must_use]
	pub fn format_error(&self, msg: &str) -> Error {
		let position = self.position.saturating_sub(1);
		if let Some(err) = &self.read_error {
			return anyhow!("read error at position {position}: {err}");
		}
		if self.is_debug_enabled {
			let (start_index, length) = if self.position < DEBUG_RING_BUFFER_SIZE {
				(0, position)
			} else {
				(self.position % DEBUG_RING_BUFFER_SIZE, DEBUG_RING_BUFFER_SIZE - 1)
			};

			let snapshot: Vec<u8> = self
				.debug_buffer
				.iter()
				.cycle()
				.skip(start_index)
				.take(length)
				.copied()
				.collect();

			let mut debug_output = String::from_utf8_lossy(&snapshot).into_owned();
			if self.peeked_byte.is_none() {
				debug_output.push_str("<EOF>");
			}
			anyhow!("{msg} at position {position}: {debug_output}")
		} else {
			anyhow!("{msg} at position {position}")
		}
	}

	/// Returns `true` if the underlying reader reported an error.
	#[must_use]
	pub fn has_read_error(&self) -> bool {
		self.read_error.is_some()
	}

	/// Takes the read error of the underlying reader, if any.
	pub fn take_read_error(&mut self) -> Option<io::Error> {
		self.read_error.take()
	}

	#[inline]
	#[must_use]
	pub fn position(&self) -> usize {
		self.position
	}

	#[inline]
	#[must_use]
	pub fn peek(&self) -> Option<u8> {
		self.peeked_byte
	}

	/// Consumes the peeked byte and loads the next one.
	#[inline]
	pub fn advance(&mut self) {
		self.peeked_byte = self.next_byte();
		if self.is_debug_enabled
			&& let Some(byte) = self.peeked_byte
		{
			let index = self.position % DEBUG_RING_BUFFER_SIZE;
			self.debug_buffer[index] = byte;
		}
		self.position += 1;
	}

	#[inline]
	pub fn consume(&mut self) -> Option<u8> {
		let current_byte = self.peeked_byte;
		self.advance();
		current_byte
	}

	/// Returns the peeked byte and advances, or fails at the end of input.
	#[inline]
	pub fn expect_next_byte(&mut self) -> Result<u8> {
		if let Some(current_byte) = self.peeked_byte {
			self.advance();
			Ok(current_byte)
		} else {
			Err(self.format_error("unexpected end"))
		}
	}

	#[inline]
	pub fn expect_peeked_byte(&self) -> Result<u8> {
		self.peeked_byte.ok_or_else(|| self.format_error("unexpected end"))
	}

	pub fn skip_whitespace(&mut self) {
		while let Some(byte) = self.peek() {
			if !byte.is_ascii_whitespace() {
				break;
			}
			self.advance();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	struct FailingReader {
		served: bool,
	}

	impl Read for FailingReader {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			if self.served {
				Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream"))
			} else {
				self.served = true;
				buf[..2].copy_from_slice(b"ab");
				Ok(2)
			}
		}
	}

	#[test]
	fn peek_and_consume() {
		let mut b = ByteIterator::from_reader(Cursor::new(b"123"), false);

		assert_eq!(b.peek(), Some(b'1'));
		assert_eq!(b.consume(), Some(b'1'));
		assert_eq!(b.peek(), Some(b'2'));
		assert_eq!(b.consume(), Some(b'2'));
		assert_eq!(b.consume(), Some(b'3'));
		assert_eq!(b.peek(), None);
		assert!(!b.has_read_error());
	}

	#[test]
	fn expect_next_byte_at_end() {
		let mut b = ByteIterator::from_reader(Cursor::new(b"AB"), false);

		assert_eq!(b.expect_next_byte().unwrap(), b'A');
		assert_eq!(b.expect_next_byte().unwrap(), b'B');
		assert!(b.expect_next_byte().is_err());
	}

	#[test]
	fn skip_whitespace() {
		let mut b = ByteIterator::from_reader(Cursor::new(b" \t\nAB"), false);

		b.skip_whitespace();
		assert_eq!(b.consume(), Some(b'A'));
		assert_eq!(b.consume(), Some(b'B'));
	}

	#[test]
	fn reads_across_chunk_boundaries() {
		let data = vec![b'x'; BUFFER_SIZE * 2 + 7];
		let mut b = ByteIterator::from_reader(Cursor::new(data), false);
		let mut count = 0;
		while b.consume().is_some() {
			count += 1;
		}
		assert_eq!(count, BUFFER_SIZE * 2 + 7);
	}

	#[test]
	fn read_errors_are_kept() {
		let mut b = ByteIterator::from_reader(FailingReader { served: false }, true);

		assert_eq!(b.consume(), Some(b'a'));
		assert_eq!(b.consume(), Some(b'b'));
		assert_eq!(b.peek(), None);
		assert!(b.has_read_error());

		let err = b.expect_next_byte().unwrap_err().to_string();
		assert!(err.contains("corrupt deflate stream"), "{err}");

		let io_err = b.take_read_error().unwrap();
		assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
		assert!(!b.has_read_error());
	}

	#[test]
	fn debug_error_formatting() {
		let mut b = ByteIterator::from_reader(Cursor::new(b"Rust"), true);

		b.consume();
		b.consume();
		b.consume();
		let error = b.format_error("Testing error");

		assert_eq!(error.to_string(), "Testing error at position 3: Rus");
	}
}
