//! Binary header of a cache file. The raw response body follows the header.

use anyhow::{Result, anyhow, ensure};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const MAGIC: &[u8; 4] = b"CDTC";
const VERSION: u8 = 1;

/// Validators and timestamps of a stored response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheEntryHeader {
	/// Seconds since the Unix epoch at which the response was stored.
	pub stored_at: u64,
	/// Seconds since the Unix epoch until which the response may be served without revalidation.
	pub expires_at: u64,
	pub etag: Option<String>,
	pub last_modified: Option<String>,
}

impl CacheEntryHeader {
	#[must_use]
	pub fn is_fresh(&self, now: u64) -> bool {
		now < self.expires_at
	}

	#[must_use]
	pub fn has_validators(&self) -> bool {
		self.etag.is_some() || self.last_modified.is_some()
	}

	pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
		writer.write_all(MAGIC)?;
		writer.write_u8(VERSION)?;
		writer.write_u64::<LE>(self.stored_at)?;
		writer.write_u64::<LE>(self.expires_at)?;
		write_optional_string(writer, self.etag.as_deref())?;
		write_optional_string(writer, self.last_modified.as_deref())?;
		Ok(())
	}

	/// Reads a header and leaves `reader` at the first byte of the body.
	pub fn read_from(reader: &mut impl Read) -> Result<Self> {
		let mut magic = [0u8; 4];
		reader.read_exact(&mut magic)?;
		ensure!(&magic == MAGIC, "not a cache entry");
		let version = reader.read_u8()?;
		ensure!(version == VERSION, "unsupported cache entry version {version}");

		Ok(CacheEntryHeader {
			stored_at: reader.read_u64::<LE>()?,
			expires_at: reader.read_u64::<LE>()?,
			etag: read_optional_string(reader)?,
			last_modified: read_optional_string(reader)?,
		})
	}
}

// an empty string encodes "absent"
fn write_optional_string(writer: &mut impl Write, value: Option<&str>) -> Result<()> {
	let bytes = value.unwrap_or_default().as_bytes();
	writer.write_u32::<LE>(u32::try_from(bytes.len())?)?;
	writer.write_all(bytes)?;
	Ok(())
}

fn read_optional_string(reader: &mut impl Read) -> Result<Option<String>> {
	let length = reader.read_u32::<LE>()? as usize;
	ensure!(length <= 64 * 1024, "cache entry header field too long ({length} bytes)");
	let mut bytes = vec![0u8; length];
	reader.read_exact(&mut bytes)?;
	let value = String::from_utf8(bytes).map_err(|e| anyhow!(e))?;
	Ok(if value.is_empty() { None } else { Some(value) })
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::io::Cursor;

	#[test]
	fn header_layout() {
		let header = CacheEntryHeader {
			stored_at: 1,
			expires_at: 2,
			etag: Some("\"e\"".to_string()),
			last_modified: None,
		};
		let mut buffer = Vec::new();
		header.write_to(&mut buffer).unwrap();
		buffer.extend_from_slice(b"BODY");

		assert_eq!(&buffer[0..5], b"CDTC\x01");
		assert_eq!(&buffer[5..13], &1u64.to_le_bytes());
		assert_eq!(&buffer[13..21], &2u64.to_le_bytes());
		assert_eq!(&buffer[21..25], &3u32.to_le_bytes());

		let mut reader = Cursor::new(buffer);
		assert_eq!(CacheEntryHeader::read_from(&mut reader).unwrap(), header);
		let mut body = String::new();
		reader.read_to_string(&mut body).unwrap();
		assert_eq!(body, "BODY");
	}

	#[test]
	fn rejects_foreign_files() {
		let mut reader = Cursor::new(b"\x1f\x8b\x08\x00garbage".to_vec());
		assert_eq!(
			CacheEntryHeader::read_from(&mut reader).unwrap_err().to_string(),
			"not a cache entry"
		);
	}

	#[test]
	fn freshness() {
		let header = CacheEntryHeader {
			expires_at: 100,
			..Default::default()
		};
		assert!(header.is_fresh(99));
		assert!(!header.is_fresh(100));
		assert!(!header.has_validators());
	}
}
