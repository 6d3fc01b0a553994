//! Small parsing helpers built on top of [`ByteIterator`](super::iterator::ByteIterator).
//!
//! These functions implement the subset of JSON scanning needed to walk GeoJSON documents:
//! - `parse_tag` for matching fixed ASCII tags (`true`, `false`, `null`)
//! - `parse_quoted_json_string` for string literals, including `\uXXXX` escapes and surrogate pairs
//! - `parse_number_as_string` and `parse_number_as<T>` for JSON number syntax
//! - `parse_object_entries` and `parse_array_entries` to iterate over object/array contents
//!
//! Every function consumes only as much input as needed and leaves the iterator positioned at the
//! next token (e.g. right after a closing `]` or `}`).

use super::iterator::ByteIterator;
use anyhow::{Error, Result, bail};
use std::str::FromStr;

/// Matches a fixed ASCII tag at the current position.
pub fn parse_tag(iter: &mut ByteIterator, tag: &str) -> Result<()> {
	for c in tag.bytes() {
		if iter.expect_next_byte()? != c {
			return Err(iter.format_error(&format!("unexpected character while parsing tag '{tag}'")));
		}
	}
	Ok(())
}

fn parse_hex4(iter: &mut ByteIterator) -> Result<u16> {
	let mut hex = [0u8; 4];
	for i in &mut hex {
		*i = iter.expect_next_byte()?;
	}
	std::str::from_utf8(&hex)
		.ok()
		.and_then(|s| u16::from_str_radix(s, 16).ok())
		.ok_or_else(|| iter.format_error("invalid unicode escape"))
}

/// Parses a JSON string literal and leaves the iterator **after** the closing quote.
///
/// # Example
/// ```
/// # use std::io::Cursor;
/// # use cadastre_core::byte_iterator::{ByteIterator, parse_quoted_json_string};
/// let mut it = ByteIterator::from_reader(Cursor::new("\"Saint-\\u00c9tienne\""), true);
/// assert_eq!(parse_quoted_json_string(&mut it).unwrap(), "Saint-Étienne");
/// ```
pub fn parse_quoted_json_string(iter: &mut ByteIterator) -> Result<String> {
	iter.skip_whitespace();
	if iter.expect_next_byte()? != b'"' {
		bail!(iter.format_error("expected '\"' while parsing a string"));
	}

	let mut bytes = Vec::with_capacity(32);

	loop {
		match iter.expect_next_byte()? {
			b'"' => break,
			b'\\' => match iter.expect_next_byte()? {
				b'"' => bytes.push(b'"'),
				b'\\' => bytes.push(b'\\'),
				b'/' => bytes.push(b'/'),
				b'b' => bytes.push(b'\x08'),
				b'f' => bytes.push(b'\x0C'),
				b'n' => bytes.push(b'\n'),
				b'r' => bytes.push(b'\r'),
				b't' => bytes.push(b'\t'),
				b'u' => {
					let mut units = vec![parse_hex4(iter)?];
					if (0xD800..0xDC00).contains(&units[0]) {
						parse_tag(iter, "\\u")?;
						units.push(parse_hex4(iter)?);
					}
					let text = String::from_utf16(&units).map_err(|_| iter.format_error("invalid unicode code point"))?;
					bytes.extend_from_slice(text.as_bytes());
				}
				_ => return Err(iter.format_error("invalid escape sequence")),
			},
			c => bytes.push(c),
		}
	}
	String::from_utf8(bytes).map_err(Error::from)
}

/// Parses a JSON number and returns its textual representation.
///
/// Leaves the iterator at the first byte that is not part of the number.
pub fn parse_number_as_string(iter: &mut ByteIterator) -> Result<String> {
	let mut number = Vec::with_capacity(16);

	if let Some(b'+' | b'-') = iter.peek() {
		number.push(iter.expect_next_byte()?);
	}

	let mut has_digits = false;
	while let Some(b'0'..=b'9') = iter.peek() {
		has_digits = true;
		number.push(iter.expect_next_byte()?);
	}
	if !has_digits {
		return Err(iter.format_error("expected digits in number"));
	}

	if let Some(b'.') = iter.peek() {
		number.push(iter.expect_next_byte()?);
		let mut fractional_digits = false;
		while let Some(b'0'..=b'9') = iter.peek() {
			fractional_digits = true;
			number.push(iter.expect_next_byte()?);
		}
		if !fractional_digits {
			return Err(iter.format_error("expected digits after decimal point"));
		}
		if let Some(b'.') = iter.peek() {
			return Err(iter.format_error("unexpected '.' in number"));
		}
	}

	if let Some(b'e' | b'E') = iter.peek() {
		number.push(iter.expect_next_byte()?);
		if let Some(b'+' | b'-') = iter.peek() {
			number.push(iter.expect_next_byte()?);
		}
		let mut exponent_digits = false;
		while let Some(b'0'..=b'9') = iter.peek() {
			exponent_digits = true;
			number.push(iter.expect_next_byte()?);
		}
		if !exponent_digits {
			return Err(iter.format_error("expected digits after exponent"));
		}
	}

	String::from_utf8(number).map_err(Error::from)
}

pub fn parse_number_as<R: FromStr>(iter: &mut ByteIterator) -> Result<R> {
	parse_number_as_string(iter)?
		.parse::<R>()
		.map_err(|_| iter.format_error("invalid number"))
}

/// Iterates over the entries of a JSON object.
///
/// `parse_value` receives each key together with the iterator positioned at the start of the
/// value and must consume exactly that value.
pub fn parse_object_entries(
	iter: &mut ByteIterator,
	mut parse_value: impl FnMut(String, &mut ByteIterator) -> Result<()>,
) -> Result<()> {
	iter.skip_whitespace();
	if iter.expect_next_byte()? != b'{' {
		bail!(iter.format_error("expected '{' while parsing an object"));
	}

	iter.skip_whitespace();
	if iter.expect_peeked_byte()? == b'}' {
		iter.advance();
		return Ok(());
	}

	loop {
		iter.skip_whitespace();
		if iter.expect_peeked_byte()? != b'"' {
			return Err(iter.format_error("parsing object, expected '\"'"));
		}
		let key = parse_quoted_json_string(iter)?;

		iter.skip_whitespace();
		if iter.expect_next_byte()? != b':' {
			return Err(iter.format_error("expected ':'"));
		}

		iter.skip_whitespace();
		parse_value(key, iter)?;

		iter.skip_whitespace();
		match iter.expect_next_byte()? {
			b',' => {}
			b'}' => break,
			_ => return Err(iter.format_error("expected ',' or '}'")),
		}
	}
	Ok(())
}

/// Iterates over the entries of a JSON array and collects the parsed values.
pub fn parse_array_entries<R>(
	iter: &mut ByteIterator,
	mut parse_value: impl FnMut(&mut ByteIterator) -> Result<R>,
) -> Result<Vec<R>> {
	iter.skip_whitespace();
	if iter.expect_next_byte()? != b'[' {
		bail!(iter.format_error("expected '[' while parsing an array"));
	}

	let mut result = Vec::new();

	iter.skip_whitespace();
	if iter.expect_peeked_byte()? == b']' {
		iter.advance();
		return Ok(result);
	}

	result.push(parse_value(iter)?);

	loop {
		iter.skip_whitespace();
		match iter.expect_next_byte()? {
			b']' => break,
			b',' => {
				iter.skip_whitespace();
				result.push(parse_value(iter)?);
			}
			_ => return Err(iter.format_error("parsing array, expected ',' or ']'")),
		}
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Cursor;

	fn get_reader(s: &str) -> ByteIterator<'_> {
		ByteIterator::from_reader(Cursor::new(s), true)
	}

	#[test]
	fn tag() {
		fn parse(text: &str, tag: &str) -> bool {
			parse_tag(&mut get_reader(text), tag).is_ok()
		}
		assert!(parse("null", "null"));
		assert!(!parse("nuul", "null"));
		assert!(!parse("nu", "null"));
	}

	#[rstest]
	#[case(" \"hello\" ", "hello")]
	#[case("\"he\\nllo\"", "he\nllo")]
	#[case("\"he\\u0041llo\"", "heAllo")]
	#[case("\"Bâtiment \\\"A\\\"\"", "Bâtiment \"A\"")]
	#[case("\"\\b\\f\\r\\t\\/\"", "\x08\x0C\r\t/")]
	#[case("\"\\ud83d\\ude00\"", "😀")]
	fn quoted_string(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(parse_quoted_json_string(&mut get_reader(input)).unwrap(), expected);
	}

	#[rstest]
	#[case("\"he\\u004Gllo\"")]
	#[case("\"\\ud83d\"")]
	#[case("\"unterminated")]
	#[case("\"bad \\q escape\"")]
	#[case("hello")]
	fn quoted_string_errors(#[case] input: &str) {
		assert!(parse_quoted_json_string(&mut get_reader(input)).is_err());
	}

	#[rstest]
	#[case("123", "123")]
	#[case("-0.456", "-0.456")]
	#[case("-123.45E+6xyz", "-123.45E+6")]
	#[case("2.3522219,", "2.3522219")]
	fn number(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(parse_number_as_string(&mut get_reader(input)).unwrap(), expected);
	}

	#[rstest]
	#[case("123..45")]
	#[case("123e")]
	#[case("-")]
	#[case("123.")]
	fn number_errors(#[case] input: &str) {
		assert!(parse_number_as_string(&mut get_reader(input)).is_err());
	}

	#[test]
	fn number_as() {
		assert_eq!(parse_number_as::<f64>(&mut get_reader("-0.123E3")).unwrap(), -123.0);
		assert_eq!(parse_number_as::<u32>(&mut get_reader("42")).unwrap(), 42);
		assert!(parse_number_as::<u32>(&mut get_reader("-42")).is_err());
	}

	#[test]
	fn object_entries() {
		let mut iter = get_reader("{\"key1\":\"value1\", \"key2\" : \"value2\"}");
		let mut entries = Vec::new();
		parse_object_entries(&mut iter, |key, iter| {
			entries.push((key, parse_quoted_json_string(iter)?));
			Ok(())
		})
		.unwrap();

		assert_eq!(
			entries,
			vec![
				("key1".to_string(), "value1".to_string()),
				("key2".to_string(), "value2".to_string())
			]
		);
	}

	#[test]
	fn object_entries_empty_and_broken() {
		let mut calls = 0;
		parse_object_entries(&mut get_reader(" { } "), |_, _| {
			calls += 1;
			Ok(())
		})
		.unwrap();
		assert_eq!(calls, 0);

		let result = parse_object_entries(&mut get_reader("{\"a\" 1}"), |_, iter| {
			parse_number_as::<u8>(iter).map(|_| ())
		});
		assert_eq!(result.unwrap_err().to_string(), "expected ':' at position 6: {\"a\" 1");
	}

	#[test]
	fn array_entries() {
		let result = parse_array_entries(&mut get_reader("[1, 2 ,3]"), parse_number_as::<i32>).unwrap();
		assert_eq!(result, vec![1, 2, 3]);

		let empty = parse_array_entries(&mut get_reader("[ ]"), parse_number_as::<i32>).unwrap();
		assert!(empty.is_empty());

		assert!(parse_array_entries(&mut get_reader("[1 2]"), parse_number_as::<i32>).is_err());
	}
}
