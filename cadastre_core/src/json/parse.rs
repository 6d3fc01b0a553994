use super::{JsonArray, JsonObject, JsonValue};
use crate::byte_iterator::{
	ByteIterator, parse_array_entries, parse_number_as, parse_object_entries, parse_quoted_json_string, parse_tag,
};
use anyhow::{Context, Result};
use std::{collections::BTreeMap, io::Cursor};

pub fn parse_json_str(json: &str) -> Result<JsonValue> {
	let mut iter = ByteIterator::from_reader(Cursor::new(json), true);
	let value = parse_json_iter(&mut iter).with_context(|| format!("while parsing JSON '{json}'"))?;
	iter.skip_whitespace();
	if iter.peek().is_some() {
		return Err(iter.format_error("unexpected trailing characters"))
			.with_context(|| format!("while parsing JSON '{json}'"));
	}
	Ok(value)
}

/// Deepest nesting of arrays and objects accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses exactly one JSON value starting at the current position.
pub fn parse_json_iter(iter: &mut ByteIterator) -> Result<JsonValue> {
	parse_value(iter, 0)
}

fn parse_value(iter: &mut ByteIterator, depth: usize) -> Result<JsonValue> {
	iter.skip_whitespace();
	match iter.expect_peeked_byte()? {
		b'[' | b'{' if depth >= MAX_NESTING_DEPTH => {
			Err(iter.format_error(&format!("nesting deeper than {MAX_NESTING_DEPTH} levels")))
		}
		b'[' => parse_array_entries(iter, |iter2| parse_value(iter2, depth + 1)).map(|i| JsonValue::Array(JsonArray(i))),
		b'{' => parse_json_object(iter, depth + 1),
		b'"' => parse_quoted_json_string(iter).map(JsonValue::String),
		d if d.is_ascii_digit() || d == b'-' => parse_number_as::<f64>(iter).map(JsonValue::Number),
		b't' => parse_tag(iter, "true").map(|()| JsonValue::Boolean(true)),
		b'f' => parse_tag(iter, "false").map(|()| JsonValue::Boolean(false)),
		b'n' => parse_tag(iter, "null").map(|()| JsonValue::Null),
		c => Err(iter.format_error(&format!("unexpected character '{}'", c as char))),
	}
}

fn parse_json_object(iter: &mut ByteIterator, depth: usize) -> Result<JsonValue> {
	let mut map = BTreeMap::new();
	parse_object_entries(iter, |key, iter2| {
		map.insert(key, parse_value(iter2, depth)?);
		Ok(())
	})?;
	Ok(JsonValue::Object(JsonObject(map)))
}
