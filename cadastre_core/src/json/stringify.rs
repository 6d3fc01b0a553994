use super::{JsonArray, JsonObject, JsonValue};

/// Serializes a value to compact JSON.
#[must_use]
pub fn stringify(json: &JsonValue) -> String {
	let mut output = String::new();
	write_value(&mut output, json);
	output
}

fn write_value(output: &mut String, json: &JsonValue) {
	match json {
		JsonValue::Array(array) => write_array(output, array),
		JsonValue::Boolean(b) => output.push_str(if *b { "true" } else { "false" }),
		JsonValue::Null => output.push_str("null"),
		JsonValue::Number(n) => write_number(output, *n),
		JsonValue::Object(object) => write_object(output, object),
		JsonValue::String(s) => {
			output.push('"');
			output.push_str(&escape_json_string(s));
			output.push('"');
		}
	}
}

fn write_array(output: &mut String, array: &JsonArray) {
	output.push('[');
	for (index, value) in array.0.iter().enumerate() {
		if index > 0 {
			output.push(',');
		}
		write_value(output, value);
	}
	output.push(']');
}

fn write_object(output: &mut String, object: &JsonObject) {
	output.push('{');
	for (index, (key, value)) in object.0.iter().enumerate() {
		if index > 0 {
			output.push(',');
		}
		output.push('"');
		output.push_str(&escape_json_string(key));
		output.push_str("\":");
		write_value(output, value);
	}
	output.push('}');
}

// JSON has no representation for NaN or infinities.
fn write_number(output: &mut String, n: f64) {
	if n.is_finite() {
		output.push_str(&n.to_string());
	} else {
		output.push_str("null");
	}
}

/// Escapes quotes, backslashes and control characters.
#[must_use]
pub fn escape_json_string(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'"' => escaped.push_str("\\\""),
			'\\' => escaped.push_str("\\\\"),
			'\n' => escaped.push_str("\\n"),
			'\r' => escaped.push_str("\\r"),
			'\t' => escaped.push_str("\\t"),
			'\x08' => escaped.push_str("\\b"),
			'\x0C' => escaped.push_str("\\f"),
			c if c.is_control() && (c as u32) < 0x20 => escaped.push_str(&format!("\\u{:04x}", c as u32)),
			c => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case(JsonValue::Null, "null")]
	#[case(JsonValue::from(true), "true")]
	#[case(JsonValue::from(42), "42")]
	#[case(JsonValue::from(-0.5), "-0.5")]
	#[case(JsonValue::from(2.352_221_9), "2.3522219")]
	#[case(JsonValue::Number(f64::NAN), "null")]
	#[case(JsonValue::from("Bâtiment \"léger\"\n"), "\"Bâtiment \\\"léger\\\"\\n\"")]
	#[case(JsonValue::from(vec![1, 2]), "[1,2]")]
	fn scalars_and_arrays(#[case] value: JsonValue, #[case] expected: &str) {
		assert_eq!(stringify(&value), expected);
	}

	#[test]
	fn object_is_compact_and_sorted() {
		let value = JsonValue::from(vec![
			("type", JsonValue::from("Polygon")),
			("coordinates", JsonValue::from(vec![vec![vec![1.5, 2.0]]])),
		]);
		assert_eq!(stringify(&value), r#"{"coordinates":[[[1.5,2]]],"type":"Polygon"}"#);
	}

	#[test]
	fn control_characters() {
		assert_eq!(escape_json_string("a\u{1}b\\"), "a\\u0001b\\\\");
	}

	#[test]
	fn reparses_to_the_same_value() {
		let text = r#"{"a":[true,null,{"b":"\u00e9\t"}],"n":-1.25e-7}"#;
		let value = JsonValue::parse_str(text).unwrap();
		assert_eq!(JsonValue::parse_str(&value.stringify()).unwrap(), value);
	}
}
