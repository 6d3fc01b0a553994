//! JSON value model used for feature geometries and properties.

use super::{parse_json_str, stringify};
use anyhow::{Result, bail};
use std::{
	collections::BTreeMap,
	fmt::{self, Debug},
};

/// Any JSON value: arrays, objects, numbers, strings, booleans and null.
///
/// Numbers are kept as `f64`, object keys are kept sorted.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Array(JsonArray),
	Boolean(bool),
	Null,
	Number(f64),
	Object(JsonObject),
	String(String),
}

impl JsonValue {
	pub fn parse_str(json: &str) -> Result<JsonValue> {
		parse_json_str(json)
	}

	#[must_use]
	pub fn type_as_str(&self) -> &str {
		use JsonValue::*;
		match self {
			Array(_) => "array",
			Boolean(_) => "boolean",
			Null => "null",
			Number(_) => "number",
			Object(_) => "object",
			String(_) => "string",
		}
	}

	/// Serializes to compact JSON without any whitespace.
	#[must_use]
	pub fn stringify(&self) -> String {
		stringify(self)
	}

	pub fn as_str(&self) -> Result<&str> {
		match self {
			JsonValue::String(text) => Ok(text),
			_ => bail!("expected a string, found {}", self.type_as_str()),
		}
	}

	pub fn as_object(&self) -> Result<&JsonObject> {
		match self {
			JsonValue::Object(object) => Ok(object),
			_ => bail!("expected an object, found {}", self.type_as_str()),
		}
	}

	pub fn as_number(&self) -> Result<f64> {
		match self {
			JsonValue::Number(value) => Ok(*value),
			_ => bail!("expected a number, found {}", self.type_as_str()),
		}
	}
}

/// A JSON array, backed by a `Vec<JsonValue>`.
#[derive(Clone, Default, PartialEq)]
pub struct JsonArray(pub Vec<JsonValue>);

impl Debug for JsonArray {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

/// A JSON object, backed by a `BTreeMap<String, JsonValue>`.
#[derive(Clone, Default, PartialEq)]
pub struct JsonObject(pub BTreeMap<String, JsonValue>);

impl JsonObject {
	#[must_use]
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	/// Removes a key and returns its value, leaving the other entries untouched.
	pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
		self.0.remove(key)
	}

	pub fn set<T>(&mut self, key: &str, value: T)
	where
		JsonValue: From<T>,
	{
		self.0.insert(key.to_owned(), JsonValue::from(value));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.0.keys()
	}
}

impl Debug for JsonObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(&self.0).finish()
	}
}

impl From<&str> for JsonValue {
	fn from(input: &str) -> Self {
		JsonValue::String(input.to_string())
	}
}

impl From<String> for JsonValue {
	fn from(input: String) -> Self {
		JsonValue::String(input)
	}
}

impl From<bool> for JsonValue {
	fn from(input: bool) -> Self {
		JsonValue::Boolean(input)
	}
}

impl From<f64> for JsonValue {
	fn from(input: f64) -> Self {
		JsonValue::Number(input)
	}
}

impl From<i32> for JsonValue {
	fn from(input: i32) -> Self {
		JsonValue::Number(f64::from(input))
	}
}

impl From<u32> for JsonValue {
	fn from(input: u32) -> Self {
		JsonValue::Number(f64::from(input))
	}
}

impl From<JsonObject> for JsonValue {
	fn from(input: JsonObject) -> Self {
		JsonValue::Object(input)
	}
}

impl From<JsonArray> for JsonValue {
	fn from(input: JsonArray) -> Self {
		JsonValue::Array(input)
	}
}

impl<T> From<Vec<T>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(input: Vec<T>) -> Self {
		JsonValue::Array(JsonArray(input.into_iter().map(JsonValue::from).collect()))
	}
}

impl<T> From<Vec<(&str, T)>> for JsonObject
where
	JsonValue: From<T>,
{
	fn from(input: Vec<(&str, T)>) -> Self {
		JsonObject(
			input
				.into_iter()
				.map(|(key, value)| (key.to_string(), JsonValue::from(value)))
				.collect(),
		)
	}
}

impl<T> From<Vec<(&str, T)>> for JsonValue
where
	JsonValue: From<T>,
{
	fn from(input: Vec<(&str, T)>) -> Self {
		JsonValue::Object(JsonObject::from(input))
	}
}
