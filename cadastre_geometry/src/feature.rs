//! The projected feature record handed to the tile builder.

use anyhow::{Result, bail};
use cadastre_core::json::{JsonObject, JsonValue, parse_json_str};

/// A GeoJSON feature reduced to `type`, `geometry` and `properties`.
///
/// Fields missing in the source stay absent, an explicit `null` stays `null`. Geometry and
/// properties are carried through untouched; no validation or simplification happens here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureRecord {
	pub feature_type: Option<JsonValue>,
	pub geometry: Option<JsonValue>,
	pub properties: Option<JsonValue>,
}

impl FeatureRecord {
	/// Keeps the three relevant members of a feature object and drops everything else.
	#[must_use]
	pub fn project(mut object: JsonObject) -> Self {
		FeatureRecord {
			feature_type: object.remove("type"),
			geometry: object.remove("geometry"),
			properties: object.remove("properties"),
		}
	}

	pub fn from_json(value: JsonValue) -> Result<Self> {
		match value {
			JsonValue::Object(object) => Ok(FeatureRecord::project(object)),
			other => bail!("expected a feature object, found {}", other.type_as_str()),
		}
	}

	/// Parses one serialized line back into a record.
	pub fn parse_line(line: &str) -> Result<Self> {
		FeatureRecord::from_json(parse_json_str(line.trim_end_matches(['\n', '\r']))?)
	}

	#[must_use]
	pub fn to_json(&self) -> JsonValue {
		let mut object = JsonObject::new();
		if let Some(feature_type) = &self.feature_type {
			object.set("type", feature_type.clone());
		}
		if let Some(geometry) = &self.geometry {
			object.set("geometry", geometry.clone());
		}
		if let Some(properties) = &self.properties {
			object.set("properties", properties.clone());
		}
		JsonValue::Object(object)
	}

	/// Serializes the record as one line of newline-delimited JSON, including the `\n`.
	#[must_use]
	pub fn to_line(&self) -> String {
		let mut line = self.to_json().stringify();
		line.push('\n');
		line
	}
}
