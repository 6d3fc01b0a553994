//! Fixtures shared by the pipeline tests.

use crate::FeatureSource;
use anyhow::Result;
use cadastre_core::{
	Layer, SourceError, SourceResolver,
	io::{ArchiveFetcher, HttpRequest, HttpResponse, HttpTransport},
};
use cadastre_geometry::FeatureRecord;
use flate2::{Compression, write::GzEncoder};
use std::{collections::HashMap, io::Cursor, io::Write};
use tempfile::TempDir;

pub const REMOTE_BASE: &str = "https://cadastre.test/departements";

/// A feature collection whose features carry `region` and a 1-based `index` in their properties.
pub fn feature_collection(region: &str, count: u32) -> Vec<u8> {
	let features: Vec<String> = (1..=count)
		.map(|index| {
			format!(
				r#"{{"type":"Feature","id":"{region}-{index}","geometry":{{"type":"Point","coordinates":[{index},45.75]}},"properties":{{"region":"{region}","index":{index}}}}}"#
			)
		})
		.collect();
	format!(
		r#"{{"type":"FeatureCollection","features":[{}]}}"#,
		features.join(",")
	)
	.into_bytes()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
	encoder.write_all(data).unwrap();
	encoder.finish().unwrap()
}

pub fn tag_of(record: &FeatureRecord) -> String {
	property(record, "region").as_str().unwrap().to_string()
}

pub fn index_of(record: &FeatureRecord) -> u32 {
	property(record, "index").as_number().unwrap() as u32
}

fn property<'a>(record: &'a FeatureRecord, key: &str) -> &'a cadastre_core::json::JsonValue {
	record
		.properties
		.as_ref()
		.unwrap()
		.as_object()
		.unwrap()
		.get(key)
		.unwrap()
}

/// Writes archives into the directory layout of the upstream provider.
pub fn fixture_dir(files: &[(Layer, &str, Vec<u8>)]) -> TempDir {
	let dir = tempfile::tempdir().unwrap();
	for (layer, region, data) in files {
		let region_dir = dir.path().join(region);
		std::fs::create_dir_all(&region_dir).unwrap();
		std::fs::write(region_dir.join(format!("cadastre-{region}-{layer}.json.gz")), data).unwrap();
	}
	dir
}

pub fn local_source(dir: &TempDir) -> FeatureSource {
	let resolver = SourceResolver::new(dir.path().to_str().unwrap()).unwrap();
	FeatureSource::new(resolver, ArchiveFetcher::new(Box::new(FakeTransport::default()), None))
}

pub fn remote_url(layer: Layer, region: &str) -> String {
	format!("{REMOTE_BASE}/{region}/cadastre-{region}-{layer}.json.gz")
}

pub fn remote_source(transport: FakeTransport) -> FeatureSource {
	let resolver = SourceResolver::new(REMOTE_BASE).unwrap();
	FeatureSource::new(resolver, ArchiveFetcher::new(Box::new(transport), None))
}

enum FakeReply {
	Body(Vec<u8>),
	Error(String),
}

/// Answers from a fixed table, unknown URLs get a 404.
#[derive(Default)]
pub struct FakeTransport {
	replies: HashMap<String, FakeReply>,
}

impl FakeTransport {
	pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
		self.replies.insert(url.to_string(), FakeReply::Body(body));
		self
	}

	pub fn with_error(mut self, url: &str, message: &str) -> Self {
		self.replies.insert(url.to_string(), FakeReply::Error(message.to_string()));
		self
	}
}

impl HttpTransport for FakeTransport {
	fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
		match self.replies.get(&request.url) {
			Some(FakeReply::Body(body)) => Ok(HttpResponse::ok(Cursor::new(body.clone()))),
			Some(FakeReply::Error(message)) => Err(SourceError::Fetch(message.clone()).into()),
			None => Ok(HttpResponse::ok(Cursor::new(Vec::new())).with_status(404)),
		}
	}
}
