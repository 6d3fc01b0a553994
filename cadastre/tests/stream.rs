use assert_fs::{TempDir, prelude::*};
use predicates::str;
use pretty_assertions::assert_eq;
use test_utilities::*;

fn stdout_lines(output: &[u8]) -> Vec<String> {
	String::from_utf8(output.to_vec()).unwrap().lines().map(String::from).collect()
}

#[test]
fn streams_regions_in_order() {
	let sources = source_dir(&[("01", 2), ("2A", 1)]);
	let output = cadastre_cmd()
		.args(["stream", "parcelles", "2A", "1", "--no-cache", "--base-url"])
		.arg(sources.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();

	assert_eq!(
		stdout_lines(&output),
		vec![
			r#"{"geometry":{"coordinates":[2.35,48.85],"type":"Point"},"properties":{"index":1,"region":"2A"},"type":"Feature"}"#,
			r#"{"geometry":{"coordinates":[2.35,48.85],"type":"Point"},"properties":{"index":1,"region":"01"},"type":"Feature"}"#,
			r#"{"geometry":{"coordinates":[2.35,48.85],"type":"Point"},"properties":{"index":2,"region":"01"},"type":"Feature"}"#,
		]
	);
}

#[test]
fn corrupt_region_fails_the_run_after_streaming_the_rest() {
	let sources = source_dir(&[("02", 3)]);
	put_archive(sources.path(), "sections", "01", b"\x1f\x8bnot really gzip");

	let assert = cadastre_cmd()
		.args(["stream", "sections", "01", "02", "--no-cache", "--base-url"])
		.arg(sources.path())
		.assert()
		.failure()
		.code(1)
		.stderr(str::contains("layer sections, region 01: DecodeError"));
	assert_eq!(stdout_lines(&assert.get_output().stdout).len(), 3);
}

#[test]
fn allow_incomplete_from_config_file() {
	let sources = source_dir(&[("02", 3)]);
	put_archive(sources.path(), "sections", "01", b"garbage");

	let dir = TempDir::new().unwrap();
	let config = dir.child("cadastre.yml");
	config
		.write_str(&format!(
			"base_url: {}\ncache:\n  enabled: false\nallow_incomplete: true\n",
			sources.path().display()
		))
		.unwrap();

	let assert = cadastre_cmd()
		.args(["stream", "sections", "01", "02", "--config"])
		.arg(config.path())
		.assert()
		.success();
	assert_eq!(stdout_lines(&assert.get_output().stdout).len(), 3);
}

#[test]
fn missing_archive_is_fatal() {
	let sources = source_dir(&[("02", 1)]);
	cadastre_cmd()
		.args(["stream", "batiments", "01", "02", "--no-cache", "--base-url"])
		.arg(sources.path())
		.assert()
		.failure()
		.code(1)
		.stdout(str::is_empty())
		.stderr(str::contains("archive not found"));
}

#[test]
fn unknown_config_key() {
	let dir = TempDir::new().unwrap();
	let config = dir.child("cadastre.yml");
	config.write_str("tiles: everything\n").unwrap();
	cadastre_cmd()
		.args(["stream", "sections", "01", "--config"])
		.arg(config.path())
		.assert()
		.failure()
		.stderr(str::contains("parsing config file"));
}
