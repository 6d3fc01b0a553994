//! Invocation of the external tile builder (`tippecanoe`) and tile merger (`tile-join`).

use crate::FeatureStream;
use anyhow::{Context, Result};
use cadastre_core::Layer;
use std::{
	ffi::OsString,
	io::{self, BufWriter},
	path::{Path, PathBuf},
	process::{Command, ExitStatus, Stdio},
};
use thiserror::Error;

pub const MERGED_FILE_NAME: &str = "cadastre.mbtiles";

const COMMON_BUILDER_FLAGS: [&str; 6] = [
	"--no-tile-stats",
	"--detect-shared-borders",
	"--simplify-only-low-zooms",
	"--generate-ids",
	"--read-parallel",
	"--force",
];

/// An external program ended unsuccessfully.
#[derive(Debug, Error)]
#[error("{program} failed with {status}")]
pub struct ExternalProcessFailure {
	pub program: String,
	pub status: ExitStatus,
}

/// Builds the tile set of one layer from a newline-delimited feature stream on standard input.
#[derive(Clone, Debug)]
pub struct TileBuilder {
	program: String,
	output_dir: PathBuf,
}

impl TileBuilder {
	pub fn new(program: &str, output_dir: &Path) -> Self {
		TileBuilder {
			program: program.to_string(),
			output_dir: output_dir.to_path_buf(),
		}
	}

	#[must_use]
	pub fn output_path(&self, layer: Layer) -> PathBuf {
		self.output_dir.join(layer.output_file_name())
	}

	#[must_use]
	pub fn arguments(&self, layer: Layer) -> Vec<OsString> {
		let (min_zoom, max_zoom) = layer.zoom_range();
		let mut args: Vec<OsString> = COMMON_BUILDER_FLAGS.iter().map(OsString::from).collect();
		args.extend([
			OsString::from("--layer"),
			OsString::from(layer.name()),
			OsString::from(layer.density_strategy().as_flag()),
			OsString::from(format!("-Z{min_zoom}")),
			OsString::from(format!("-z{max_zoom}")),
			OsString::from("--output"),
			self.output_path(layer).into_os_string(),
		]);
		args
	}

	/// Pipes the whole stream into one builder run and waits for it to exit.
	///
	/// Standard output and error of the builder are passed through. If the builder stops reading,
	/// writing stops and its exit status decides. A fatal stream error kills the builder.
	pub fn build(&self, stream: &mut FeatureStream) -> Result<()> {
		let layer = stream.layer();
		log::info!("building tiles for layer {layer}");

		let mut child = Command::new(&self.program)
			.args(self.arguments(layer))
			.stdin(Stdio::piped())
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit())
			.spawn()
			.with_context(|| format!("starting tile builder '{}'", self.program))?;

		let stdin = child.stdin.take().context("tile builder has no standard input")?;
		let mut input = BufWriter::with_capacity(1 << 16, stdin);
		let written = stream.write_to(&mut input);
		drop(input);

		match written {
			Ok(lines) => log::debug!("{lines} features written to '{}'", self.program),
			Err(error) if is_broken_pipe(&error) => {
				log::warn!("'{}' closed its input before the stream of layer {layer} ended", self.program);
			}
			Err(error) => {
				child.kill().ok();
				child.wait().ok();
				return Err(error.context(format!("streaming layer {layer} into '{}'", self.program)));
			}
		}

		let status = child
			.wait()
			.with_context(|| format!("waiting for tile builder '{}'", self.program))?;
		if !status.success() {
			return Err(ExternalProcessFailure {
				program: self.program.clone(),
				status,
			}
			.into());
		}
		log::info!("layer {layer} written to {}", self.output_path(layer).display());
		Ok(())
	}
}

/// Whether the consumer of a stream closed its end early.
pub fn is_broken_pipe(error: &anyhow::Error) -> bool {
	error.chain().any(|cause| {
		cause
			.downcast_ref::<io::Error>()
			.is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
	})
}

/// Merges the three layer tile sets into one.
#[derive(Clone, Debug)]
pub struct TileMerger {
	program: String,
	output_dir: PathBuf,
	attribution: String,
	name: String,
}

impl TileMerger {
	pub fn new(program: &str, output_dir: &Path, attribution: &str, name: &str) -> Self {
		TileMerger {
			program: program.to_string(),
			output_dir: output_dir.to_path_buf(),
			attribution: attribution.to_string(),
			name: name.to_string(),
		}
	}

	#[must_use]
	pub fn output_path(&self) -> PathBuf {
		self.output_dir.join(MERGED_FILE_NAME)
	}

	#[must_use]
	pub fn arguments(&self) -> Vec<OsString> {
		let mut args: Vec<OsString> = vec![
			format!("--attribution={}", self.attribution).into(),
			format!("--name={}", self.name).into(),
			"--no-tile-size-limit".into(),
			"--no-tile-stats".into(),
			"--force".into(),
			"--output".into(),
			self.output_path().into_os_string(),
		];
		args.extend(
			Layer::MERGE_ORDER
				.iter()
				.map(|layer| self.output_dir.join(layer.output_file_name()).into_os_string()),
		);
		args
	}

	pub fn merge(&self) -> Result<()> {
		log::info!("merging layers into {}", self.output_path().display());
		let status = Command::new(&self.program)
			.args(self.arguments())
			.stdin(Stdio::null())
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit())
			.status()
			.with_context(|| format!("starting tile merger '{}'", self.program))?;
		if !status.success() {
			return Err(ExternalProcessFailure {
				program: self.program.clone(),
				status,
			}
			.into());
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn strings(args: Vec<OsString>) -> Vec<String> {
		args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
	}

	#[test]
	fn builder_arguments() {
		let builder = TileBuilder::new("tippecanoe", Path::new("dist"));
		assert_eq!(
			strings(builder.arguments(Layer::Batiments)),
			vec![
				"--no-tile-stats",
				"--detect-shared-borders",
				"--simplify-only-low-zooms",
				"--generate-ids",
				"--read-parallel",
				"--force",
				"--layer",
				"batiments",
				"--drop-densest-as-needed",
				"-Z14",
				"-z16",
				"--output",
				"dist/batiments.mbtiles",
			]
		);
		let sections = strings(builder.arguments(Layer::Sections));
		assert_eq!(&sections[6..11], ["--layer", "sections", "--coalesce-densest-as-needed", "-Z11", "-z16"]);
		let parcelles = strings(builder.arguments(Layer::Parcelles));
		assert_eq!(&parcelles[8..11], ["--coalesce-densest-as-needed", "-Z13", "-z16"]);
	}

	#[test]
	fn merger_arguments() {
		let merger = TileMerger::new("tile-join", Path::new("dist"), "Etalab", "cadastre");
		assert_eq!(
			strings(merger.arguments()),
			vec![
				"--attribution=Etalab",
				"--name=cadastre",
				"--no-tile-size-limit",
				"--no-tile-stats",
				"--force",
				"--output",
				"dist/cadastre.mbtiles",
				"dist/parcelles.mbtiles",
				"dist/sections.mbtiles",
				"dist/batiments.mbtiles",
			]
		);
	}

	#[test]
	fn missing_program() {
		let dir = tempfile::tempdir().unwrap();
		let merger = TileMerger::new("/nonexistent/tile-join", dir.path(), "Etalab", "cadastre");
		let error = merger.merge().unwrap_err();
		assert!(error.to_string().contains("starting tile merger"));
	}
}
