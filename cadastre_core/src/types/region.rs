//! Region (département) codes and the default catalog.

use crate::SourceError;
use std::fmt;

const REGION_CODE_WIDTH: usize = 2;
const OVERSEAS_PREFIX: &str = "97";

/// A normalized département code such as `01`, `2A` or `974`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCode(String);

impl RegionCode {
	/// Normalizes a user-supplied code.
	///
	/// Overseas codes (starting with `97`) are kept as they are, all other codes are left-padded with
	/// `0` to two characters.
	pub fn parse(input: &str) -> Result<Self, SourceError> {
		let code = input.trim();
		if code.is_empty() {
			return Err(SourceError::Configuration("empty region code".to_string()));
		}
		if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(SourceError::Configuration(format!("invalid region code '{code}'")));
		}
		if code.starts_with(OVERSEAS_PREFIX) {
			return Ok(RegionCode(code.to_string()));
		}
		Ok(RegionCode(format!("{code:0>REGION_CODE_WIDTH$}")))
	}

	pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, SourceError> {
		inputs.iter().map(|input| RegionCode::parse(input.as_ref())).collect()
	}

	/// The complete catalog of départements in canonical order.
	#[must_use]
	pub fn catalog() -> Vec<RegionCode> {
		let mut codes = Vec::with_capacity(101);
		codes.extend((1..=19).map(|n| format!("{n:02}")));
		codes.push("2A".to_string());
		codes.push("2B".to_string());
		codes.extend((21..=95).map(|n| format!("{n:02}")));
		codes.extend(["971", "972", "973", "974", "976"].map(String::from));
		codes.into_iter().map(RegionCode).collect()
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RegionCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
