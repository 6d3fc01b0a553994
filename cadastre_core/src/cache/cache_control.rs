/// The `Cache-Control` directives that decide whether and how long a response is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheControl {
	pub max_age: Option<u64>,
	pub no_cache: bool,
	pub no_store: bool,
}

impl CacheControl {
	/// Parses a `Cache-Control` header value. Unknown directives are ignored.
	#[must_use]
	pub fn parse(header: Option<&str>) -> Self {
		let mut result = CacheControl::default();
		let Some(header) = header else {
			return result;
		};

		for directive in header.split(',') {
			let directive = directive.trim().to_ascii_lowercase();
			let (name, value) = match directive.split_once('=') {
				Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
				None => (directive.as_str(), None),
			};
			match name {
				"max-age" => result.max_age = value.and_then(|v| v.parse().ok()),
				"no-cache" => result.no_cache = true,
				"no-store" => result.no_store = true,
				_ => {}
			}
		}
		result
	}

	/// Seconds a stored response may be served without revalidation.
	#[must_use]
	pub fn freshness_lifetime(&self) -> u64 {
		if self.no_cache {
			0
		} else {
			self.max_age.unwrap_or(0)
		}
	}
}
