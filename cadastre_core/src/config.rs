//! Settings of the HTTP transport and of the persistent cache.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
	/// Connect and read timeout, in seconds.
	pub timeout_secs: u64,
	/// Retries for connection errors, timeouts and server errors.
	pub max_retries: u32,
	/// Base of the exponential backoff between retries, in milliseconds.
	pub backoff_ms: u64,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfig {
			timeout_secs: 30,
			max_retries: 3,
			backoff_ms: 1000,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
	pub enabled: bool,
	pub directory: PathBuf,
}

impl Default for CacheConfig {
	fn default() -> Self {
		CacheConfig {
			enabled: true,
			directory: PathBuf::from(".cache/http"),
		}
	}
}
