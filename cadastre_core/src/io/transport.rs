//! HTTP transport used by the archive fetcher.
//!
//! [`HttpTransport`] is the seam between the fetcher and the network: the production
//! [`ReqwestTransport`] uses a blocking `reqwest` client so that the response body is a plain
//! pull-based `Read`, tests inject their own implementation.

use crate::{SourceError, config::HttpConfig};
use anyhow::Result;
use reqwest::{
	StatusCode,
	blocking::{Client, Response},
	header::{CACHE_CONTROL, ETAG, HeaderMap, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED},
};
use std::{
	fmt,
	io::{self, Read},
	thread::sleep,
	time::Duration,
};

/// A GET request, optionally conditional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRequest {
	pub url: String,
	pub if_none_match: Option<String>,
	pub if_modified_since: Option<String>,
}

impl HttpRequest {
	#[must_use]
	pub fn get(url: &str) -> Self {
		HttpRequest {
			url: url.to_string(),
			..Default::default()
		}
	}

	#[must_use]
	pub fn is_conditional(&self) -> bool {
		self.if_none_match.is_some() || self.if_modified_since.is_some()
	}
}

/// Status line, caching headers and the not yet consumed body of a response.
pub struct HttpResponse {
	pub status: u16,
	pub etag: Option<String>,
	pub last_modified: Option<String>,
	pub cache_control: Option<String>,
	pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
	/// A `200 OK` response without caching headers.
	pub fn ok(body: impl Read + Send + 'static) -> Self {
		HttpResponse {
			status: 200,
			etag: None,
			last_modified: None,
			cache_control: None,
			body: Box::new(body),
		}
	}

	#[must_use]
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = status;
		self
	}

	#[must_use]
	pub fn with_etag(mut self, etag: &str) -> Self {
		self.etag = Some(etag.to_string());
		self
	}

	#[must_use]
	pub fn with_last_modified(mut self, last_modified: &str) -> Self {
		self.last_modified = Some(last_modified.to_string());
		self
	}

	#[must_use]
	pub fn with_cache_control(mut self, cache_control: &str) -> Self {
		self.cache_control = Some(cache_control.to_string());
		self
	}
}

impl fmt::Debug for HttpResponse {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HttpResponse")
			.field("status", &self.status)
			.field("etag", &self.etag)
			.field("last_modified", &self.last_modified)
			.field("cache_control", &self.cache_control)
			.finish_non_exhaustive()
	}
}

/// Performs GET requests.
///
/// Implementations return `SourceError::Fetch` for transport failures. Errors raised while the
/// body is read must carry a `SourceError::Fetch` as well (see [`SourceError::into_io`]), so that
/// they can be told apart from decompression failures further down the stream.
pub trait HttpTransport: Send + Sync {
	fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking `reqwest` transport with timeout and retries.
pub struct ReqwestTransport {
	client: Client,
	max_retries: u32,
	backoff: Duration,
}

impl ReqwestTransport {
	pub fn new(config: &HttpConfig) -> Result<Self> {
		// the blocking client applies `timeout` to the response head and to each body read
		let timeout = Duration::from_secs(config.timeout_secs);
		let client = Client::builder()
			.connect_timeout(timeout)
			.timeout(timeout)
			.user_agent(concat!("cadastre-tiles/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(|e| SourceError::Configuration(format!("unable to build HTTP client: {e}")))?;

		Ok(ReqwestTransport {
			client,
			max_retries: config.max_retries,
			backoff: Duration::from_millis(config.backoff_ms),
		})
	}

	fn backoff_for(&self, attempt: u32) -> Duration {
		self.backoff.saturating_mul(1 << (attempt - 1).min(16))
	}
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout() || err.is_body()
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
	headers
		.get(name)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string)
}

impl HttpTransport for ReqwestTransport {
	fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
		let url = &request.url;
		let mut attempt = 0;

		let response: Response = loop {
			if attempt > 0 {
				let backoff = self.backoff_for(attempt);
				log::warn!(
					"retry attempt {attempt}/{} fetching '{url}', waiting {backoff:?}",
					self.max_retries
				);
				sleep(backoff);
			}

			let mut builder = self.client.get(url);
			if let Some(etag) = &request.if_none_match {
				builder = builder.header(IF_NONE_MATCH, etag);
			}
			if let Some(last_modified) = &request.if_modified_since {
				builder = builder.header(IF_MODIFIED_SINCE, last_modified);
			}

			match builder.send() {
				Ok(r) if r.status().is_server_error() && attempt < self.max_retries => {
					log::warn!("server error {} for '{url}'", r.status());
				}
				Ok(r) => break r,
				Err(e) if is_retryable_error(&e) && attempt < self.max_retries => {
					log::warn!("retryable error: {e}");
				}
				Err(e) => return Err(SourceError::Fetch(format!("request to '{url}' failed: {e}")).into()),
			}
			attempt += 1;
		};

		let headers = response.headers();
		let etag = header_string(headers, ETAG);
		let last_modified = header_string(headers, LAST_MODIFIED);
		let cache_control = header_string(headers, CACHE_CONTROL);
		let status = response.status();

		Ok(HttpResponse {
			status: status.as_u16(),
			etag,
			last_modified,
			cache_control,
			body: Box::new(TransportBody {
				inner: response,
				url: url.clone(),
				is_empty: status == StatusCode::NOT_MODIFIED,
			}),
		})
	}
}

/// Response body that tags read failures as fetch errors.
struct TransportBody {
	inner: Response,
	url: String,
	is_empty: bool,
}

impl Read for TransportBody {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if self.is_empty {
			return Ok(0);
		}
		self.inner.read(buf).map_err(|e| {
			if e.kind() == io::ErrorKind::Interrupted {
				e
			} else {
				SourceError::Fetch(format!("reading body of '{}' failed: {e}", self.url)).into_io()
			}
		})
	}
}
