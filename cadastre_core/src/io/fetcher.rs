//! Opens the compressed byte stream of a source location.
//!
//! Local paths are opened directly. Remote URLs go through the [`HttpTransport`], optionally
//! backed by an [`HttpCache`]:
//!
//! - a fresh stored response is served from disk without touching the network
//! - a stale one is revalidated with `If-None-Match` / `If-Modified-Since`, a `304` refreshes it
//! - a `200` is written to the cache (unless `no-store`) before the stream is handed out

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::{
	SourceError, SourceLocation,
	cache::{CacheControl, CacheEntryHeader, HttpCache},
};
use anyhow::{Context, Result};
use std::{
	fs::File,
	io::{self, Read},
	path::Path,
};

pub struct ArchiveFetcher {
	transport: Box<dyn HttpTransport>,
	cache: Option<HttpCache>,
}

impl ArchiveFetcher {
	pub fn new(transport: Box<dyn HttpTransport>, cache: Option<HttpCache>) -> Self {
		ArchiveFetcher { transport, cache }
	}

	#[must_use]
	pub fn cache(&self) -> Option<&HttpCache> {
		self.cache.as_ref()
	}

	/// Opens a stream of the still compressed archive.
	///
	/// Errors carry a [`SourceError`]: `NotFound` for a missing local file, `Fetch` for everything
	/// that goes wrong on the network.
	pub fn open(&self, location: &SourceLocation) -> Result<Box<dyn Read + Send>> {
		match location {
			SourceLocation::Local(path) => open_local(path),
			SourceLocation::Remote(url) => match &self.cache {
				Some(cache) => self.open_cached(cache, url),
				None => self.open_uncached(url),
			},
		}
	}

	fn open_uncached(&self, url: &str) -> Result<Box<dyn Read + Send>> {
		let response = self.transport.get(&HttpRequest::get(url))?;
		if response.status != 200 {
			return Err(unexpected_status(url, &response).into());
		}
		Ok(response.body)
	}

	fn open_cached(&self, cache: &HttpCache, url: &str) -> Result<Box<dyn Read + Send>> {
		let now = HttpCache::now();
		let cached = cache.get(url)?;

		let mut request = HttpRequest::get(url);
		if let Some(cached) = cached {
			if cached.header.is_fresh(now) {
				log::debug!("cache hit for '{url}'");
				return Ok(Box::new(cached.body));
			}
			if cached.header.has_validators() {
				log::debug!("revalidating cached '{url}'");
				request.if_none_match = cached.header.etag.clone();
				request.if_modified_since = cached.header.last_modified.clone();
			}
		} else {
			log::debug!("cache miss for '{url}'");
		}

		let mut response = self.transport.get(&request)?;
		let cache_control = CacheControl::parse(response.cache_control.as_deref());

		match response.status {
			304 if request.is_conditional() => {
				let mut cached = cache
					.get(url)?
					.ok_or_else(|| SourceError::Fetch(format!("'{url}' answered 304 but the cache entry is gone")))?;
				if cache_control.no_store {
					cache.remove(url)?;
				} else {
					cached.header.expires_at = now + cache_control.freshness_lifetime();
					if response.etag.is_some() {
						cached.header.etag = response.etag.take();
					}
					if response.last_modified.is_some() {
						cached.header.last_modified = response.last_modified.take();
					}
					cache.update_header(url, &cached.header)?;
				}
				log::debug!("'{url}' not modified, serving from cache");
				Ok(Box::new(cached.body))
			}
			200 if cache_control.no_store => {
				log::debug!("'{url}' must not be stored");
				cache.remove(url)?;
				Ok(response.body)
			}
			200 => {
				let header = CacheEntryHeader {
					stored_at: now,
					expires_at: now + cache_control.freshness_lifetime(),
					etag: response.etag.take(),
					last_modified: response.last_modified.take(),
				};
				cache.put(url, &header, &mut response.body).map_err(|e| {
					if SourceError::find_in(&e).is_some() {
						e
					} else {
						e.context(format!("caching '{url}'"))
					}
				})?;
				let stored = cache
					.get(url)?
					.with_context(|| format!("cache entry for '{url}' vanished after writing"))?;
				Ok(Box::new(stored.body))
			}
			_ => Err(unexpected_status(url, &response).into()),
		}
	}
}

fn open_local(path: &Path) -> Result<Box<dyn Read + Send>> {
	match File::open(path) {
		Ok(file) => Ok(Box::new(file)),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound(path.display().to_string()).into()),
		Err(e) => Err(SourceError::Fetch(format!("opening {}: {e}", path.display())).into()),
	}
}

fn unexpected_status(url: &str, response: &HttpResponse) -> SourceError {
	SourceError::Fetch(format!("HTTP {} for '{url}'", response.status))
}
