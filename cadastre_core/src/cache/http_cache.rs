//! Persistent store of HTTP responses, one file per URL.

use super::CacheEntryHeader;
use anyhow::{Context, Result, bail};
use std::{
	fmt::Debug,
	fs::{File, create_dir_all, remove_file, rename},
	io::{self, BufReader, BufWriter, Read},
	path::{Path, PathBuf},
	time::{SystemTime, UNIX_EPOCH},
};

/// A stored response: its header and a reader positioned at the start of the body.
pub struct CachedResponse {
	pub header: CacheEntryHeader,
	pub body: BufReader<File>,
}

/// Each URL is stored as two files: a small `.header` and the raw `.body`. Revalidation only
/// rewrites the header.
pub struct HttpCache {
	path: PathBuf,
}

struct EntryPaths {
	header: PathBuf,
	body: PathBuf,
}

impl HttpCache {
	/// Opens the cache directory, creating it if needed.
	pub fn open(path: &Path) -> Result<Self> {
		create_dir_all(path).with_context(|| format!("creating cache directory {}", path.display()))?;
		log::debug!("using HTTP cache at {}", path.display());
		Ok(HttpCache { path: path.to_path_buf() })
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Seconds since the Unix epoch.
	#[must_use]
	pub fn now() -> u64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or(0)
	}

	fn get_entry_paths(&self, url: &str) -> EntryPaths {
		// keep the name a valid file name by escaping everything but a few safe characters as '%xx'
		let name = url
			.bytes()
			.map(|b| {
				if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-' {
					(b as char).to_string()
				} else {
					format!("%{b:02x}")
				}
			})
			.collect::<String>();
		EntryPaths {
			header: self.path.join(format!("{name}.header")),
			body: self.path.join(format!("{name}.body")),
		}
	}

	/// Looks up the stored response for `url`.
	///
	/// Unreadable or incomplete entries are treated as missing and removed.
	pub fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
		let paths = self.get_entry_paths(url);
		let header_file = match File::open(&paths.header) {
			Ok(file) => file,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e).with_context(|| format!("opening cache entry {}", paths.header.display())),
		};

		let header = match CacheEntryHeader::read_from(&mut BufReader::new(header_file)) {
			Ok(header) => header,
			Err(e) => {
				log::warn!("discarding broken cache entry {}: {e}", paths.header.display());
				self.remove(url)?;
				return Ok(None);
			}
		};

		match File::open(&paths.body) {
			Ok(file) => Ok(Some(CachedResponse {
				header,
				body: BufReader::new(file),
			})),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				log::warn!("discarding cache entry without body {}", paths.header.display());
				self.remove(url)?;
				Ok(None)
			}
			Err(e) => Err(e).with_context(|| format!("opening cache entry {}", paths.body.display())),
		}
	}

	/// Stores a response and returns the number of body bytes written.
	///
	/// Both files are written to temporary files and synced first. The old header is removed before
	/// the new files are renamed into place, so a header never describes a foreign body. If `body`
	/// fails, the previous entry (if any) is left untouched.
	pub fn put(&self, url: &str, header: &CacheEntryHeader, body: &mut dyn Read) -> Result<u64> {
		let paths = self.get_entry_paths(url);
		let body_tmp = paths.body.with_extension("body.tmp");
		let header_tmp = paths.header.with_extension("header.tmp");

		let written = write_synced(&body_tmp, |writer| Ok(io::copy(body, writer)?))
			.and_then(|length| write_synced(&header_tmp, |writer| header.write_to(writer)).map(|()| length));
		let length = match written {
			Ok(length) => length,
			Err(e) => {
				remove_file(&body_tmp).ok();
				remove_file(&header_tmp).ok();
				return Err(e);
			}
		};

		remove_if_exists(&paths.header)?;
		rename(&body_tmp, &paths.body)
			.with_context(|| format!("moving cache entry into place at {}", paths.body.display()))?;
		rename(&header_tmp, &paths.header)
			.with_context(|| format!("moving cache entry into place at {}", paths.header.display()))?;
		log::debug!("stored {length} bytes for '{url}' in cache");
		Ok(length)
	}

	/// Replaces the header of a stored response. The body file is not touched.
	pub fn update_header(&self, url: &str, header: &CacheEntryHeader) -> Result<()> {
		let paths = self.get_entry_paths(url);
		if !paths.body.is_file() {
			bail!("no cache entry to update for '{url}'");
		}
		let header_tmp = paths.header.with_extension("header.tmp");
		if let Err(e) = write_synced(&header_tmp, |writer| header.write_to(writer)) {
			remove_file(&header_tmp).ok();
			return Err(e);
		}
		rename(&header_tmp, &paths.header)
			.with_context(|| format!("moving cache entry into place at {}", paths.header.display()))?;
		Ok(())
	}

	pub fn remove(&self, url: &str) -> Result<()> {
		let paths = self.get_entry_paths(url);
		remove_if_exists(&paths.header)?;
		remove_if_exists(&paths.body)
	}
}

fn remove_if_exists(path: &Path) -> Result<()> {
	match remove_file(path) {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e).with_context(|| format!("removing cache file {}", path.display())),
	}
}

fn write_synced<T>(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<T>) -> Result<T> {
	let mut writer = BufWriter::new(File::create(path)?);
	let result = write(&mut writer)?;
	let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
	file.sync_all()?;
	Ok(result)
}

impl Debug for HttpCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpCache").field("path", &self.path).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;
	use tempfile::TempDir;

	fn new_cache() -> (TempDir, HttpCache) {
		let dir = tempfile::tempdir().unwrap();
		let cache = HttpCache::open(&dir.path().join("http")).unwrap();
		(dir, cache)
	}

	fn header(etag: &str) -> CacheEntryHeader {
		CacheEntryHeader {
			stored_at: 10,
			expires_at: 20,
			etag: Some(etag.to_string()),
			last_modified: None,
		}
	}

	struct BrokenBody;

	impl Read for BrokenBody {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
		}
	}

	#[test]
	fn entry_paths_escape_url() {
		let (_tmp, cache) = new_cache();
		let paths = cache.get_entry_paths("https://host/a b/01.json.gz?x=1");
		assert_eq!(
			paths.header.file_name().unwrap().to_str().unwrap(),
			"https%3a%2f%2fhost%2fa%20b%2f01.json.gz%3fx%3d1.header"
		);
		assert_eq!(
			paths.body.file_name().unwrap().to_str().unwrap(),
			"https%3a%2f%2fhost%2fa%20b%2f01.json.gz%3fx%3d1.body"
		);
	}

	#[test]
	fn put_then_get() {
		let (_tmp, cache) = new_cache();
		let url = "https://host/01.json.gz";
		assert!(cache.get(url).unwrap().is_none());

		let written = cache.put(url, &header("\"v1\""), &mut Cursor::new(b"body-bytes")).unwrap();
		assert_eq!(written, 10);

		let mut cached = cache.get(url).unwrap().unwrap();
		assert_eq!(cached.header, header("\"v1\""));
		let mut body = Vec::new();
		cached.body.read_to_end(&mut body).unwrap();
		assert_eq!(body, b"body-bytes");
	}

	#[test]
	fn failed_put_keeps_previous_entry() {
		let (_tmp, cache) = new_cache();
		let url = "https://host/02.json.gz";
		cache.put(url, &header("\"v1\""), &mut Cursor::new(b"old")).unwrap();

		assert!(cache.put(url, &header("\"v2\""), &mut BrokenBody).is_err());

		let cached = cache.get(url).unwrap().unwrap();
		assert_eq!(cached.header.etag.as_deref(), Some("\"v1\""));
		let leftovers: Vec<_> = std::fs::read_dir(cache.path())
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
			.collect();
		assert!(leftovers.is_empty());
	}

	#[test]
	fn update_header_keeps_body() {
		let (_tmp, cache) = new_cache();
		let url = "https://host/03.json.gz";
		cache.put(url, &header("\"v1\""), &mut Cursor::new(b"payload")).unwrap();

		let mut refreshed = header("\"v1\"");
		refreshed.expires_at = 99;
		cache.update_header(url, &refreshed).unwrap();

		let mut cached = cache.get(url).unwrap().unwrap();
		assert_eq!(cached.header.expires_at, 99);
		let mut body = String::new();
		cached.body.read_to_string(&mut body).unwrap();
		assert_eq!(body, "payload");

		assert!(cache.update_header("https://host/unknown.json.gz", &refreshed).is_err());
	}

	#[cfg(unix)]
	#[test]
	fn update_header_leaves_the_body_file_alone() {
		use std::os::unix::fs::MetadataExt;

		let (_tmp, cache) = new_cache();
		let url = "https://host/05.json.gz";
		cache.put(url, &header("\"v1\""), &mut Cursor::new(vec![7u8; 1 << 16])).unwrap();
		let body_path = cache.get_entry_paths(url).body;
		let before = std::fs::metadata(&body_path).unwrap();

		let mut refreshed = header("\"v1\"");
		refreshed.expires_at = 1000;
		cache.update_header(url, &refreshed).unwrap();

		let after = std::fs::metadata(&body_path).unwrap();
		assert_eq!(after.ino(), before.ino());
		assert_eq!(after.len(), 1 << 16);
		assert_eq!(cache.get(url).unwrap().unwrap().header.expires_at, 1000);
	}

	#[test]
	fn remove_and_broken_entries() {
		let (_tmp, cache) = new_cache();
		let url = "https://host/04.json.gz";
		cache.put(url, &header("\"v1\""), &mut Cursor::new(b"x")).unwrap();
		cache.remove(url).unwrap();
		assert!(cache.get(url).unwrap().is_none());
		cache.remove(url).unwrap();

		let paths = cache.get_entry_paths(url);
		cache.put(url, &header("\"v1\""), &mut Cursor::new(b"x")).unwrap();
		std::fs::write(&paths.header, b"garbage").unwrap();
		assert!(cache.get(url).unwrap().is_none());
		assert!(!paths.header.exists());
		assert!(!paths.body.exists());

		cache.put(url, &header("\"v1\""), &mut Cursor::new(b"x")).unwrap();
		std::fs::remove_file(&paths.body).unwrap();
		assert!(cache.get(url).unwrap().is_none());
		assert!(!paths.header.exists());
	}
}
