//! Byte sources: the HTTP transport and the archive fetcher.

mod fetcher;
mod transport;

pub use fetcher::*;
pub use transport::*;
