//! Building blocks of the cadastre ingestion pipeline: region and layer types, source resolution,
//! archive fetching with a persistent HTTP cache, gzip decompression and a streaming JSON scanner.

pub mod byte_iterator;
pub mod cache;
pub mod compression;
pub mod config;
pub mod io;
pub mod json;

mod error;
pub use error::*;

mod types;
pub use types::*;
