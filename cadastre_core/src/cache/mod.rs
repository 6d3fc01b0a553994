//! Persistent HTTP cache with conditional revalidation.

mod cache_control;
mod entry;
mod http_cache;

pub use cache_control::*;
pub use entry::*;
pub use http_cache::*;
