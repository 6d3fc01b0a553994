//! The ingestion pipeline: per-layer feature streams concatenated over all regions, piped into
//! the external tile builder, and the final merge of the layer tile sets.

mod report;
mod run;
mod stream;
mod tiles;

pub use report::*;
pub use run::*;
pub use stream::*;
pub use tiles::*;

#[cfg(test)]
mod test_utils;
