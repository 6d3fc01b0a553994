//! GeoJSON features as they travel through the pipeline: the projected [`FeatureRecord`] and the
//! incremental [`FeatureReader`] that extracts them from a feature collection.

mod feature;
mod reader;

pub use feature::*;
pub use reader::*;
