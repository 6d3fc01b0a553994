//! A small JSON model for GeoJSON geometries and properties.

mod parse;
mod stringify;
mod value;

pub use parse::*;
pub use stringify::*;
pub use value::*;
