//! Byte-level scanning of streaming input: the cursor itself and the JSON token helpers built on it.

mod basics;
mod iterator;

pub use basics::*;
pub use iterator::*;
