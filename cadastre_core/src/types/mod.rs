mod layer;
mod region;
mod source;

pub use layer::*;
pub use region::*;
pub use source::*;
