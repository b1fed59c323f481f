//! The region arena that decoded values live in, and typed navigation over it.

pub mod region;
pub mod typed_value;
pub mod value;

pub use region::Region;
pub use typed_value::TypedRegionValue;
pub use value::Value;
