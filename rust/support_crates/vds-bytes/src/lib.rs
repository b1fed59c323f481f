//! Byte-level layout arithmetic shared by the type system and the region arena:
//! power-of-two alignment and missing-bitmap addressing.

pub mod align;
pub mod bits;
