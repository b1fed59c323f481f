//! Block-compressed stream framing for partition files.
//!
//! A partition file is a sequence of independently LZ4-compressed blocks. The
//! [`BlockReader`] exposes the decompressed bytes as one continuous stream of
//! bytes, LEB128 varints and little-endian floats; the [`BlockWriter`] emits
//! the same framing.

pub mod options;
pub mod reader;
pub mod writer;
#[cfg(test)]
mod tests;

pub use options::{ReadOptions, WriteOptions};
pub use reader::BlockReader;
pub use writer::BlockWriter;
