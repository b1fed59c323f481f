//! # VDS: Variant Dataset Reader
//!
//! Reads partitioned matrix tables of genomic variant data: rows keyed by
//! variant, columns keyed by sample, with a genotype entry per cell. A table
//! on disk is a metadata document holding the schema and the partition count,
//! plus one LZ4 block-compressed file per partition.
//!
//! ## Module Organization
//!
//! * [`types`] - The type system: interned type definitions, the textual type
//!   grammar, physical layouts and the matrix table schema
//! * [`region`] - Byte arenas holding decoded values, and typed views over them
//! * [`io`] - Block-framed LZ4 streams and their primitive encodings
//! * [`table`] - Table metadata, the row decoder and encoder, and row iteration
//! * [`common`] - Errors and shared macros
//!
//! The [`support`] module contains the low level [`support::bytes`] utilities
//! for alignment and bitmaps.
//!
//! ## Reading a Table
//!
//! ```no_run
//! use vds::table::MatrixTable;
//!
//! # fn main() -> vds::common::Result<()> {
//! let table = MatrixTable::open("/data/sample.vds")?;
//! let mut rows = table.iter()?;
//! while rows.has_next() {
//!     let row = rows.next_row()?;
//!     let locus = row.field("pk")?;
//!     println!("{:?}", locus.map(|l| l.to_value()).transpose()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Each row view borrows the iterator's region and is invalidated by the next
//! call to `next_row`. Use [`table::MatrixTableIterator::into_values`] to get
//! owned values instead.

pub use vds_common as common;
pub use vds_io as io;
pub use vds_region as region;
pub use vds_table as table;
pub use vds_types as types;

pub mod support {
    pub use vds_bytes as bytes;
}
