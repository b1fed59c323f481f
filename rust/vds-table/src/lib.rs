//! Reading partitioned matrix tables.
//!
//! A table directory holds a metadata document (`metadata.json.gz`) with the
//! partition count and the schema, and one block-compressed file per
//! partition. [`MatrixTable`] resolves the schema and hands out
//! [`MatrixTableIterator`]s that decode rows one at a time into a region.

pub mod decoder;
pub mod encoder;
pub mod iterator;
pub mod layout;
pub mod matrix_table;
pub mod metadata;

pub use iterator::{MatrixTableIterator, RowValues};
pub use layout::{PartitionLayout, PartsDirLayout};
pub use matrix_table::{MatrixTable, ScanStats};
pub use metadata::TableMetadata;
