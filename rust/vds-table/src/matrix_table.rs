use std::path::{Path, PathBuf};

use vds_common::Result;
use vds_io::ReadOptions;
use vds_types::{MatrixTableSchema, Ty, TypeRegistry};

use crate::{
    iterator::MatrixTableIterator,
    layout::{PartitionLayout, PartsDirLayout},
    metadata::TableMetadata,
};

/// A partitioned matrix table on disk.
///
/// The table owns the type registry its schema was resolved into. Opening the
/// table reads only the metadata; partition files are opened lazily by each
/// iterator. Any number of iterators may run concurrently over one table, each
/// with its own region and block reader.
pub struct MatrixTable {
    root: PathBuf,
    registry: TypeRegistry,
    schema: MatrixTableSchema,
    n_partitions: usize,
    options: ReadOptions,
    layout: Box<dyn PartitionLayout>,
}

/// Totals accumulated over a full scan of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub rows: u64,
    /// Sum over rows of the region bytes each decoded row occupied.
    pub region_bytes: u64,
}

impl MatrixTable {
    /// Opens the table at `root` with default options.
    pub fn open(root: impl AsRef<Path>) -> Result<MatrixTable> {
        Self::open_with_options(root, ReadOptions::default(), TypeRegistry::new())
    }

    /// Opens the table at `root`, resolving its schema into `registry`.
    pub fn open_with_options(
        root: impl AsRef<Path>,
        options: ReadOptions,
        registry: TypeRegistry,
    ) -> Result<MatrixTable> {
        let root = root.as_ref();
        let metadata = TableMetadata::load(root)?;
        Self::from_metadata(root, &metadata, registry, options)
    }

    /// Builds a table over the partition files under `root` from already
    /// loaded metadata.
    pub fn from_metadata(
        root: impl Into<PathBuf>,
        metadata: &TableMetadata,
        mut registry: TypeRegistry,
        options: ReadOptions,
    ) -> Result<MatrixTable> {
        options.validate()?;
        let root = root.into();
        let schema = metadata.resolve_schema(&mut registry)?;
        log::info!(
            "opened matrix table {}: {} partitions, row type {}",
            root.display(),
            metadata.n_partitions,
            registry.ty(schema.row_impl())
        );
        Ok(MatrixTable {
            root,
            registry,
            schema,
            n_partitions: metadata.n_partitions,
            options,
            layout: Box::new(PartsDirLayout),
        })
    }

    /// Replaces the partition file layout.
    pub fn with_layout(mut self, layout: impl PartitionLayout + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn schema(&self) -> &MatrixTableSchema {
        &self.schema
    }

    pub fn n_partitions(&self) -> usize {
        self.n_partitions
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// The logical type of the rows returned by iterators.
    pub fn row_type(&self) -> Ty<'_> {
        self.registry.ty(self.schema.row_impl())
    }

    pub fn partition_path(&self, index: usize) -> PathBuf {
        self.layout.partition_path(&self.root, index, self.n_partitions)
    }

    /// Starts a scan over all rows of all partitions, in order.
    pub fn iter(&self) -> Result<MatrixTableIterator<'_>> {
        MatrixTableIterator::new(self)
    }

    pub fn count_rows(&self) -> Result<u64> {
        let mut it = self.iter()?;
        let mut rows = 0;
        while it.has_next() {
            it.next_row()?;
            rows += 1;
        }
        Ok(rows)
    }

    /// Scans the table, accumulating the row count and the region footprint of
    /// every row.
    pub fn scan_stats(&self) -> Result<ScanStats> {
        let mut it = self.iter()?;
        let mut stats = ScanStats::default();
        while it.has_next() {
            let row = it.next_row()?;
            stats.rows += 1;
            stats.region_bytes += row.region().len();
        }
        Ok(stats)
    }
}

impl std::fmt::Debug for MatrixTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixTable")
            .field("root", &self.root)
            .field("n_partitions", &self.n_partitions)
            .field("row_type", &self.row_type())
            .finish()
    }
}
