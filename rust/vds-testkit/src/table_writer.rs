//! Writes complete tables to disk using the reference encoder.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, write::GzEncoder};
use vds_io::{BlockWriter, WriteOptions};
use vds_region::Value;
use vds_table::{
    encoder::encode,
    layout::{PartitionLayout, PartsDirLayout},
    metadata::{METADATA_FILE, METADATA_GZ_FILE, TableMetadata},
};
use vds_types::{TypeId, TypeRegistry};

/// Writes the metadata and partition files of one table under `root`.
pub struct TableWriter {
    root: PathBuf,
    metadata: TableMetadata,
    registry: TypeRegistry,
    row_type: TypeId,
    options: WriteOptions,
    gzip_metadata: bool,
}

impl TableWriter {
    pub fn new(root: impl Into<PathBuf>, metadata: TableMetadata) -> anyhow::Result<TableWriter> {
        let mut registry = TypeRegistry::new();
        let schema = metadata.resolve_schema(&mut registry)?;
        Ok(TableWriter {
            root: root.into(),
            metadata,
            registry,
            row_type: schema.row_impl(),
            options: WriteOptions::default(),
            gzip_metadata: true,
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.options.block_size = block_size;
        self
    }

    /// Writes `metadata.json.gz` (the default) or plain `metadata.json`.
    pub fn with_gzip_metadata(mut self, gzip: bool) -> Self {
        self.gzip_metadata = gzip;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_path(&self, index: usize) -> PathBuf {
        PartsDirLayout.partition_path(&self.root, index, self.metadata.n_partitions)
    }

    pub fn write_metadata(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let json = self.metadata.to_json()?;
        if self.gzip_metadata {
            let file = File::create(self.root.join(METADATA_GZ_FILE))?;
            let mut gz = GzEncoder::new(file, Compression::default());
            gz.write_all(json.as_bytes())?;
            gz.finish()?;
        } else {
            std::fs::write(self.root.join(METADATA_FILE), json)?;
        }
        Ok(())
    }

    /// Encodes `rows` as partition `index`, each row preceded by a continuation
    /// flag and the partition terminated by a zero flag.
    pub fn write_partition(&self, index: usize, rows: &[Value]) -> anyhow::Result<()> {
        let bytes = self.encode_partition(rows)?;
        self.write_raw_partition(index, &bytes)
    }

    /// The framed bytes of a partition holding `rows`.
    pub fn encode_partition(&self, rows: &[Value]) -> anyhow::Result<Vec<u8>> {
        let mut writer = BlockWriter::new(Vec::new(), &self.options)?;
        for row in rows {
            writer.write_byte(1)?;
            encode(&mut writer, &self.registry, self.row_type, row)?;
        }
        writer.write_byte(0)?;
        Ok(writer.finish()?)
    }

    /// Writes `bytes` verbatim as the file of partition `index`.
    pub fn write_raw_partition(&self, index: usize, bytes: &[u8]) -> anyhow::Result<()> {
        let path = self.partition_path(index);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = BufWriter::new(File::create(&path)?);
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}

/// Writes a table with one partition per entry of `partitions` into a new
/// temporary directory.
pub fn write_temp_table(
    metadata: &TableMetadata,
    partitions: &[Vec<Value>],
) -> anyhow::Result<tempfile::TempDir> {
    anyhow::ensure!(
        metadata.n_partitions == partitions.len(),
        "{} partitions supplied for a table of {}",
        partitions.len(),
        metadata.n_partitions
    );
    let dir = tempfile::tempdir()?;
    let writer = TableWriter::new(dir.path(), metadata.clone())?;
    writer.write_metadata()?;
    for (i, rows) in partitions.iter().enumerate() {
        writer.write_partition(i, rows)?;
    }
    Ok(dir)
}
