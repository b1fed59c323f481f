//! Table metadata: the partition count and the six schema strings.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use vds_common::{Result, error::Error};
use vds_types::{MatrixTableSchema, TypeRegistry};

pub const METADATA_FILE: &str = "metadata.json";
pub const METADATA_GZ_FILE: &str = "metadata.json.gz";

/// The JSON metadata document at the root of a table directory.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub n_partitions: usize,
    pub global_schema: String,
    pub sample_schema: String,
    pub sample_annotation_schema: String,
    pub variant_schema: String,
    pub variant_annotation_schema: String,
    pub genotype_schema: String,
}

impl TableMetadata {
    /// Loads `metadata.json.gz` from `root`, falling back to `metadata.json`.
    pub fn load(root: impl AsRef<Path>) -> Result<TableMetadata> {
        let root = root.as_ref();
        let gz_path = root.join(METADATA_GZ_FILE);
        if gz_path.is_file() {
            let file = open(&gz_path)?;
            return Self::from_reader(GzDecoder::new(BufReader::new(file)), &gz_path);
        }
        let path = root.join(METADATA_FILE);
        let file = open(&path)?;
        Self::from_reader(BufReader::new(file), &path)
    }

    pub fn from_json(text: &str) -> Result<TableMetadata> {
        serde_json::from_str(text).map_err(|e| Error::metadata("metadata JSON", e))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::metadata("metadata JSON", e))
    }

    /// Parses the six schema strings into `registry` and derives the table
    /// schema.
    pub fn resolve_schema(&self, registry: &mut TypeRegistry) -> Result<MatrixTableSchema> {
        let global = registry.parse(&self.global_schema)?;
        let col_key = registry.parse(&self.sample_schema)?;
        let col = registry.parse(&self.sample_annotation_schema)?;
        let row_key = registry.parse(&self.variant_schema)?;
        let row = registry.parse(&self.variant_annotation_schema)?;
        let entry = registry.parse(&self.genotype_schema)?;
        Ok(registry.matrix_table_schema(global, col_key, col, row_key, row, entry))
    }

    fn from_reader<R: Read>(reader: R, path: &Path) -> Result<TableMetadata> {
        serde_json::from_reader(reader)
            .map_err(|e| Error::metadata(path.display().to_string(), e))
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io(path.display().to_string(), e))
}
