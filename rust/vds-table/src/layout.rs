//! Mapping from partition index to partition file path.

use std::path::{Path, PathBuf};

/// Locates the file of each partition of a table.
pub trait PartitionLayout: Send + Sync {
    fn partition_path(&self, root: &Path, index: usize, count: usize) -> PathBuf;
}

/// The standard layout: `<root>/parts/part-<index>`, with the index
/// zero-padded to the number of decimal digits of the partition count.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartsDirLayout;

impl PartitionLayout for PartsDirLayout {
    fn partition_path(&self, root: &Path, index: usize, count: usize) -> PathBuf {
        let width = count.to_string().len();
        root.join("parts").join(format!("part-{index:0width$}"))
    }
}
