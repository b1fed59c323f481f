//! Reader and writer configuration.

use vds_common::{Result, verify_arg};

/// Maximum decompressed size of one block.
pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;

/// Initial capacity of the region each table iterator decodes rows into.
pub const DEFAULT_INITIAL_REGION_CAPACITY: usize = 128;

/// Upper bound on the region bytes one decoded value may occupy.
pub const DEFAULT_MAX_VALUE_BYTES: u64 = 1 << 30;

/// Configuration for reading partition streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum decompressed block size the stream was written with. Blocks
    /// declaring a larger decompressed length are rejected.
    pub block_size: usize,
    /// Initial capacity of the row region, in bytes.
    pub initial_region_capacity: usize,
    /// Region bytes one decoded value may occupy. Lengths read from the
    /// stream that would exceed it are treated as corruption.
    pub max_value_bytes: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            initial_region_capacity: DEFAULT_INITIAL_REGION_CAPACITY,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }
}

impl ReadOptions {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(block_size, self.block_size > 0);
        verify_arg!(block_size, self.block_size <= i32::MAX as usize);
        verify_arg!(max_value_bytes, self.max_value_bytes > 0);
        Ok(())
    }
}

/// Configuration for writing partition streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Maximum decompressed size of each emitted block.
    pub block_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl WriteOptions {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(block_size, self.block_size > 0);
        verify_arg!(block_size, self.block_size <= i32::MAX as usize);
        Ok(())
    }
}
