use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
};

use byteorder::{ByteOrder, LittleEndian};
use vds_common::{Result, error::Error};

use crate::options::ReadOptions;

/// Size of the `[compressed length][decompressed length]` block header.
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Reads a stream of independently LZ4-compressed blocks as one continuous
/// byte sequence.
///
/// Each block on disk is framed as:
///
/// ```text
/// [ L: i32 LE ][ D: i32 LE ][ L bytes of LZ4 block data decompressing to D bytes ]
/// ```
///
/// All reads transparently cross block boundaries. Integers are unsigned
/// LEB128 varints whose bit pattern is reinterpreted as signed; floats are
/// fixed-width little-endian.
pub struct BlockReader<R> {
    input: R,
    name: String,
    block_size: usize,
    max_compressed_len: usize,
    max_value_bytes: u64,
    /// Decompressed data of the current block, `block_size` long.
    buf: Vec<u8>,
    comp: Vec<u8>,
    off: usize,
    end: usize,
    /// Input position of the next block header.
    input_pos: u64,
    /// Input position of the current block's header.
    block_pos: u64,
    blocks_read: u64,
    /// Decompressed bytes in blocks before the current one.
    consumed_before_block: u64,
}

impl BlockReader<BufReader<File>> {
    /// Opens the file at `path` for block reading. The path labels every
    /// framing error.
    pub fn open(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        Ok(BlockReader::new(BufReader::new(file), options)?.with_name(path.display().to_string()))
    }
}

impl<R: Read> BlockReader<R> {
    pub fn new(input: R, options: &ReadOptions) -> Result<BlockReader<R>> {
        options.validate()?;
        let max_compressed_len = lz4::block::compress_bound(options.block_size)
            .map_err(|e| Error::io("LZ4 compress bound", e))?;
        Ok(BlockReader {
            input,
            name: String::new(),
            block_size: options.block_size,
            max_compressed_len,
            max_value_bytes: options.max_value_bytes,
            buf: vec![0; options.block_size],
            comp: vec![0; max_compressed_len],
            off: 0,
            end: 0,
            input_pos: 0,
            block_pos: 0,
            blocks_read: 0,
            consumed_before_block: 0,
        })
    }

    /// Sets the stream name used in error reports.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of block headers read so far, including empty blocks.
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Number of decompressed bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed_before_block + self.off as u64
    }

    /// Region bytes one value decoded from this stream may occupy.
    pub fn max_value_bytes(&self) -> u64 {
        self.max_value_bytes
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.ensure_block()?;
        let b = self.buf[self.off];
        self.off += 1;
        Ok(b)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_float(&mut self) -> Result<f32> {
        let mut b = [0u8; 4];
        self.read_bytes(&mut b)?;
        Ok(LittleEndian::read_f32(&b))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.read_bytes(&mut b)?;
        Ok(LittleEndian::read_f64(&b))
    }

    /// Reads an unsigned LEB128 varint of at most 5 bytes and reinterprets its
    /// low 32 bits as `i32`. Bits beyond the 32nd are discarded.
    pub fn read_int(&mut self) -> Result<i32> {
        Ok(self.read_varint(5)? as u32 as i32)
    }

    /// Reads an unsigned LEB128 varint of at most 10 bytes and reinterprets it
    /// as `i64`.
    pub fn read_long(&mut self) -> Result<i64> {
        Ok(self.read_varint(10)? as i64)
    }

    /// Fills `dst` from the stream, crossing block boundaries as needed.
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut pos = 0;
        while pos < dst.len() {
            self.ensure_block()?;
            let n = (self.end - self.off).min(dst.len() - pos);
            dst[pos..pos + n].copy_from_slice(&self.buf[self.off..self.off + n]);
            self.off += n;
            pos += n;
        }
        Ok(())
    }

    fn read_varint(&mut self, max_len: u32) -> Result<u64> {
        // Fast path: the whole varint is known to be in the current block.
        if self.end - self.off >= max_len as usize {
            let mut x = 0u64;
            for i in 0..max_len {
                let b = self.buf[self.off + i as usize];
                x |= ((b & 0x7f) as u64) << (7 * i);
                if b & 0x80 == 0 {
                    self.off += i as usize + 1;
                    return Ok(x);
                }
            }
            return Err(self.corrupt(format!("varint longer than {max_len} bytes")));
        }

        let mut x = 0u64;
        for i in 0..max_len {
            let b = self.read_byte()?;
            x |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(x);
            }
        }
        Err(self.corrupt(format!("varint longer than {max_len} bytes")))
    }

    #[inline]
    fn ensure_block(&mut self) -> Result<()> {
        if self.off == self.end {
            self.read_block()?;
        }
        Ok(())
    }

    /// Reads the next non-empty block. Must only be called once the current
    /// block is fully consumed.
    fn read_block(&mut self) -> Result<()> {
        debug_assert_eq!(self.off, self.end);
        self.consumed_before_block += self.end as u64;
        self.off = 0;
        self.end = 0;

        loop {
            let header_pos = self.input_pos;
            self.block_pos = header_pos;

            let mut header = [0u8; BLOCK_HEADER_SIZE];
            self.input
                .read_exact(&mut header)
                .map_err(|e| self.input_error(e, "block header"))?;
            let comp_len = LittleEndian::read_i32(&header[..4]);
            let decomp_len = LittleEndian::read_i32(&header[4..]);
            if comp_len < 0 || decomp_len < 0 {
                return Err(self.corrupt(format!(
                    "negative block length (compressed {comp_len}, decompressed {decomp_len})"
                )));
            }
            let (comp_len, decomp_len) = (comp_len as usize, decomp_len as usize);
            if decomp_len > self.block_size {
                return Err(self.corrupt(format!(
                    "decompressed length {decomp_len} exceeds block size {}",
                    self.block_size
                )));
            }
            if comp_len > self.max_compressed_len {
                return Err(self.corrupt(format!(
                    "compressed length {comp_len} exceeds bound {}",
                    self.max_compressed_len
                )));
            }

            self.input
                .read_exact(&mut self.comp[..comp_len])
                .map_err(|e| self.input_error(e, "block data"))?;
            self.input_pos += (BLOCK_HEADER_SIZE + comp_len) as u64;
            self.blocks_read += 1;
            log::trace!(
                "{}: block {} at {header_pos}: {comp_len} -> {decomp_len} bytes",
                self.name,
                self.blocks_read - 1
            );

            if decomp_len == 0 {
                continue;
            }

            let n = lz4::block::decompress_to_buffer(
                &self.comp[..comp_len],
                Some(decomp_len as i32),
                &mut self.buf,
            )
            .map_err(|e| self.corrupt(format!("LZ4 decompression failed: {e}")))?;
            if n != decomp_len {
                return Err(self.corrupt(format!(
                    "block decompressed to {n} bytes, header declares {decomp_len}"
                )));
            }
            self.end = n;
            return Ok(());
        }
    }

    /// A framing error located at the header of the current block.
    pub fn corrupt(&self, message: impl Into<String>) -> Error {
        Error::corrupt_partition(&self.name, self.block_pos, message)
    }

    fn input_error(&self, e: std::io::Error, what: &str) -> Error {
        if e.kind() == ErrorKind::UnexpectedEof {
            self.corrupt(format!("unexpected end of stream reading {what}"))
        } else {
            Error::io(&self.name, e)
        }
    }
}

impl<R> std::fmt::Debug for BlockReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockReader")
            .field("name", &self.name)
            .field("block_size", &self.block_size)
            .field("blocks_read", &self.blocks_read)
            .field("off", &self.off)
            .field("end", &self.end)
            .finish()
    }
}
