use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use vds_common::{Result, error::Error};

use crate::options::WriteOptions;

/// Writes the block framing read by [`BlockReader`](crate::BlockReader).
///
/// Data is buffered until `block_size` bytes accumulate, then compressed as one
/// LZ4 block. Values may straddle block boundaries.
pub struct BlockWriter<W: Write> {
    output: W,
    block_size: usize,
    buf: Vec<u8>,
    comp: Vec<u8>,
    blocks_written: u64,
    bytes_written: u64,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(output: W, options: &WriteOptions) -> Result<BlockWriter<W>> {
        options.validate()?;
        let max_compressed_len = lz4::block::compress_bound(options.block_size)
            .map_err(|e| Error::io("LZ4 compress bound", e))?;
        Ok(BlockWriter {
            output,
            block_size: options.block_size,
            buf: Vec::with_capacity(options.block_size),
            comp: vec![0; max_compressed_len],
            blocks_written: 0,
            bytes_written: 0,
        })
    }

    /// Number of blocks emitted so far.
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Number of encoded bytes written so far, including buffered ones.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(value as u8)
    }

    /// Writes the bit pattern of `value` as an unsigned LEB128 varint.
    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_varint(value as u32 as u64)
    }

    /// Writes the bit pattern of `value` as an unsigned LEB128 varint.
    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.write_varint(value as u64)
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.write_bytes(&b)
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, value);
        self.write_bytes(&b)
    }

    pub fn write_bytes(&mut self, mut data: &[u8]) -> Result<()> {
        self.bytes_written += data.len() as u64;
        while !data.is_empty() {
            let n = (self.block_size - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..n]);
            data = &data[n..];
            if self.buf.len() == self.block_size {
                self.flush_block()?;
            }
        }
        Ok(())
    }

    /// Compresses and emits the buffered bytes as one block. Does nothing when
    /// the buffer is empty.
    pub fn flush_block(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let comp_len = lz4::block::compress_to_buffer(
            &self.buf,
            Some(lz4::block::CompressionMode::FAST(1)),
            false,
            &mut self.comp,
        )
        .map_err(|e| Error::io("Failed to compress block with LZ4", e))?;

        self.output
            .write_i32::<LittleEndian>(comp_len as i32)
            .and_then(|_| self.output.write_i32::<LittleEndian>(self.buf.len() as i32))
            .and_then(|_| self.output.write_all(&self.comp[..comp_len]))
            .map_err(|e| Error::io("block output", e))?;
        self.blocks_written += 1;
        self.buf.clear();
        Ok(())
    }

    /// Flushes the last partial block and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.flush_block()?;
        self.output
            .flush()
            .map_err(|e| Error::io("block output", e))?;
        Ok(self.output)
    }

    fn write_varint(&mut self, mut value: u64) -> Result<()> {
        let mut b = [0u8; 10];
        let mut n = 0;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                b[n] = byte;
                n += 1;
                break;
            }
            b[n] = byte | 0x80;
            n += 1;
        }
        self.write_bytes(&b[..n])
    }
}
