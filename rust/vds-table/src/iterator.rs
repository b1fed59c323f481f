use std::{fs::File, io::BufReader};

use vds_common::{Result, error::Error, try_or_ret_some_err};
use vds_io::BlockReader;
use vds_region::{Region, TypedRegionValue, Value};

use crate::{decoder, matrix_table::MatrixTable};

/// Sequential row scan over the partitions of a [`MatrixTable`].
///
/// Each partition stream is a sequence of rows, each preceded by a one-byte
/// continuation flag; a zero flag ends the partition. The iterator is either
/// positioned at the start of a row of partition `partition()`, or exhausted
/// once the partition index reaches the partition count.
///
/// Rows are decoded into a region owned by the iterator, which is cleared
/// before each row. The row view returned by [`next_row`](Self::next_row)
/// therefore borrows the iterator and cannot outlive the next call.
pub struct MatrixTableIterator<'a> {
    table: &'a MatrixTable,
    region: Region,
    part: usize,
    reader: Option<BlockReader<BufReader<File>>>,
    rows_read: u64,
}

impl<'a> MatrixTableIterator<'a> {
    pub(crate) fn new(table: &'a MatrixTable) -> Result<MatrixTableIterator<'a>> {
        let mut it = MatrixTableIterator {
            table,
            region: Region::with_capacity(table.options().initial_region_capacity),
            part: 0,
            reader: None,
            rows_read: 0,
        };
        if it.has_next() {
            it.start_part()?;
            it.advance()?;
        }
        Ok(it)
    }

    pub fn has_next(&self) -> bool {
        self.part < self.table.n_partitions()
    }

    /// Index of the partition the next row comes from.
    pub fn partition(&self) -> usize {
        self.part
    }

    /// Number of rows decoded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Decodes the next row and returns a view of it, typed with the table's
    /// row type.
    ///
    /// Any error leaves the iterator exhausted.
    pub fn next_row(&mut self) -> Result<TypedRegionValue<'_>> {
        if !self.has_next() {
            return Err(Error::invalid_operation("next_row on exhausted iterator"));
        }
        match self.decode_row() {
            Ok(offset) => {
                let ty = self.table.row_type();
                Ok(TypedRegionValue::new(&self.region, offset, ty))
            }
            Err(e) => {
                self.exhaust();
                Err(e)
            }
        }
    }

    /// Turns the scan into a standard iterator over owned row values.
    pub fn into_values(self) -> RowValues<'a> {
        RowValues { inner: self }
    }

    fn decode_row(&mut self) -> Result<u64> {
        self.region.clear();
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("no open partition"))?;
        let offset = decoder::decode(
            reader,
            &mut self.region,
            self.table.registry(),
            self.table.schema().row_impl(),
        )?;
        self.rows_read += 1;
        self.advance()?;
        Ok(offset)
    }

    fn start_part(&mut self) -> Result<()> {
        let path = self.table.partition_path(self.part);
        log::debug!("opening partition {} at {}", self.part, path.display());
        self.reader = Some(BlockReader::open(&path, self.table.options())?);
        Ok(())
    }

    /// Consumes continuation flags until positioned at a row or past the last
    /// partition. Empty partitions are skipped.
    fn advance(&mut self) -> Result<()> {
        let n_partitions = self.table.n_partitions();
        let mut more = self.read_continuation()?;
        while !more && self.part < n_partitions {
            self.part += 1;
            if self.part < n_partitions {
                self.start_part()?;
                more = self.read_continuation()?;
            } else {
                self.reader = None;
            }
        }
        Ok(())
    }

    fn read_continuation(&mut self) -> Result<bool> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("no open partition"))?;
        let flag = reader.read_byte()?;
        if flag > 1 {
            log::warn!(
                "{}: continuation flag {flag} at byte {}, treating as 1",
                reader.name(),
                reader.bytes_consumed() - 1
            );
        }
        Ok(flag != 0)
    }

    fn exhaust(&mut self) {
        self.part = self.table.n_partitions();
        self.reader = None;
    }
}

impl std::fmt::Debug for MatrixTableIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixTableIterator")
            .field("root", &self.table.root())
            .field("part", &self.part)
            .field("rows_read", &self.rows_read)
            .field("region_len", &self.region.len())
            .finish()
    }
}

/// Owned row values of a scan, see [`MatrixTableIterator::into_values`].
pub struct RowValues<'a> {
    inner: MatrixTableIterator<'a>,
}

impl Iterator for RowValues<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.inner.has_next() {
            return None;
        }
        let row = try_or_ret_some_err!(self.inner.next_row());
        Some(row.to_value())
    }
}
