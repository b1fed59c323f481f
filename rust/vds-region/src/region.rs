use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use vds_bytes::{align::align_up_u64, bits::test_bit};
use vds_common::{Result, error::Error};
use vds_types::{ArrayType, StructType};

/// A growable byte arena holding decoded values.
///
/// Values are addressed by byte offsets from the start of the region, and
/// offsets stay valid when the region grows. Everything is stored
/// little-endian. `String` and `Array` values hold the offset of their
/// out-of-line content in an 8-byte reference slot.
///
/// Only bytes below the high-water mark (`len()`) are accessible; accesses
/// beyond it are programming errors and panic.
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Backing storage. `data.len()` is the region capacity.
    data: Vec<u8>,
    end: u64,
}

impl Region {
    pub fn new() -> Region {
        Region::default()
    }

    pub fn with_capacity(capacity: usize) -> Region {
        Region {
            data: vec![0; capacity],
            end: 0,
        }
    }

    /// High-water mark: the number of bytes allocated since the last
    /// [`clear`](Self::clear).
    #[inline]
    pub fn len(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Discards all allocations. Capacity is retained.
    pub fn clear(&mut self) {
        self.end = 0;
    }

    /// Allocates `size` zeroed bytes at the next offset aligned to `alignment`
    /// and returns that offset.
    ///
    /// Growth is at least 1.5x the current capacity.
    ///
    /// # Panics
    ///
    /// Panics if the backing storage cannot grow to the new size. Use
    /// [`try_allocate`](Self::try_allocate) for sizes taken from untrusted
    /// input.
    pub fn allocate(&mut self, alignment: u64, size: u64) -> u64 {
        match self.try_allocate(alignment, size) {
            Ok(offset) => offset,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`allocate`](Self::allocate), but reports an unsatisfiable size
    /// as an error instead of aborting.
    pub fn try_allocate(&mut self, alignment: u64, size: u64) -> Result<u64> {
        let offset = align_up_u64(self.end, alignment);
        let new_end = offset
            .checked_add(size)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(|| Error::invalid_arg("size", format!("{size} bytes at {offset}")))?;
        if new_end > self.data.len() {
            let grown = self.data.len() + self.data.len() / 2;
            let target = grown.max(new_end);
            self.data
                .try_reserve_exact(target - self.data.len())
                .map_err(|e| Error::invalid_arg("size", format!("{size} bytes: {e}")))?;
            self.data.resize(target, 0);
        }
        self.data[offset as usize..new_end].fill(0);
        self.end = new_end as u64;
        Ok(offset)
    }

    #[inline]
    fn range(&self, offset: u64, len: u64) -> Range<usize> {
        let end = offset.checked_add(len);
        assert!(
            end.is_some_and(|end| end <= self.end),
            "region access [{offset}, +{len}) beyond end {}",
            self.end
        );
        offset as usize..(offset + len) as usize
    }

    /// Bytes `[offset, offset + len)`.
    pub fn bytes(&self, offset: u64, len: u64) -> &[u8] {
        let range = self.range(offset, len);
        &self.data[range]
    }

    pub fn bytes_mut(&mut self, offset: u64, len: u64) -> &mut [u8] {
        let range = self.range(offset, len);
        &mut self.data[range]
    }

    #[inline]
    pub fn load_u8(&self, offset: u64) -> u8 {
        self.bytes(offset, 1)[0]
    }

    #[inline]
    pub fn store_u8(&mut self, offset: u64, value: u8) {
        self.bytes_mut(offset, 1)[0] = value;
    }

    #[inline]
    pub fn load_bool(&self, offset: u64) -> bool {
        self.load_u8(offset) != 0
    }

    #[inline]
    pub fn store_bool(&mut self, offset: u64, value: bool) {
        self.store_u8(offset, value as u8);
    }

    #[inline]
    pub fn load_i32(&self, offset: u64) -> i32 {
        LittleEndian::read_i32(self.bytes(offset, 4))
    }

    #[inline]
    pub fn store_i32(&mut self, offset: u64, value: i32) {
        LittleEndian::write_i32(self.bytes_mut(offset, 4), value);
    }

    #[inline]
    pub fn load_i64(&self, offset: u64) -> i64 {
        LittleEndian::read_i64(self.bytes(offset, 8))
    }

    #[inline]
    pub fn store_i64(&mut self, offset: u64, value: i64) {
        LittleEndian::write_i64(self.bytes_mut(offset, 8), value);
    }

    #[inline]
    pub fn load_f32(&self, offset: u64) -> f32 {
        LittleEndian::read_f32(self.bytes(offset, 4))
    }

    #[inline]
    pub fn store_f32(&mut self, offset: u64, value: f32) {
        LittleEndian::write_f32(self.bytes_mut(offset, 4), value);
    }

    #[inline]
    pub fn load_f64(&self, offset: u64) -> f64 {
        LittleEndian::read_f64(self.bytes(offset, 8))
    }

    #[inline]
    pub fn store_f64(&mut self, offset: u64, value: f64) {
        LittleEndian::write_f64(self.bytes_mut(offset, 8), value);
    }

    /// Reads the region offset held in the reference slot at `offset`.
    #[inline]
    pub fn load_offset(&self, offset: u64) -> u64 {
        LittleEndian::read_u64(self.bytes(offset, 8))
    }

    #[inline]
    pub fn store_offset(&mut self, offset: u64, target: u64) {
        LittleEndian::write_u64(self.bytes_mut(offset, 8), target);
    }

    /// Tests bit `bit` of the bitmap starting at `offset`.
    pub fn load_bit(&self, offset: u64, bit: u64) -> bool {
        test_bit(self.bytes(offset, (bit >> 3) + 1), bit)
    }

    /// Whether field `index` of the struct at `offset` is missing. Required
    /// fields are never missing.
    pub fn is_field_missing(&self, st: &StructType, offset: u64, index: usize) -> bool {
        match st.field_missing_bit(index) {
            Some(bit) => self.load_bit(offset, bit),
            None => false,
        }
    }

    /// Whether element `index` of the array content at `array_offset` is
    /// missing. Elements of required type are never missing.
    pub fn is_element_missing(&self, at: &ArrayType, array_offset: u64, index: u64) -> bool {
        !at.element_required() && self.load_bit(array_offset + 4, index)
    }
}
