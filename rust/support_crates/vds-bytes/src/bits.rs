//! Missing-bitmap addressing.
//!
//! A missing bitmap is a run of bytes holding one bit per nullable slot, least
//! significant bit first within each byte. A set bit marks the slot as missing.

/// Number of bytes needed to hold `n` bits.
///
/// ```
/// use vds_bytes::bits::bitmap_bytes;
///
/// assert_eq!(bitmap_bytes(0), 0);
/// assert_eq!(bitmap_bytes(1), 1);
/// assert_eq!(bitmap_bytes(8), 1);
/// assert_eq!(bitmap_bytes(9), 2);
/// ```
#[inline]
pub fn bitmap_bytes(n: u64) -> u64 {
    (n + 7) >> 3
}

/// Reads bit `i` of `bitmap`.
///
/// # Panics
///
/// Panics if the bitmap is shorter than `bitmap_bytes(i + 1)`.
#[inline]
pub fn test_bit(bitmap: &[u8], i: u64) -> bool {
    (bitmap[(i >> 3) as usize] & (1 << (i & 7))) != 0
}

/// Sets or clears bit `i` of `bitmap`.
#[inline]
pub fn put_bit(bitmap: &mut [u8], i: u64, value: bool) {
    let byte = &mut bitmap[(i >> 3) as usize];
    let mask = 1u8 << (i & 7);
    if value {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}
