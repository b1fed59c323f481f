/// Rounds `n` up to the next multiple of `alignment`, a power of two.
///
/// ```
/// use vds_bytes::align::align_up_u64;
///
/// // A 12-byte Locus followed by an 8-aligned Int64 field.
/// assert_eq!(align_up_u64(12, 8), 16);
/// assert_eq!(align_up_u64(16, 8), 16);
/// assert_eq!(align_up_u64(3, 1), 3);
/// ```
#[inline]
pub fn align_up_u64(n: u64, alignment: u64) -> u64 {
    debug_assert!(is_valid_alignment(alignment), "bad alignment {alignment}");
    let mask = alignment - 1;
    (n + mask) & !mask
}

/// Whether `n` is a multiple of `alignment`, a power of two.
#[inline]
pub fn is_aligned_u64(n: u64, alignment: u64) -> bool {
    debug_assert!(is_valid_alignment(alignment), "bad alignment {alignment}");
    n & (alignment - 1) == 0
}

/// Layout alignments are non-zero powers of two.
#[inline]
pub fn is_valid_alignment(alignment: u64) -> bool {
    alignment.is_power_of_two()
}
