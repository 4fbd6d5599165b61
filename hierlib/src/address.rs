/// An address split into the fields a set-associative cache cares about
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecodedAddress {
    pub tag: u64,
    pub set: u64,
    pub offset: u64,
}

/// Returns a mask with the lowest `bits` bits set. Saturates at 64 bits.
#[inline(always)]
pub fn low_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Shifts right, producing 0 rather than overflowing when the shift covers the whole word
#[inline(always)]
fn shr(value: u64, bits: u32) -> u64 {
    value.checked_shr(bits).unwrap_or(0)
}

/// Shifts left, producing 0 rather than overflowing when the shift covers the whole word
#[inline(always)]
pub(crate) fn shl(value: u64, bits: u32) -> u64 {
    value.checked_shl(bits).unwrap_or(0)
}

/// Splits an address into tag, set, and offset
///
/// # Arguments
///
/// * `address`: The byte address
/// * `block_bits`: log2 of the block size in bytes
/// * `set_bits`: log2 of the number of sets
///
/// returns: DecodedAddress
///
/// # Examples
///
/// ```
/// use hierlib::address::decode;
/// let decoded = decode(0x1234, 5, 2);
/// assert_eq!(decoded.offset, 0x14);
/// assert_eq!(decoded.set, 1);
/// assert_eq!(decoded.tag, 0x1234 >> 7);
/// ```
pub fn decode(address: u64, block_bits: u32, set_bits: u32) -> DecodedAddress {
    DecodedAddress {
        tag: shr(address, block_bits + set_bits),
        set: shr(address, block_bits) & low_mask(set_bits),
        offset: address & low_mask(block_bits),
    }
}

/// The tag of an address in a fully associative structure, which has no set bits
pub fn block_number(address: u64, block_bits: u32) -> u64 {
    shr(address, block_bits)
}

/// Rebuilds the block number of a line from its tag and the set it lived in
///
/// This is the tag the same block would have in a fully associative cache with the same block
/// size
pub fn join_tag_and_set(tag: u64, set: u64, set_bits: u32) -> u64 {
    shl(tag, set_bits) | set
}

/// Rebuilds the first byte address of a block from its tag and set
pub fn block_address(tag: u64, set: u64, set_bits: u32, block_bits: u32) -> u64 {
    shl(join_tag_and_set(tag, set, set_bits), block_bits)
}
