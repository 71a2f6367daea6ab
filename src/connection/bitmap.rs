//! Bitmap decoding
//!
//! Bit `n` of a bitmap value lives in byte `n / 8`, counted from the most
//! significant bit of that byte.

/// Indices of all set bits, ascending
pub fn bit_indices(bytes: &[u8]) -> Vec<u64> {
    let mut indices = Vec::new();
    for (byte_index, &byte) in bytes.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for bit in 0..8u64 {
            if byte & (0x80 >> bit) != 0 {
                indices.push(byte_index as u64 * 8 + bit);
            }
        }
    }
    indices
}

/// The (byte index, bit offset within byte) holding bit `index`
#[inline]
pub fn bit_location(index: u64) -> (u64, u8) {
    (index / 8, (index % 8) as u8)
}
