//! Leading-zero-bit difficulty predicate.

/// Whether the first `bits` bits of `digest` (most significant bit first) are all zero.
///
/// `bits == 0` always holds. A difficulty longer than the digest can never be
/// met and yields `false`.
pub fn meets_leading_zero_bits(digest: &[u8], bits: u32) -> bool {
    let full = (bits / 8) as usize;
    let rem = bits % 8;
    if full > digest.len() || (full == digest.len() && rem != 0) {
        return false;
    }
    if digest[..full].iter().any(|b| *b != 0) {
        return false;
    }
    rem == 0 || digest[full] >> (8 - rem) == 0
}

/// Count the zero bits at the start of `digest`.
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in digest {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.leading_zeros();
        break;
    }
    count
}
