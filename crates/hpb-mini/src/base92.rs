//! The base92 alphabet used by mini descriptors.
//!
//! The alphabet is printable ASCII (`' '..='~'`) minus `"`, `'` and `\`,
//! so an encoded descriptor can be embedded in a C or Rust string literal
//! without escaping.

/// Index to character.
const TO_BASE92: [u8; 92] = *b" !#$%&()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Character (offset by `' '`) to index; `-1` marks the excluded characters.
const FROM_BASE92: [i8; 95] = {
    let mut table = [-1i8; 95];
    let mut i = 0;
    while i < TO_BASE92.len() {
        table[(TO_BASE92[i] - b' ') as usize] = i as i8;
        i += 1;
    }
    table
};

/// Character for `index`, which must be below 92.
#[inline]
pub const fn to_base92(index: u8) -> u8 {
    TO_BASE92[index as usize]
}

/// Index of `ch`, or `None` if `ch` is not in the alphabet.
#[inline]
pub const fn from_base92(ch: u8) -> Option<u8> {
    if ch < b' ' || ch > b'~' {
        return None;
    }
    let v = FROM_BASE92[(ch - b' ') as usize];
    if v < 0 {
        None
    } else {
        Some(v as u8)
    }
}

/// Index of a character known to be in the alphabet.
#[inline]
pub(crate) const fn index_of(ch: u8) -> u32 {
    match from_base92(ch) {
        Some(v) => v as u32,
        None => 0,
    }
}

/// `ceil(log2(x))` with `log2_ceiling(0) == log2_ceiling(1) == 0`.
#[inline]
pub(crate) const fn log2_ceiling(x: u32) -> u32 {
    if x <= 1 {
        0
    } else {
        32 - (x - 1).leading_zeros()
    }
}

/// Bits carried by each character of a varint over `min..=max` when
/// encoding.
#[inline]
pub(crate) const fn encode_bits(min: u8, max: u8) -> u32 {
    log2_ceiling(index_of(max) - index_of(min) + 1)
}

/// Bits carried by each character of a varint over `min..=max` when
/// decoding.
#[inline]
pub(crate) const fn decode_bits(min: u8, max: u8) -> u32 {
    log2_ceiling(index_of(max) - index_of(min))
}

/// Append `val` as a little-endian varint over the character range
/// `min..=max`. At least one character is always written.
pub(crate) fn put_varint(out: &mut Vec<u8>, mut val: u32, min: u8, max: u8) {
    let shift = encode_bits(min, max);
    debug_assert!(shift <= 6);
    let mask = (1u32 << shift) - 1;
    loop {
        let bits = val & mask;
        out.push(to_base92((bits + index_of(min)) as u8));
        val >>= shift;
        if val == 0 {
            break;
        }
    }
}

/// Decode a varint whose first character `first` has already been
/// consumed. Continuation characters are taken from `data[*pos..]` while
/// they stay inside `min..=max`.
///
/// Returns `None` if the value overflows 32 bits.
pub(crate) fn get_varint(data: &[u8], pos: &mut usize, first: u8, min: u8, max: u8) -> Option<u32> {
    let bits_per_char = decode_bits(min, max);
    let mut val: u32 = 0;
    let mut shift: u32 = 0;
    let mut ch = first;
    loop {
        let bits = index_of(ch).wrapping_sub(index_of(min));
        val |= bits.checked_shl(shift).unwrap_or(0);
        match data.get(*pos) {
            Some(&next) if (min..=max).contains(&next) => {
                ch = next;
                *pos += 1;
                shift += bits_per_char;
                if shift >= 32 {
                    return None;
                }
            }
            _ => return Some(val),
        }
    }
}
