//! Hash functions for table keys.
//!
//! String keys use 32-bit MurmurHash2 over the raw bytes. Integer keys
//! fold the high half into the low half. Neither is cryptographically
//! secure; they only need to scatter keys across buckets.

/// MurmurHash2 multiplication constant.
const M: u32 = 0x5bd1e995;
/// MurmurHash2 shift.
const R: u32 = 24;

/// Seed used by every string table.
pub const DEFAULT_SEED: u32 = 0;

/// MurmurHash2 of `data` with the given `seed`. Blocks are read
/// little-endian so results are platform independent.
pub fn murmur_hash2(data: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ data.len() as u32;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        if tail.len() >= 3 {
            h ^= (tail[2] as u32) << 16;
        }
        if tail.len() >= 2 {
            h ^= (tail[1] as u32) << 8;
        }
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Hash of a string key with the table seed.
#[inline]
pub fn str_hash(data: &[u8]) -> u32 {
    murmur_hash2(data, DEFAULT_SEED)
}

/// Hash of an integer key.
#[inline]
pub fn int_hash(key: u64) -> u32 {
    (key as u32) ^ ((key >> 32) as u32)
}
