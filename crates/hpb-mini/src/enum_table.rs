//! Closed-enum value sets.

use hpb_arena::Arena;

use crate::base92::{from_base92, get_varint, index_of};
use crate::error::MiniTableError;
use crate::wire::{value, version};

/// Values above this may start the sparse list.
const DENSE_CUTOFF: u32 = 512;

/// Membership test for the values of a closed enum.
///
/// Values below [`mask_limit`](Self::mask_limit) are kept in a bitmask of
/// 32-bit words; the rest, once the mask would get too sparse, go to an
/// ascending list searched by bisection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiniTableEnum {
    mask: Vec<u32>,
    values: Vec<u32>,
}

impl MiniTableEnum {
    /// Compile an enum descriptor. A leading `'!'` is optional.
    pub fn build(data: &[u8], arena: &Arena) -> Result<Self, MiniTableError> {
        let body = match data.split_first() {
            Some((&version::ENUM, body)) => body,
            _ => data,
        };
        let mut table = Self {
            mask: arena.alloc_vec(2)?,
            values: Vec::new(),
        };
        table.mask.extend([0, 0]);

        let mut count: u32 = 0;
        let mut base: u32 = 0;
        let mut pos = 0;
        while pos < body.len() {
            let ch = body[pos];
            pos += 1;
            if ch <= value::MAX_ENUM_MASK {
                if from_base92(ch).is_none() {
                    return Err(MiniTableError::InvalidChar { found: ch as char });
                }
                let mut bits = index_of(ch);
                for _ in 0..5 {
                    if bits & 1 != 0 {
                        count += 1;
                        table.push(base, count, arena)?;
                    }
                    bits >>= 1;
                    base = base.wrapping_add(1);
                }
            } else if (value::MIN_SKIP..=value::MAX_SKIP).contains(&ch) {
                let skip = get_varint(body, &mut pos, ch, value::MIN_SKIP, value::MAX_SKIP)
                    .ok_or(MiniTableError::OverlongVarint)?;
                base = base.wrapping_add(skip);
            } else {
                return Err(MiniTableError::InvalidChar { found: ch as char });
            }
        }
        Ok(table)
    }

    fn push(&mut self, val: u32, count: u32, arena: &Arena) -> Result<(), MiniTableError> {
        if !self.values.is_empty() || (val > DENSE_CUTOFF && count < val / 32) {
            if self.values.is_empty() {
                self.values = arena.alloc_vec(4)?;
            }
            self.values.push(val);
            return Ok(());
        }
        let words = (val / 32) as usize + 1;
        if self.mask.len() < words {
            self.mask.resize(words, 0);
        }
        self.mask[val as usize / 32] |= 1 << (val % 32);
        Ok(())
    }

    /// Whether `val` is a declared value.
    pub fn check_value(&self, val: u32) -> bool {
        if val < self.mask_limit() && self.mask[val as usize / 32] & (1 << (val % 32)) != 0 {
            return true;
        }
        // The last mask word can overlap the start of the sparse list.
        self.values.binary_search(&val).is_ok()
    }

    /// Upper bound (exclusive) of the bitmask part.
    pub fn mask_limit(&self) -> u32 {
        self.mask.len() as u32 * 32
    }

    /// Number of values in the sparse list.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}
