//! Deterministic map ordering for serialization.
//!
//! A [`MapSorter`] keeps one shared stack of table slots. Each
//! [`push_map`](MapSorter::push_map) appends the occupied slots of a map
//! and sorts that segment by key; [`pop_map`](MapSorter::pop_map) drops
//! it again, so nested maps can be sorted while an outer map is still
//! being walked.

use std::cmp::Ordering;

use hpb_arena::ArenaError;
use hpb_core::FieldType;

use crate::map::Map;

/// One sorted segment of a [`MapSorter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortedMap {
    start: usize,
    pos: usize,
    end: usize,
}

impl SortedMap {
    /// Entries not yet returned by [`MapSorter::next`].
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }
}

/// Shared scratch space for sorting map entries.
#[derive(Debug, Default)]
pub struct MapSorter {
    entries: Vec<usize>,
}

/// Decode a fixed-width little-endian key into a signed or unsigned
/// 64-bit integer.
fn key_word(raw: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    let n = raw.len().min(8);
    word[..n].copy_from_slice(&raw[..n]);
    u64::from_le_bytes(word)
}

fn compare_keys(key_type: FieldType, a: &[u8], b: &[u8]) -> Ordering {
    match key_type {
        FieldType::Int32
        | FieldType::SInt32
        | FieldType::SFixed32
        | FieldType::Enum => (key_word(a) as u32 as i32).cmp(&(key_word(b) as u32 as i32)),
        FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
            (key_word(a) as i64).cmp(&(key_word(b) as i64))
        }
        FieldType::UInt32 | FieldType::Fixed32 => {
            (key_word(a) as u32).cmp(&(key_word(b) as u32))
        }
        FieldType::UInt64 | FieldType::Fixed64 | FieldType::Bool => {
            key_word(a).cmp(&key_word(b))
        }
        // Strings, bytes and anything that cannot be a map key.
        _ => a.cmp(b),
    }
}

impl MapSorter {
    /// Create an empty sorter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total slots currently held across all pushed segments.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Push the entries of `map`, sorted by key as `key_type` orders them.
    pub fn push_map(&mut self, key_type: FieldType, map: &Map) -> Result<SortedMap, ArenaError> {
        let start = self.entries.len();
        let count = map.size();
        self.entries
            .try_reserve(count)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: count * std::mem::size_of::<usize>(),
            })?;
        self.entries.extend(map.table().occupied_slots());
        let key_of = |slot: usize| map.table().entry_at(slot as isize).map_or(&[][..], |(k, _)| k);
        self.entries[start..].sort_by(|&a, &b| compare_keys(key_type, key_of(a), key_of(b)));
        let end = self.entries.len();
        Ok(SortedMap {
            start,
            pos: start,
            end,
        })
    }

    /// Next entry of `sorted` in key order.
    pub fn next(
        &self,
        map: &Map,
        sorted: &mut SortedMap,
    ) -> Option<(hpb_core::MessageValue, hpb_core::MessageValue)> {
        if sorted.pos == sorted.end {
            return None;
        }
        let slot = self.entries[sorted.pos];
        sorted.pos += 1;
        let (raw, val) = map.entry_at_slot(slot)?;
        Some((map.decode_key(raw), val))
    }

    /// Release the segment pushed by the matching [`push_map`](Self::push_map).
    pub fn pop_map(&mut self, sorted: SortedMap) {
        debug_assert_eq!(sorted.end, self.entries.len(), "pop out of push order");
        self.entries.truncate(sorted.start);
    }
}
