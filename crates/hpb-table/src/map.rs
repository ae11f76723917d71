//! The map-field runtime: a typed wrapper over one [`StrTable`].
//!
//! Keys are encoded to raw bytes: fixed-width keys as their
//! little-endian bytes truncated to the key width, string keys verbatim.
//! Fixed-width values are stored inline in the table's 64-bit word.
//! String values are boxed into an append-only slab owned by the map and
//! the table word holds the slab index; boxed strings are never reclaimed
//! individually, only by [`Map::clear`] or when the map is dropped.

use std::borrow::Cow;

use hpb_arena::{Arena, ArenaError};
use hpb_core::{ctype_size, CType, MessageValue, MAP_TYPE_STRING};

use crate::str_table::{StrTable, BEGIN};

/// Cursor value that starts a map iteration.
pub const MAP_BEGIN: isize = BEGIN;

/// Initial entry capacity of a new map's table.
const INITIAL_ENTRIES: usize = 4;

/// Result of [`Map::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapInsertStatus {
    /// The key was not present.
    Inserted,
    /// The key was present; the old entry was removed first.
    Replaced,
    /// Allocation failed; the map is unchanged apart from the removal of
    /// the old entry on replace.
    OutOfMemory,
}

/// A map from scalar or string keys to field values.
#[derive(Debug)]
pub struct Map {
    key_type: CType,
    value_type: CType,
    key_size: usize,
    val_size: usize,
    table: StrTable,
    strings: Vec<Box<[u8]>>,
}

impl Map {
    /// Create an empty map for the given key and value C types.
    pub fn new(arena: &Arena, key_type: CType, value_type: CType) -> Result<Self, ArenaError> {
        Ok(Self {
            key_type,
            value_type,
            key_size: ctype_size(key_type),
            val_size: ctype_size(value_type),
            table: StrTable::new(INITIAL_ENTRIES, arena)?,
            strings: Vec::new(),
        })
    }

    /// The key C type.
    pub fn key_type(&self) -> CType {
        self.key_type
    }

    /// The value C type.
    pub fn value_type(&self) -> CType {
        self.value_type
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.table.count()
    }

    fn to_key<'k>(&self, key: &'k MessageValue) -> Cow<'k, [u8]> {
        if self.key_size == MAP_TYPE_STRING {
            debug_assert!(key.as_bytes().is_some(), "non-string key for string map");
            Cow::Borrowed(key.as_bytes().unwrap_or_default())
        } else {
            let word = key.to_word().unwrap_or_default();
            Cow::Owned(word.to_le_bytes()[..self.key_size].to_vec())
        }
    }

    fn from_key(&self, raw: &[u8]) -> MessageValue {
        if self.key_size == MAP_TYPE_STRING {
            MessageValue::Str(raw.to_vec())
        } else {
            let mut word = [0u8; 8];
            word[..raw.len().min(8)].copy_from_slice(&raw[..raw.len().min(8)]);
            MessageValue::from_word(self.key_type, u64::from_le_bytes(word))
        }
    }

    fn to_value(&mut self, val: &MessageValue, arena: &Arena) -> Result<u64, ArenaError> {
        if self.val_size == MAP_TYPE_STRING {
            let boxed = arena.alloc_bytes(val.as_bytes().unwrap_or_default())?;
            self.strings
                .try_reserve(1)
                .map_err(|_| ArenaError::OutOfMemory {
                    requested: std::mem::size_of::<Box<[u8]>>(),
                })?;
            self.strings.push(boxed);
            Ok((self.strings.len() - 1) as u64)
        } else {
            Ok(val.to_word().unwrap_or_default())
        }
    }

    fn from_value(&self, word: u64) -> MessageValue {
        if self.val_size == MAP_TYPE_STRING {
            let bytes = self
                .strings
                .get(word as usize)
                .map(|b| b.to_vec())
                .unwrap_or_default();
            MessageValue::Str(bytes)
        } else {
            let mut padded = [0u8; 8];
            padded[..self.val_size].copy_from_slice(&word.to_le_bytes()[..self.val_size]);
            MessageValue::from_word(self.value_type, u64::from_le_bytes(padded))
        }
    }

    /// Look up `key`.
    pub fn get(&self, key: &MessageValue) -> Option<MessageValue> {
        let raw = self.to_key(key);
        self.table.lookup(&raw).map(|w| self.from_value(w))
    }

    /// Insert or replace `key`.
    ///
    /// Replacement removes the existing entry and inserts a fresh one, so
    /// it invalidates outstanding iterators exactly like an insert does.
    pub fn insert(
        &mut self,
        key: &MessageValue,
        val: &MessageValue,
        arena: &Arena,
    ) -> MapInsertStatus {
        let word = match self.to_value(val, arena) {
            Ok(w) => w,
            Err(_) => return MapInsertStatus::OutOfMemory,
        };
        let raw = self.to_key(key).into_owned();
        // TODO: an overwrite primitive in StrTable would save the second probe.
        let removed = self.table.remove(&raw).is_some();
        if self.table.insert(&raw, word, arena).is_err() {
            return MapInsertStatus::OutOfMemory;
        }
        if removed {
            MapInsertStatus::Replaced
        } else {
            MapInsertStatus::Inserted
        }
    }

    /// Remove `key`, returning the value it held.
    pub fn delete(&mut self, key: &MessageValue) -> Option<MessageValue> {
        let raw = self.to_key(key).into_owned();
        self.table.remove(&raw).map(|w| self.from_value(w))
    }

    /// Remove every entry and release the boxed strings.
    pub fn clear(&mut self) {
        self.table.clear();
        self.strings.clear();
    }

    /// Advance `iter` (start with [`MAP_BEGIN`]) and return the entry.
    pub fn next(&self, iter: &mut isize) -> Option<(MessageValue, MessageValue)> {
        let (k, v) = self.table.next(iter)?;
        Some((self.from_key(k), self.from_value(v)))
    }

    /// Overwrite the value under `iter` without touching the key.
    pub fn set_entry_value(
        &mut self,
        iter: isize,
        val: &MessageValue,
        arena: &Arena,
    ) -> Result<(), ArenaError> {
        let word = self.to_value(val, arena)?;
        self.table.set_entry_value(iter, word);
        Ok(())
    }

    /// Advance `iter` to the next entry. Returns `false` at the end.
    pub fn iterator_next(&self, iter: &mut isize) -> bool {
        self.table.next(iter).is_some()
    }

    /// Whether `iter` no longer points at an entry.
    ///
    /// Must not be called with [`MAP_BEGIN`].
    pub fn iterator_done(&self, iter: isize) -> bool {
        debug_assert_ne!(iter, MAP_BEGIN, "iterator_done before iterator_next");
        self.table.done(iter)
    }

    /// Key under `iter`.
    pub fn iterator_key(&self, iter: isize) -> MessageValue {
        self.from_key(self.table.iter_key(iter))
    }

    /// Value under `iter`.
    pub fn iterator_value(&self, iter: isize) -> MessageValue {
        self.from_value(self.table.iter_value(iter))
    }

    /// Iterate over decoded `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (MessageValue, MessageValue)> + '_ {
        self.table
            .iter()
            .map(|(k, v)| (self.from_key(k), self.from_value(v)))
    }

    /// Raw key and decoded value stored in table slot `slot`.
    pub(crate) fn entry_at_slot(&self, slot: usize) -> Option<(&[u8], MessageValue)> {
        let (k, v) = self.table.entry_at(slot as isize)?;
        Some((k, self.from_value(v)))
    }

    /// Decode a raw key as stored in the table.
    pub(crate) fn decode_key(&self, raw: &[u8]) -> MessageValue {
        self.from_key(raw)
    }

    pub(crate) fn table(&self) -> &StrTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_returns_inserted_string() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Int32, CType::String).unwrap();
        let key = MessageValue::Int32(0);
        let val = MessageValue::Str(b"abcde".to_vec());
        assert_eq!(map.insert(&key, &val, &arena), MapInsertStatus::Inserted);
        assert_eq!(map.delete(&key), Some(val));
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn clear_releases_string_values() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Int32, CType::String).unwrap();
        for i in 0..3 {
            let val = MessageValue::Str(format!("v{i}").into_bytes());
            map.insert(&MessageValue::Int32(i), &val, &arena);
        }
        assert_eq!(map.strings.len(), 3);
        map.clear();
        assert_eq!(map.size(), 0);
        assert!(map.strings.is_empty());

        let val = MessageValue::Str(b"again".to_vec());
        assert_eq!(map.insert(&MessageValue::Int32(7), &val, &arena), MapInsertStatus::Inserted);
        assert_eq!(map.get(&MessageValue::Int32(7)), Some(val));
        assert_eq!(map.get(&MessageValue::Int32(0)), None);
    }

    #[test]
    fn replace_reports_replaced() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::String, CType::Int64).unwrap();
        let key = MessageValue::Str(b"k".to_vec());
        assert_eq!(
            map.insert(&key, &MessageValue::Int64(1), &arena),
            MapInsertStatus::Inserted
        );
        assert_eq!(
            map.insert(&key, &MessageValue::Int64(-2), &arena),
            MapInsertStatus::Replaced
        );
        assert_eq!(map.size(), 1);
        assert_eq!(map.get(&key), Some(MessageValue::Int64(-2)));
    }

    #[test]
    fn bool_keys_use_one_byte() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Bool, CType::Float).unwrap();
        map.insert(&MessageValue::Bool(true), &MessageValue::Float(1.5), &arena);
        map.insert(&MessageValue::Bool(false), &MessageValue::Float(-1.0), &arena);
        assert_eq!(map.get(&MessageValue::Bool(true)), Some(MessageValue::Float(1.5)));
        assert_eq!(map.get(&MessageValue::Bool(false)), Some(MessageValue::Float(-1.0)));
        let raw: Vec<usize> = map.table().iter().map(|(k, _)| k.len()).collect();
        assert_eq!(raw, vec![1, 1]);
    }

    #[test]
    fn negative_int_keys_round_trip() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Int32, CType::UInt32).unwrap();
        map.insert(&MessageValue::Int32(-5), &MessageValue::UInt32(9), &arena);
        let (k, v) = map.iter().next().unwrap();
        assert_eq!(k, MessageValue::Int32(-5));
        assert_eq!(v, MessageValue::UInt32(9));
    }

    #[test]
    fn iterator_cursor_api() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::UInt64, CType::Bytes).unwrap();
        for i in 0..10u64 {
            map.insert(
                &MessageValue::UInt64(i),
                &MessageValue::Str(vec![i as u8; i as usize]),
                &arena,
            );
        }
        let mut iter = MAP_BEGIN;
        let mut seen = 0;
        while map.iterator_next(&mut iter) {
            assert!(!map.iterator_done(iter));
            let MessageValue::UInt64(k) = map.iterator_key(iter) else {
                panic!("wrong key type");
            };
            assert_eq!(
                map.iterator_value(iter),
                MessageValue::Str(vec![k as u8; k as usize])
            );
            seen += 1;
        }
        assert!(map.iterator_done(iter));
        assert_eq!(seen, 10);
    }

    #[test]
    fn set_entry_value_keeps_key() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Int32, CType::String).unwrap();
        map.insert(&MessageValue::Int32(1), &MessageValue::Str(b"a".to_vec()), &arena);
        let mut iter = MAP_BEGIN;
        assert!(map.iterator_next(&mut iter));
        map.set_entry_value(iter, &MessageValue::Str(b"bb".to_vec()), &arena)
            .unwrap();
        assert_eq!(
            map.get(&MessageValue::Int32(1)),
            Some(MessageValue::Str(b"bb".to_vec()))
        );
    }

    #[test]
    fn clear_empties_map() {
        let arena = Arena::new();
        let mut map = Map::new(&arena, CType::Int32, CType::Int32).unwrap();
        for i in 0..20 {
            map.insert(&MessageValue::Int32(i), &MessageValue::Int32(i), &arena);
        }
        map.clear();
        assert_eq!(map.size(), 0);
        assert_eq!(map.get(&MessageValue::Int32(3)), None);
        let mut iter = MAP_BEGIN;
        assert!(map.next(&mut iter).is_none());
    }

    #[test]
    fn insert_out_of_memory_is_reported() {
        let arena = Arena::with_config(&hpb_arena::ArenaConfig {
            block_size: 64,
            max_bytes: Some(1024),
        });
        let mut map = Map::new(&arena, CType::Int32, CType::String).unwrap();
        let big = MessageValue::Str(vec![0u8; 4096]);
        assert_eq!(
            map.insert(&MessageValue::Int32(1), &big, &arena),
            MapInsertStatus::OutOfMemory
        );
        assert_eq!(map.size(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        proptest! {
            #[test]
            fn matches_hashmap_model(ops in prop::collection::vec((any::<bool>(), -20i32..20, any::<i64>()), 1..200)) {
                let arena = Arena::new();
                let mut map = Map::new(&arena, CType::Int32, CType::Int64).unwrap();
                let mut model: HashMap<i32, i64> = HashMap::new();
                for (insert, k, v) in ops {
                    let key = MessageValue::Int32(k);
                    if insert {
                        let status = map.insert(&key, &MessageValue::Int64(v), &arena);
                        let expected = if model.insert(k, v).is_some() {
                            MapInsertStatus::Replaced
                        } else {
                            MapInsertStatus::Inserted
                        };
                        prop_assert_eq!(status, expected);
                    } else {
                        prop_assert_eq!(map.delete(&key), model.remove(&k).map(MessageValue::Int64));
                    }
                    prop_assert_eq!(map.size(), model.len());
                }
                for (k, v) in model {
                    prop_assert_eq!(map.get(&MessageValue::Int32(k)), Some(MessageValue::Int64(v)));
                }
            }
        }
    }
}
