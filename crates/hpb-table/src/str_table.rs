//! String-keyed hash table.
//!
//! Keys are copied into arena-accounted buffers holding a little-endian
//! `u32` length followed by the raw bytes. Equality is length plus byte
//! comparison, so keys may contain embedded NULs.

use hpb_arena::{Arena, ArenaError};

use crate::hash::str_hash;
use crate::table::{Table, TableKey};

/// Cursor value that starts an iteration.
pub const BEGIN: isize = -1;

/// An owned, length-prefixed string key.
#[derive(Debug)]
pub struct StrKey(Box<[u8]>);

impl StrKey {
    const PREFIX: usize = std::mem::size_of::<u32>();

    fn new(bytes: &[u8], arena: &Arena) -> Result<Self, ArenaError> {
        let len = u32::try_from(bytes.len()).map_err(|_| ArenaError::OutOfMemory {
            requested: bytes.len(),
        })?;
        let mut buf = arena.alloc_vec::<u8>(Self::PREFIX + bytes.len())?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(bytes);
        Ok(Self(buf.into_boxed_slice()))
    }

    /// The key bytes, without the length prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[Self::PREFIX..]
    }

    /// Length recorded in the prefix.
    pub fn len(&self) -> usize {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]) as usize
    }

    /// Whether the key is the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableKey for StrKey {
    type Lookup = [u8];

    fn hash_of(key: &[u8]) -> u32 {
        str_hash(key)
    }

    fn as_lookup(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Number of slots needed so `expected` entries fit under the load limit.
///
/// Multiplies by an approximation of `1 / 0.85` with a power-of-two
/// denominator.
fn size_lg2_for(expected: usize) -> u8 {
    let need = expected.saturating_add(1).saturating_mul(1204) / 1024;
    log2_ceiling(need)
}

/// `ceil(log2(x))`, with `log2_ceiling(0) == log2_ceiling(1) == 0`.
pub(crate) fn log2_ceiling(x: usize) -> u8 {
    if x <= 1 {
        0
    } else {
        (usize::BITS - (x - 1).leading_zeros()) as u8
    }
}

/// A hash table from byte strings to 64-bit values.
#[derive(Debug)]
pub struct StrTable {
    t: Table<StrKey>,
}

impl StrTable {
    /// Create a table pre-sized for `expected` entries.
    pub fn new(expected: usize, arena: &Arena) -> Result<Self, ArenaError> {
        Ok(Self {
            t: Table::new(size_lg2_for(expected), arena)?,
        })
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.t.count()
    }

    /// Number of slots in the backing array.
    pub fn capacity(&self) -> usize {
        self.t.size()
    }

    /// Entry count at which the next insert grows the table.
    pub fn max_count(&self) -> usize {
        self.t.max_count()
    }

    /// Look up `key`.
    pub fn lookup(&self, key: &[u8]) -> Option<u64> {
        let slot = self.t.find(key, str_hash(key))?;
        self.t.slot(slot).map(|(_, v)| v)
    }

    /// Insert `key`, which must not already be present.
    ///
    /// Grows the table when full. Growth and the key copy are both
    /// charged to `arena`; if either fails the table is unchanged.
    pub fn insert(&mut self, key: &[u8], val: u64, arena: &Arena) -> Result<(), ArenaError> {
        debug_assert!(self.lookup(key).is_none(), "duplicate key inserted");
        if self.t.is_full() {
            self.resize(self.t.size_lg2() + 1, arena)?;
        }
        let owned = StrKey::new(key, arena)?;
        self.t.insert(owned, val, str_hash(key));
        Ok(())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.t.remove(key, str_hash(key)).map(|(_, v)| v)
    }

    /// Rehash into `2^size_lg2` slots, or the smallest larger size that
    /// still holds every live entry.
    pub fn resize(&mut self, size_lg2: u8, arena: &Arena) -> Result<(), ArenaError> {
        self.t.resize(size_lg2, arena)
    }

    /// Remove every entry, keeping capacity.
    pub fn clear(&mut self) {
        self.t.clear();
    }

    /// Advance `cursor` to the next entry and return it.
    ///
    /// Start with [`BEGIN`]. Returns `None` (and parks the cursor past
    /// the end) once the table is exhausted.
    pub fn next(&self, cursor: &mut isize) -> Option<(&[u8], u64)> {
        match self.t.next_slot(*cursor) {
            Some(slot) => {
                *cursor = slot as isize;
                self.t.slot(slot).map(|(k, v)| (k.as_bytes(), v))
            }
            None => {
                *cursor = self.t.size() as isize;
                None
            }
        }
    }

    /// Whether `cursor` does not point at a live entry.
    pub fn done(&self, cursor: isize) -> bool {
        cursor < 0 || self.t.slot(cursor as usize).is_none()
    }

    /// Key under `cursor`. Empty when the cursor is done.
    pub fn iter_key(&self, cursor: isize) -> &[u8] {
        self.entry_at(cursor).map_or(&[][..], |(k, _)| k)
    }

    /// Value under `cursor`. Zero when the cursor is done.
    pub fn iter_value(&self, cursor: isize) -> u64 {
        self.entry_at(cursor).map_or(0, |(_, v)| v)
    }

    /// Key and value stored in slot `cursor`.
    pub fn entry_at(&self, cursor: isize) -> Option<(&[u8], u64)> {
        if cursor < 0 {
            return None;
        }
        self.t.slot(cursor as usize).map(|(k, v)| (k.as_bytes(), v))
    }

    /// Remove the entry under `cursor`.
    ///
    /// The chain is repaired, which may pull a later entry of the same
    /// chain into this slot; the cursor steps back one slot so the next
    /// call to [`next`](Self::next) revisits it. An entry pulled forward
    /// from an earlier slot can therefore be yielded twice.
    pub fn remove_iter(&mut self, cursor: &mut isize) -> Option<u64> {
        if *cursor < 0 {
            return None;
        }
        let removed = self.t.remove_slot(*cursor as usize).map(|(_, v)| v);
        *cursor -= 1;
        removed
    }

    /// Overwrite the value under `cursor`.
    pub fn set_entry_value(&mut self, cursor: isize, val: u64) {
        if cursor >= 0 {
            self.t.set_slot_value(cursor as usize, val);
        }
    }

    /// Iterate over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> StrTableIter<'_> {
        StrTableIter {
            table: self,
            cursor: BEGIN,
        }
    }

    /// Slots that hold live entries, in slot order.
    pub(crate) fn occupied_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.t.size()).filter(|&i| self.t.slot(i).is_some())
    }

    #[cfg(test)]
    pub(crate) fn check_chains(&self) -> bool {
        self.t.check_chains()
    }
}

/// Borrowing iterator over a [`StrTable`].
pub struct StrTableIter<'a> {
    table: &'a StrTable,
    cursor: isize,
}

impl<'a> Iterator for StrTableIter<'a> {
    type Item = (&'a [u8], u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.table.next(&mut self.cursor)
    }
}
