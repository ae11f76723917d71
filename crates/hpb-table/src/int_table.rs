//! Integer-keyed hash table with a dense array part.
//!
//! Keys below `array_size` live directly in an array indexed by key; all
//! other keys go to a chained-scatter hash part. `array_size` is at least
//! one, so key 0 never reaches the hash part. [`IntTable::compact`] picks
//! an array size that keeps the array at least 10% populated.

use hpb_arena::{Arena, ArenaError};

use crate::hash::int_hash;
use crate::str_table::log2_ceiling;
use crate::table::{Table, TableKey};

/// Largest array part, as a power of two.
const MAX_ARRAY_LG2: usize = 16;

/// Minimum array occupancy, in percent, that [`IntTable::compact`] keeps.
const MIN_DENSITY_PERCENT: usize = 10;

impl TableKey for u64 {
    type Lookup = u64;

    fn hash_of(key: &u64) -> u32 {
        int_hash(*key)
    }

    fn as_lookup(&self) -> &u64 {
        self
    }
}

/// `ceil(log2(v))` capped at [`MAX_ARRAY_LG2`].
fn capped_log2_ceiling(v: u64) -> usize {
    (log2_ceiling(v.min(usize::MAX as u64) as usize) as usize).min(MAX_ARRAY_LG2)
}

/// A hash table from `u64` keys to 64-bit values.
#[derive(Debug)]
pub struct IntTable {
    t: Table<u64>,
    array: Vec<Option<u64>>,
    array_count: usize,
}

impl IntTable {
    /// Create a table with a one-slot array part and a 16-slot hash part.
    pub fn new(arena: &Arena) -> Result<Self, ArenaError> {
        Self::with_sizes(0, 4, arena)
    }

    /// Create a table with an explicit array size and hash size.
    pub fn with_sizes(
        array_size: usize,
        hash_size_lg2: u8,
        arena: &Arena,
    ) -> Result<Self, ArenaError> {
        let array_size = array_size.max(1);
        let mut array = arena.alloc_vec::<Option<u64>>(array_size)?;
        array.resize(array_size, None);
        Ok(Self {
            t: Table::new(hash_size_lg2, arena)?,
            array,
            array_count: 0,
        })
    }

    /// Number of live entries across both parts.
    pub fn count(&self) -> usize {
        self.t.count() + self.array_count
    }

    /// Size of the array part.
    pub fn array_size(&self) -> usize {
        self.array.len()
    }

    /// Number of slots in the hash part.
    pub fn hash_capacity(&self) -> usize {
        self.t.size()
    }

    fn array_index(&self, key: u64) -> Option<usize> {
        usize::try_from(key).ok().filter(|&k| k < self.array.len())
    }

    /// Look up `key`.
    pub fn lookup(&self, key: u64) -> Option<u64> {
        match self.array_index(key) {
            Some(i) => self.array[i],
            None => {
                let slot = self.t.find(&key, int_hash(key))?;
                self.t.slot(slot).map(|(_, v)| v)
            }
        }
    }

    /// Insert `key`, which must not already be present.
    ///
    /// A full hash part is grown first; the array part is reused as-is.
    pub fn insert(&mut self, key: u64, val: u64, arena: &Arena) -> Result<(), ArenaError> {
        debug_assert!(self.lookup(key).is_none(), "duplicate key inserted");
        match self.array_index(key) {
            Some(i) => {
                self.array[i] = Some(val);
                self.array_count += 1;
            }
            None => {
                if self.t.is_full() {
                    self.t.resize(self.t.size_lg2() + 1, arena)?;
                }
                self.t.insert(key, val, int_hash(key));
            }
        }
        Ok(())
    }

    /// Overwrite the value of an existing key. Returns `false` if absent.
    pub fn replace(&mut self, key: u64, val: u64) -> bool {
        match self.array_index(key) {
            Some(i) => match &mut self.array[i] {
                Some(slot) => {
                    *slot = val;
                    true
                }
                None => false,
            },
            None => match self.t.find(&key, int_hash(key)) {
                Some(slot) => {
                    self.t.set_slot_value(slot, val);
                    true
                }
                None => false,
            },
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: u64) -> Option<u64> {
        match self.array_index(key) {
            Some(i) => {
                let old = self.array[i].take();
                if old.is_some() {
                    self.array_count -= 1;
                }
                old
            }
            None => self.t.remove(&key, int_hash(key)).map(|(_, v)| v),
        }
    }

    /// Advance `cursor` (start at `-1`) and return the next entry.
    ///
    /// Visits the array part in key order, then the hash part in slot
    /// order.
    pub fn next(&self, cursor: &mut isize) -> Option<(u64, u64)> {
        let asize = self.array.len() as isize;
        let mut i = *cursor;
        if i < asize {
            i += 1;
            while i < asize {
                if let Some(v) = self.array[i as usize] {
                    *cursor = i;
                    return Some((i as u64, v));
                }
                i += 1;
            }
            // One before the start of the hash part.
            i = asize - 1;
        }
        match self.t.next_slot(i - asize) {
            Some(slot) => {
                *cursor = slot as isize + asize;
                self.t.slot(slot).map(|(k, v)| (*k, v))
            }
            None => {
                *cursor = asize + self.t.size() as isize;
                None
            }
        }
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> IntTableIter<'_> {
        IntTableIter {
            table: self,
            cursor: -1,
        }
    }

    /// Rebuild with the largest power-of-two array part that stays at
    /// least 10% full, moving every other key into a right-sized hash
    /// part.
    ///
    /// The replacement table is fully built before it is swapped in, so
    /// on error the table is unchanged.
    pub fn compact(&mut self, arena: &Arena) -> Result<(), ArenaError> {
        let mut counts = [0usize; MAX_ARRAY_LG2 + 1];
        let mut max = [0u64; MAX_ARRAY_LG2 + 1];
        for (key, _) in self.iter() {
            let bucket = capped_log2_ceiling(key);
            max[bucket] = max[bucket].max(key);
            counts[bucket] += 1;
        }

        let total = self.count();
        let mut arr_count = total;
        let mut size_lg2 = MAX_ARRAY_LG2;
        while size_lg2 > 0 {
            if counts[size_lg2] != 0 {
                if arr_count * 100 >= (1usize << size_lg2) * MIN_DENSITY_PERCENT {
                    break;
                }
                arr_count -= counts[size_lg2];
            }
            size_lg2 -= 1;
        }

        let arr_size = usize::try_from(max[size_lg2])
            .map_err(|_| ArenaError::OutOfMemory { requested: usize::MAX })?
            + 1;
        let hash_count = total - arr_count;
        let hash_size = if hash_count == 0 {
            0
        } else {
            hash_count * 100 / 85 + 1
        };

        let mut fresh = IntTable::with_sizes(arr_size, log2_ceiling(hash_size), arena)?;
        let entries: Vec<(u64, u64)> = self.iter().collect();
        for (k, v) in entries {
            fresh.insert(k, v, arena)?;
        }
        *self = fresh;
        Ok(())
    }
}

/// Borrowing iterator over an [`IntTable`].
pub struct IntTableIter<'a> {
    table: &'a IntTable,
    cursor: isize,
}

impl Iterator for IntTableIter<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.table.next(&mut self.cursor)
    }
}
