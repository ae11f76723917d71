//! The shared chained-scatter engine behind [`StrTable`](crate::StrTable)
//! and the hash part of [`IntTable`](crate::IntTable).
//!
//! Every entry lives in one contiguous array. A collision links the new
//! entry into the chain of its main position (`hash & mask`) through the
//! `next` index. Brent's variation keeps every chain homogeneous: when a
//! key's main position is occupied by an entry that belongs to some other
//! chain, that entry is evicted to a free slot and the newcomer takes its
//! main position. As a result every entry is reachable by walking from
//! its own main position.

use hpb_arena::{Arena, ArenaError};

/// Maximum load factor numerator over 100.
const MAX_LOAD_PERCENT: usize = 85;

fn slots_for(size_lg2: u8) -> usize {
    if size_lg2 == 0 {
        0
    } else {
        1usize << size_lg2
    }
}

/// Load limit of a table with `2^size_lg2` slots.
fn max_count_for(size_lg2: u8) -> usize {
    slots_for(size_lg2) * MAX_LOAD_PERCENT / 100
}

/// A key type storable in the engine.
pub(crate) trait TableKey {
    /// Borrowed form used for lookups.
    type Lookup: ?Sized + PartialEq;

    /// Hash of a borrowed key.
    fn hash_of(key: &Self::Lookup) -> u32;

    /// Borrow the lookup form of a stored key.
    fn as_lookup(&self) -> &Self::Lookup;
}

/// One bucket: an optional key, its value, and the chain link.
#[derive(Debug)]
pub(crate) struct Entry<K> {
    pub(crate) key: Option<K>,
    pub(crate) val: u64,
    next: Option<u32>,
}

impl<K> Entry<K> {
    fn empty() -> Self {
        Self {
            key: None,
            val: 0,
            next: None,
        }
    }
}

/// Capacity bookkeeping plus the entry array.
#[derive(Debug)]
pub(crate) struct Table<K> {
    count: usize,
    mask: u32,
    max_count: usize,
    size_lg2: u8,
    entries: Vec<Entry<K>>,
}

impl<K: TableKey> Table<K> {
    /// Allocate a table of `2^size_lg2` empty entries (zero entries when
    /// `size_lg2 == 0`).
    pub(crate) fn new(size_lg2: u8, arena: &Arena) -> Result<Self, ArenaError> {
        let size = slots_for(size_lg2);
        let mut entries = arena.alloc_vec::<Entry<K>>(size)?;
        entries.resize_with(size, Entry::empty);
        Ok(Self {
            count: 0,
            mask: size.saturating_sub(1) as u32,
            max_count: max_count_for(size_lg2),
            size_lg2,
            entries,
        })
    }

    pub(crate) fn size(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn size_lg2(&self) -> u8 {
        self.size_lg2
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn max_count(&self) -> usize {
        self.max_count
    }

    pub(crate) fn is_full(&self) -> bool {
        self.count == self.max_count
    }

    #[inline]
    fn main_position(&self, hash: u32) -> usize {
        (hash & self.mask) as usize
    }

    #[inline]
    fn key_matches(&self, slot: usize, key: &K::Lookup) -> bool {
        self.entries[slot]
            .key
            .as_ref()
            .is_some_and(|k| k.as_lookup() == key)
    }

    /// Slot holding `key`, if present.
    pub(crate) fn find(&self, key: &K::Lookup, hash: u32) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let mut slot = self.main_position(hash);
        if self.entries[slot].key.is_none() {
            return None;
        }
        loop {
            if self.key_matches(slot, key) {
                return Some(slot);
            }
            slot = self.entries[slot].next? as usize;
        }
    }

    fn empty_slot_after(&self, from: usize) -> Option<usize> {
        (from + 1..self.size())
            .chain(0..from)
            .find(|&i| self.entries[i].key.is_none())
    }

    /// Insert a key known to be absent. The caller grows the table first
    /// if it is full.
    pub(crate) fn insert(&mut self, key: K, val: u64, hash: u32) {
        debug_assert!(self.count < self.max_count, "insert into full table");
        let mainpos = self.main_position(hash);
        let collider_head = self.entries[mainpos]
            .key
            .as_ref()
            .map(|k| self.main_position(K::hash_of(k.as_lookup())));
        let ours = match collider_head {
            None => {
                self.entries[mainpos].next = None;
                mainpos
            }
            Some(collider_head) => {
                let free = self
                    .empty_slot_after(mainpos)
                    .expect("load factor below 1 guarantees a free slot");
                if collider_head == mainpos {
                    // Same chain: append right after the head.
                    self.entries[free].next = self.entries[mainpos].next;
                    self.entries[mainpos].next = Some(free as u32);
                    free
                } else {
                    // Evict the collider into the free slot and relink its chain.
                    let moved = std::mem::replace(&mut self.entries[mainpos], Entry::empty());
                    self.entries[free] = moved;
                    let mut link = collider_head;
                    while let Some(next) = self.entries[link].next {
                        if next as usize == mainpos {
                            break;
                        }
                        link = next as usize;
                    }
                    self.entries[link].next = Some(free as u32);
                    mainpos
                }
            }
        };
        self.entries[ours].key = Some(key);
        self.entries[ours].val = val;
        self.count += 1;
    }

    /// Remove the entry at a chain head, pulling its successor forward.
    fn remove_head(&mut self, head: usize) -> Option<(K, u64)> {
        let removed = std::mem::replace(&mut self.entries[head], Entry::empty());
        if let Some(next) = removed.next {
            self.entries[head] = std::mem::replace(&mut self.entries[next as usize], Entry::empty());
        }
        self.count -= 1;
        removed.key.map(|k| (k, removed.val))
    }

    /// Unlink the entry at `slot`, whose predecessor in the chain is `prev`.
    fn remove_linked(&mut self, prev: usize, slot: usize) -> Option<(K, u64)> {
        let removed = std::mem::replace(&mut self.entries[slot], Entry::empty());
        self.entries[prev].next = removed.next;
        self.count -= 1;
        removed.key.map(|k| (k, removed.val))
    }

    /// Remove `key`, returning the stored key and value.
    pub(crate) fn remove(&mut self, key: &K::Lookup, hash: u32) -> Option<(K, u64)> {
        if self.entries.is_empty() {
            return None;
        }
        let head = self.main_position(hash);
        if self.entries[head].key.is_none() {
            return None;
        }
        if self.key_matches(head, key) {
            return self.remove_head(head);
        }
        let mut prev = head;
        while let Some(next) = self.entries[prev].next {
            let next = next as usize;
            if self.key_matches(next, key) {
                return self.remove_linked(prev, next);
            }
            prev = next;
        }
        None
    }

    /// Remove whatever entry occupies `slot`.
    pub(crate) fn remove_slot(&mut self, slot: usize) -> Option<(K, u64)> {
        let hash = K::hash_of(self.entries.get(slot)?.key.as_ref()?.as_lookup());
        let head = self.main_position(hash);
        if head == slot {
            return self.remove_head(slot);
        }
        let mut prev = head;
        while let Some(next) = self.entries[prev].next {
            if next as usize == slot {
                return self.remove_linked(prev, slot);
            }
            prev = next as usize;
        }
        None
    }

    /// Next occupied slot strictly after `cursor` (`-1` starts at slot 0).
    pub(crate) fn next_slot(&self, cursor: isize) -> Option<usize> {
        let start = if cursor < 0 {
            0
        } else {
            (cursor as usize).saturating_add(1)
        };
        (start..self.size()).find(|&i| self.entries[i].key.is_some())
    }

    /// Key and value at `slot`, if occupied.
    pub(crate) fn slot(&self, slot: usize) -> Option<(&K, u64)> {
        let e = self.entries.get(slot)?;
        e.key.as_ref().map(|k| (k, e.val))
    }

    /// Overwrite the value at an occupied slot.
    pub(crate) fn set_slot_value(&mut self, slot: usize, val: u64) {
        if let Some(e) = self.entries.get_mut(slot) {
            debug_assert!(e.key.is_some(), "setting value of empty slot");
            e.val = val;
        }
    }

    /// Empty every slot, keeping capacity.
    pub(crate) fn clear(&mut self) {
        for e in &mut self.entries {
            *e = Entry::empty();
        }
        self.count = 0;
    }

    /// Rehash every entry into a fresh table of at least `2^size_lg2`
    /// slots. A size too small for the live entries is raised to the
    /// smallest one that holds them.
    ///
    /// The new array is allocated before anything moves, so on error the
    /// table is untouched.
    pub(crate) fn resize(&mut self, size_lg2: u8, arena: &Arena) -> Result<(), ArenaError> {
        let mut size_lg2 = size_lg2;
        while max_count_for(size_lg2) < self.count {
            size_lg2 += 1;
        }
        let mut fresh = Table::new(size_lg2, arena)?;
        for e in std::mem::take(&mut self.entries) {
            if let Some(k) = e.key {
                let hash = K::hash_of(k.as_lookup());
                fresh.insert(k, e.val, hash);
            }
        }
        *self = fresh;
        Ok(())
    }

    /// Move every entry out, leaving the table empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (K, u64)> + '_ {
        self.count = 0;
        self.entries
            .iter_mut()
            .filter_map(|e| {
                let old = std::mem::replace(e, Entry::empty());
                old.key.map(|k| (k, old.val))
            })
    }

    /// Check that every live entry is reachable from its main position.
    #[cfg(test)]
    pub(crate) fn check_chains(&self) -> bool {
        let live = self.entries.iter().filter(|e| e.key.is_some()).count();
        live == self.count
            && self.entries.iter().filter_map(|e| e.key.as_ref()).all(|k| {
                let key = k.as_lookup();
                self.find(key, K::hash_of(key)).is_some()
            })
    }
}
