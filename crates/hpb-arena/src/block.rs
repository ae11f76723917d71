//! Accounting blocks and the growable block list.
//!
//! A [`Block`] records how many bytes of a fixed reservation have been
//! handed out. A [`BlockList`] bump-allocates from its newest block and
//! opens a fresh one when the request does not fit, subject to the
//! arena budget.

use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// One reservation of arena bytes with a bump cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    capacity: usize,
    used: usize,
}

impl Block {
    /// Create an empty block of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    /// Bump `len` bytes. Returns the offset of the allocation, or `None`
    /// if the block has insufficient room.
    pub fn alloc(&mut self, len: usize) -> Option<usize> {
        let end = self.used.checked_add(len)?;
        if end > self.capacity {
            return None;
        }
        let offset = self.used;
        self.used = end;
        Some(offset)
    }

    /// Bytes handed out from this block.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total bytes reserved by this block.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}

/// A growable list of [`Block`]s with overflow-based bump allocation.
///
/// Only the newest block is bumped. Requests that do not fit in it open
/// a new block of `max(block_size, request)` bytes; the tail of the old
/// block is abandoned, as in any bump allocator.
#[derive(Clone, Debug)]
pub struct BlockList {
    blocks: Vec<Block>,
    block_size: usize,
    max_bytes: Option<usize>,
    reserved: usize,
}

impl BlockList {
    /// Create an empty block list. No block is reserved until the first
    /// allocation.
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            blocks: Vec::new(),
            block_size: config.block_size.max(ArenaConfig::ALIGN),
            max_bytes: config.max_bytes,
            reserved: 0,
        }
    }

    /// Account for `len` bytes (already aligned by the caller).
    ///
    /// On error nothing is recorded.
    pub fn alloc(&mut self, len: usize) -> Result<(), ArenaError> {
        if let Some(block) = self.blocks.last_mut() {
            if block.alloc(len).is_some() {
                return Ok(());
            }
        }

        let size = len.max(self.block_size);
        let new_reserved = self
            .reserved
            .checked_add(size)
            .ok_or(ArenaError::OutOfMemory { requested: len })?;
        if let Some(max) = self.max_bytes {
            if new_reserved > max {
                return Err(ArenaError::CapacityExceeded {
                    requested: len,
                    capacity: max,
                });
            }
        }

        let mut block = Block::new(size);
        // A fresh block is at least `len` bytes.
        let _ = block.alloc(len);
        self.blocks.push(block);
        self.reserved = new_reserved;
        Ok(())
    }

    /// Move every block of `other` into this list.
    ///
    /// Absorbed blocks are appended before the current block so bumping
    /// continues where this list left off.
    pub fn absorb(&mut self, mut other: BlockList) {
        self.reserved += other.reserved;
        let current = self.blocks.pop();
        self.blocks.append(&mut other.blocks);
        self.blocks.extend(current);
    }

    /// Total bytes reserved across all blocks.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Total bytes handed out across all blocks.
    pub fn used(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The configured budget, if any.
    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }
}
