//! The [`Arena`] handle.

use std::cell::{Cell, RefCell};
use std::mem::size_of;

use crate::block::BlockList;
use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// A bump-accounting arena.
///
/// All methods take `&self` so an arena can be shared by the many tables
/// and records that charge it during a single build. Bytes are released
/// only when the arena (or the arena it was fused into) is dropped.
#[derive(Debug)]
pub struct Arena {
    blocks: RefCell<BlockList>,
    fused: Cell<usize>,
}

impl Arena {
    /// Create an unbounded arena with default block sizing.
    pub fn new() -> Self {
        Self::with_config(&ArenaConfig::default())
    }

    /// Create an arena from an explicit config.
    pub fn with_config(config: &ArenaConfig) -> Self {
        Self {
            blocks: RefCell::new(BlockList::new(config)),
            fused: Cell::new(0),
        }
    }

    /// Account for `bytes` bytes, rounded up to 8.
    pub fn alloc(&self, bytes: usize) -> Result<(), ArenaError> {
        let aligned =
            ArenaConfig::align(bytes).ok_or(ArenaError::OutOfMemory { requested: bytes })?;
        if aligned == 0 {
            return Ok(());
        }
        self.blocks.borrow_mut().alloc(aligned)
    }

    /// Allocate an empty `Vec<T>` with room for exactly `len` elements.
    ///
    /// The budget is charged before the backing allocation is attempted;
    /// on failure no vector is returned.
    pub fn alloc_vec<T>(&self, len: usize) -> Result<Vec<T>, ArenaError> {
        let bytes = len
            .checked_mul(size_of::<T>())
            .ok_or(ArenaError::OutOfMemory { requested: usize::MAX })?;
        self.alloc(bytes)?;
        let mut v = Vec::new();
        v.try_reserve_exact(len)
            .map_err(|_| ArenaError::OutOfMemory { requested: bytes })?;
        Ok(v)
    }

    /// Copy `data` into an arena-accounted boxed slice.
    pub fn alloc_bytes(&self, data: &[u8]) -> Result<Box<[u8]>, ArenaError> {
        let mut v = self.alloc_vec::<u8>(data.len())?;
        v.extend_from_slice(data);
        Ok(v.into_boxed_slice())
    }

    /// Absorb `other` so its allocations share this arena's lifetime.
    pub fn fuse(&self, other: Arena) {
        let Arena { blocks, fused } = other;
        self.blocks.borrow_mut().absorb(blocks.into_inner());
        self.fused.set(self.fused.get() + fused.get() + 1);
    }

    /// Total bytes reserved by this arena, including fused arenas.
    pub fn space_allocated(&self) -> usize {
        self.blocks.borrow().reserved()
    }

    /// Total bytes handed out to callers.
    pub fn bytes_used(&self) -> usize {
        self.blocks.borrow().used()
    }

    /// Number of arenas that have been fused into this one.
    pub fn fused_count(&self) -> usize {
        self.fused.get()
    }

    /// The configured byte budget, if any.
    pub fn max_bytes(&self) -> Option<usize> {
        self.blocks.borrow().max_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
