//! Pool configuration.

use hpb_arena::ArenaConfig;
use hpb_core::Platform;

// ── PoolConfig ─────────────────────────────────────────────────────

/// Configuration for a [`DefPool`](crate::DefPool).
///
/// The table sizes are initial hints; every table grows on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Expected number of fully qualified symbols. Default: 32.
    pub symbol_table_size: usize,
    /// Expected number of loaded files. Default: 4.
    pub file_table_size: usize,
    /// Expected number of registered extensions. Default: 8.
    pub registry_size: usize,
    /// Initial capacity of the mini-descriptor scratch buffer. Default: 240.
    pub scratch_size: usize,
    /// Target for layout compilation. Default: [`Platform::Native`].
    ///
    /// Can only change while the pool is empty; see
    /// [`DefPool::set_platform`](crate::DefPool::set_platform).
    pub platform: Platform,
    /// Budget for the pool arena and for each build arena.
    pub arena: ArenaConfig,
}

impl PoolConfig {
    /// Default symbol table size.
    pub const DEFAULT_SYMBOL_TABLE_SIZE: usize = 32;
    /// Default file table size.
    pub const DEFAULT_FILE_TABLE_SIZE: usize = 4;
    /// Default scratch buffer capacity in bytes.
    pub const DEFAULT_SCRATCH_SIZE: usize = 240;

    /// The default configuration for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            symbol_table_size: Self::DEFAULT_SYMBOL_TABLE_SIZE,
            file_table_size: Self::DEFAULT_FILE_TABLE_SIZE,
            registry_size: hpb_mini::DEFAULT_REGISTRY_SIZE,
            scratch_size: Self::DEFAULT_SCRATCH_SIZE,
            platform: Platform::Native,
            arena: ArenaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PoolConfig::default();
        assert_eq!(c.symbol_table_size, 32);
        assert_eq!(c.file_table_size, 4);
        assert_eq!(c.registry_size, 8);
        assert_eq!(c.scratch_size, 240);
        assert_eq!(c.platform, Platform::Native);
        assert_eq!(c.arena.max_bytes, None);
    }

    #[test]
    fn for_platform_keeps_other_defaults() {
        let c = PoolConfig::for_platform(Platform::Bits32);
        assert_eq!(c.platform, Platform::Bits32);
        assert_eq!(c.symbol_table_size, PoolConfig::DEFAULT_SYMBOL_TABLE_SIZE);
    }
}
