//! Arena configuration parameters.

/// Configuration for the arena allocator.
///
/// Controls block sizing and the overall byte budget. All values are
/// immutable after the arena is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each accounting block in bytes.
    ///
    /// Default: 4096. Requests larger than a block get a dedicated block
    /// of exactly their (aligned) size.
    pub block_size: usize,

    /// Upper bound on bytes reserved across all blocks.
    ///
    /// `None` means unbounded. Exceeding the budget yields
    /// [`ArenaError::CapacityExceeded`](crate::ArenaError::CapacityExceeded).
    pub max_bytes: Option<usize>,
}

impl ArenaConfig {
    /// Default block size in bytes.
    pub const DEFAULT_BLOCK_SIZE: usize = 4096;

    /// Alignment applied to every allocation request.
    pub const ALIGN: usize = 8;

    /// Create an unbounded config with the default block size.
    pub fn new() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            max_bytes: None,
        }
    }

    /// Create a config limited to `max_bytes` total.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
            ..Self::new()
        }
    }

    /// Round `bytes` up to [`Self::ALIGN`].
    pub fn align(bytes: usize) -> Option<usize> {
        bytes
            .checked_add(Self::ALIGN - 1)
            .map(|b| b & !(Self::ALIGN - 1))
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
