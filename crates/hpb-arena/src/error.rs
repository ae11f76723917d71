//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The configured byte budget would be exceeded.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total budget of the arena in bytes.
        capacity: usize,
    },
    /// The system allocator refused a backing allocation.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory allocating {requested} bytes")
            }
        }
    }
}

impl Error for ArenaError {}
