//! Bump-accounting arena with fuse semantics for the hpb schema runtime.
//!
//! Every table array, interned key and def record in hpb is charged to an
//! [`Arena`]. The arena never hands out raw pointers: storage itself lives
//! in ordinary owned containers, and the arena keeps the block-level
//! accounting that decides whether an allocation fits the configured
//! budget. This keeps out-of-memory a recoverable, testable condition.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── BlockList (bump cursor over fixed-size accounting blocks)
//! │   └── Block[] (capacity + used bytes, never individually freed)
//! └── fused counters (blocks absorbed from other arenas via fuse())
//! ```
//!
//! # Lifetime model
//!
//! - **Whole-arena free only:** bytes are returned when the arena drops.
//! - **Fuse:** a short-lived arena can be absorbed into a long-lived one so
//!   its allocations share the longer lifetime.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod error;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
