//! Hash tables and the map-field runtime for hpb.
//!
//! Both tables share one open-addressing engine: chained scatter with
//! Brent's variation. Collisions are linked through an index stored in
//! each entry, and an entry that squats on another chain's main position
//! is evicted so every chain stays reachable from its own main position.
//!
//! # Architecture
//!
//! ```text
//! Table<K>  (private engine: entries[], mask, count, max_count)
//! ├── StrTable   byte-string keys, MurmurHash2, length-prefixed copies
//! │   └── Map    typed key/value wrapper used by map fields
//! │       └── MapSorter  sorted, nestable views for serialization
//! └── IntTable   u64 keys, dense array part + hash part
//! ```
//!
//! Tables never shrink. Growth doubles the slot count once the live count
//! reaches 85% of capacity, and every allocation is charged to the caller's
//! [`hpb_arena::Arena`], so an out-of-memory error leaves the table intact.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod hash;
pub mod int_table;
pub mod map;
pub mod map_sorter;
pub mod str_table;
mod table;

// Public re-exports for the primary API surface.
pub use int_table::IntTable;
pub use map::{Map, MapInsertStatus, MAP_BEGIN};
pub use map_sorter::{MapSorter, SortedMap};
pub use str_table::{StrTable, BEGIN};
