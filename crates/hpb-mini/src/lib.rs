//! Mini descriptors and the layout compiler for hpb.
//!
//! A mini descriptor is a compact printable string describing the fields of
//! a message, an enum, a map entry or an extension. The def layer writes one
//! per message with [`MtDataEncoder`]; this crate compiles it into a
//! [`MiniTable`] with concrete field offsets, hasbits and oneof case slots
//! for a target [`Platform`](hpb_core::Platform).
//!
//! # Architecture
//!
//! ```text
//! MtDataEncoder ──► mini descriptor (base92 text)
//!                        │
//!                        ▼
//!            decode: fields, hasbits, layout
//!                        │
//!     ┌──────────────────┼───────────────────┐
//!     ▼                  ▼                   ▼
//! MiniTable       MiniTableEnum     MiniTableExtension
//!     └──────────► LayoutStore ◄─────────────┘
//!                   (ids, link)
//!                        │
//!                        ▼
//!               ExtensionRegistry
//!           (extendee, number) → ext
//! ```
//!
//! Tables reference each other by id through a [`LayoutStore`], so
//! recursive messages need no shared pointers. [`MiniTableFile`] carries a
//! file's compiled tables between stores.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod base92;
mod decode;
pub mod encode;
pub mod enum_table;
pub mod error;
pub mod extension;
pub mod field;
pub mod file;
pub mod id;
pub mod message;
pub mod registry;
pub mod store;
pub mod wire;

// Public re-exports for the primary API surface.
pub use encode::MtDataEncoder;
pub use enum_table::MiniTableEnum;
pub use error::MiniTableError;
pub use extension::MiniTableExtension;
pub use field::{FieldMode, FieldRep, MiniTableField};
pub use file::MiniTableFile;
pub use id::{MiniTableEnumId, MiniTableExtensionId, MiniTableId};
pub use message::{ExtMode, MiniTable, MiniTableSub};
pub use registry::{ExtensionRegistry, DEFAULT_REGISTRY_SIZE};
pub use store::{LayoutStore, StoreMark};
pub use wire::{field_modifier, message_modifier};
