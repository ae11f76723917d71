//! hpb: a protobuf schema runtime.
//!
//! This is the facade crate re-exporting the public API of the hpb
//! sub-crates. Schemas arrive as `FileDescriptorProto`s, serialized or
//! already decoded; a [`defs::DefPool`] cross-links them into definitions
//! and compiles a layout for every message and closed enum.
//!
//! # Quick start
//!
//! ```rust
//! use hpb::prelude::*;
//! use hpb::descriptor::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
//!
//! let file = FileDescriptorProto {
//!     name: Some("point.proto".into()),
//!     package: Some("geo".into()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Point".into()),
//!         field: vec![FieldDescriptorProto {
//!             name: Some("x_pos".into()),
//!             number: Some(1),
//!             label: Some(Label::Optional as i32),
//!             r#type: Some(FieldType::Int32 as i32),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let mut pool = DefPool::new()?;
//! pool.add_file(&file)?;
//! let point = pool.find_message_by_name("geo.Point").unwrap();
//! let x = pool.field(pool.message(point).find_field_by_name("x_pos").unwrap());
//! assert_eq!(x.full_name(), "geo.Point.x_pos");
//! assert_eq!(x.json_name(), "xPos");
//! assert_eq!(x.mini_table_field(&pool).unwrap().number(), 1);
//! # Ok::<(), DefError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `hpb-arena` | Arena with byte budgets and fuse |
//! | [`types`] | `hpb-core` | Field types, labels, platforms, default values |
//! | [`table`] | `hpb-table` | String and integer hash tables, map runtime |
//! | [`mini`] | `hpb-mini` | Mini-descriptors, layouts, extension registry |
//! | [`descriptor`] | `hpb-descriptor` | `descriptor.proto` messages and codec |
//! | [`defs`] | `hpb-defs` | Definition pool and builder |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena allocation accounting (`hpb-arena`).
pub use hpb_arena as arena;

/// Descriptor constants and value types (`hpb-core`).
///
/// [`types::FieldType`], [`types::Label`] and [`types::Syntax`] mirror the
/// numeric constants of `descriptor.proto`.
pub use hpb_core as types;

/// Hash tables and the map runtime (`hpb-table`).
pub use hpb_table as table;

/// Mini-descriptors and compiled layouts (`hpb-mini`).
///
/// [`mini::MiniTable`] is what a parser walks; [`mini::ExtensionRegistry`]
/// maps `(extendee, number)` to an extension layout.
pub use hpb_mini as mini;

/// `descriptor.proto` messages and their codec (`hpb-descriptor`).
pub use hpb_descriptor as descriptor;

/// The definition pool (`hpb-defs`).
pub use hpb_defs as defs;

/// Common imports.
///
/// ```rust
/// use hpb::prelude::*;
/// ```
pub mod prelude {
    // Pool and definitions
    pub use hpb_defs::{
        DefInit, DefPool, DefRef, EnumDef, EnumValueDef, FieldDef, FileDef, MessageDef,
        MethodDef, OneofDef, PoolConfig, ServiceDef, WellKnownType,
    };

    // Handles
    pub use hpb_defs::{
        EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId,
    };

    // Errors
    pub use hpb_defs::DefError;
    pub use hpb_descriptor::DecodeError;

    // Descriptor constants
    pub use hpb_core::{CType, FieldType, Label, MessageValue, Platform, Syntax};

    // Layouts
    pub use hpb_mini::{ExtensionRegistry, MiniTable, MiniTableFile};

    // Codec
    pub use hpb_descriptor::Message;
}
