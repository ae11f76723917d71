//! Core types for the hpb schema runtime.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the descriptor constants shared by every layer: field types, C-level
//! value types, labels, syntax, the layout target platform, and the
//! [`MessageValue`] carried by maps and field defaults.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod descriptor;
pub mod error;
pub mod value;

pub use descriptor::{CType, FieldType, Label, Platform, Syntax};
pub use error::ConstantError;
pub use value::{ctype_size, MessageRef, MessageValue, MAP_TYPE_STRING};
