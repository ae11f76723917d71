//! Descriptor messages for hpb.
//!
//! `google/protobuf/descriptor.proto` as plain structs, plus the wire codec
//! needed to read and write them. The def layer consumes
//! [`FileDescriptorProto`] values; nothing here resolves names or checks
//! semantic validity.
//!
//! # Architecture
//!
//! ```text
//! wire     varints, tags, length-delimited payloads, group skipping
//!   |
//! codec    Message trait: merge_field / encode_raw per descriptor type
//!   |
//! types    FileDescriptorSet, FileDescriptorProto, DescriptorProto, ...
//! options  Options<T>: raw bytes, typed view decoded on first access
//! ```
//!
//! Unknown fields are skipped. Nesting deeper than [`wire::RECURSION_LIMIT`]
//! fails with [`DecodeError::RecursionLimit`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod options;
pub mod types;
pub mod wire;

// Public re-exports for the primary API surface.
pub use codec::Message;
pub use error::DecodeError;
pub use options::{
    EnumOptions, EnumValueOptions, ExtensionRangeOptions, FieldOptions, FileOptions,
    MessageOptions, MethodOptions, OneofOptions, Options, ServiceOptions,
};
pub use types::{
    DescriptorProto, EnumDescriptorProto, EnumReservedRange, EnumValueDescriptorProto,
    ExtensionRange, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, OneofDescriptorProto, ReservedRange, ServiceDescriptorProto,
};
