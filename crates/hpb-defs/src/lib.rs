//! Schema definitions for hpb.
//!
//! A [`DefPool`] turns `FileDescriptorProto`s into an immutable graph of
//! defs: files, messages, fields, oneofs, enums, enum values, services and
//! methods. Every message and closed enum also gets a compiled layout from
//! `hpb-mini`, and every extension is entered in the pool's
//! [`ExtensionRegistry`](hpb_mini::ExtensionRegistry).
//!
//! # Architecture
//!
//! ```text
//! FileDescriptorProto ──► Builder (one per file, own arena)
//!                           │ create   symbols, member tables
//!                           │ resolve  type names, extendees, defaults
//!                           │ layout   MiniTable per message
//!                           │ link     sub-tables, extension registry
//!                           ▼
//!                        DefPool
//!            ┌──────────────┼───────────────┐
//!            ▼              ▼               ▼
//!      per-kind Vecs   symbol table    LayoutStore
//!      (typed ids)     full name →     + ExtensionRegistry
//!                      DefRef
//! ```
//!
//! Defs refer to each other by typed ids ([`MessageId`], [`FieldId`], ...)
//! rather than pointers, so the graph may be cyclic. A failed build rolls
//! back every def, symbol and layout it added.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod builder;
pub mod config;
pub mod default;
pub mod enum_def;
pub mod error;
pub mod field;
pub mod file;
pub mod id;
pub mod init;
pub mod message;
pub mod names;
pub mod oneof;
pub mod pool;
pub mod service;
pub mod symbol;
pub mod well_known;

// Public re-exports for the primary API surface.
pub use config::PoolConfig;
pub use default::parse_default;
pub use enum_def::{EnumDef, EnumReservedRange, EnumValueDef};
pub use error::DefError;
pub use field::FieldDef;
pub use file::FileDef;
pub use id::{EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId};
pub use init::DefInit;
pub use message::{ExtensionRange, MessageDef, ReservedRange, MAX_FIELD_NUMBER};
pub use oneof::OneofDef;
pub use pool::DefPool;
pub use service::{MethodDef, ServiceDef};
pub use symbol::{DefRef, Member};
pub use well_known::WellKnownType;
