//! Self-contained bootstrap units.

use hpb_mini::MiniTableFile;

/// A serialized file plus everything needed to load it into a fresh pool:
/// its dependencies as further units, and optionally its precompiled
/// layouts.
///
/// A whole dependency graph loads with one
/// [`DefPool::load_def_init`](crate::DefPool::load_def_init) call.
#[derive(Clone, Copy, Debug)]
pub struct DefInit<'a> {
    /// Units this file imports.
    pub deps: &'a [&'a DefInit<'a>],
    /// Layouts to adopt instead of compiling.
    pub layout: Option<&'a MiniTableFile>,
    /// The file name, checked before anything is decoded.
    pub filename: &'a str,
    /// A serialized `FileDescriptorProto`.
    pub descriptor: &'a [u8],
}
