//! Precompiled layouts for one file.

use crate::enum_table::MiniTableEnum;
use crate::extension::MiniTableExtension;
use crate::message::MiniTable;

/// The compiled layouts of one `.proto` file, in declaration order.
///
/// `msgs` follows a depth-first walk of the file's messages, `enums` holds
/// only closed enums, and `exts` lists top-level extensions before nested
/// ones. Sub-table and extendee ids inside the tables refer to the store
/// they were exported from; importing relinks them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MiniTableFile {
    /// Message layouts.
    pub msgs: Vec<MiniTable>,
    /// Closed-enum tables.
    pub enums: Vec<MiniTableEnum>,
    /// Extension layouts.
    pub exts: Vec<MiniTableExtension>,
}

impl MiniTableFile {
    /// A file with no layouts.
    pub fn new() -> Self {
        Self::default()
    }
}
