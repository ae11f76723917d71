//! Loaded `.proto` files.

use std::ops::Range;

use hpb_core::Syntax;
use hpb_descriptor::{FileOptions, Options};
use hpb_mini::{MiniTableEnumId, MiniTableExtensionId, MiniTableFile, MiniTableId};

use crate::id::{EnumId, FieldId, FileId, MessageId, ServiceId};
use crate::pool::DefPool;

/// One loaded file.
#[derive(Debug)]
pub struct FileDef {
    pub(crate) name: String,
    pub(crate) package: String,
    pub(crate) syntax: Syntax,
    pub(crate) edition: Option<i32>,
    pub(crate) deps: Vec<FileId>,
    pub(crate) public_deps: Vec<FileId>,
    pub(crate) weak_deps: Vec<FileId>,
    pub(crate) messages: Vec<MessageId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) extensions: Vec<FieldId>,
    pub(crate) services: Vec<ServiceId>,
    pub(crate) options: Option<Options<FileOptions>>,
    /// Layout ids issued for this file, contiguous per kind.
    pub(crate) layout_msgs: Range<u32>,
    pub(crate) layout_enums: Range<u32>,
    pub(crate) layout_exts: Range<u32>,
}

impl FileDef {
    /// File name, e.g. `"google/protobuf/any.proto"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package, or `""`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Declared syntax.
    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Declared edition, if any.
    pub fn edition(&self) -> Option<i32> {
        self.edition
    }

    /// Every imported file, in declaration order.
    pub fn dependencies(&self) -> &[FileId] {
        &self.deps
    }

    /// The `import public` subset of [`dependencies`](Self::dependencies).
    pub fn public_dependencies(&self) -> &[FileId] {
        &self.public_deps
    }

    /// The `import weak` subset of [`dependencies`](Self::dependencies).
    pub fn weak_dependencies(&self) -> &[FileId] {
        &self.weak_deps
    }

    /// Top-level messages.
    pub fn messages(&self) -> &[MessageId] {
        &self.messages
    }

    /// Top-level enums.
    pub fn enums(&self) -> &[EnumId] {
        &self.enums
    }

    /// Top-level extensions.
    pub fn extensions(&self) -> &[FieldId] {
        &self.extensions
    }

    /// Services.
    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    /// `FileOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<FileOptions>> {
        self.options.as_ref()
    }

    /// Copy this file's compiled layouts out of `pool`.
    ///
    /// The result can be handed to
    /// [`DefPool::add_file_with_layout`] on another pool to skip layout
    /// compilation there.
    pub fn mini_table_file(&self, pool: &DefPool) -> MiniTableFile {
        let msgs: Vec<MiniTableId> = self.layout_msgs.clone().map(MiniTableId).collect();
        let enums: Vec<MiniTableEnumId> = self.layout_enums.clone().map(MiniTableEnumId).collect();
        let exts: Vec<MiniTableExtensionId> =
            self.layout_exts.clone().map(MiniTableExtensionId).collect();
        pool.layouts().export(&msgs, &enums, &exts)
    }
}
