//! The def pool: every loaded file and the tables that index them.

use hpb_arena::Arena;
use hpb_core::Platform;
use hpb_descriptor::{FileDescriptorProto, FileDescriptorSet, Message};
use hpb_mini::{ExtensionRegistry, LayoutStore, MiniTableExtensionId, MiniTableFile, StoreMark};
use hpb_table::{IntTable, StrTable, BEGIN};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::builder::Builder;
use crate::config::PoolConfig;
use crate::enum_def::{EnumDef, EnumValueDef};
use crate::error::DefError;
use crate::field::FieldDef;
use crate::file::FileDef;
use crate::id::{EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId};
use crate::init::DefInit;
use crate::message::MessageDef;
use crate::oneof::OneofDef;
use crate::service::{MethodDef, ServiceDef};
use crate::symbol::DefRef;

/// A set of loaded `.proto` files and everything they define.
///
/// Files are added one at a time, dependencies first. A file either loads
/// completely or leaves the pool untouched. Defs are addressed by typed
/// ids; indexing with an id from another pool panics or returns an
/// unrelated def.
#[derive(Debug)]
pub struct DefPool {
    pub(crate) arena: Arena,
    pub(crate) config: PoolConfig,
    pub(crate) scratch: Vec<u8>,
    bytes_loaded: usize,
    pub(crate) symbols: StrTable,
    pub(crate) files_by_name: StrTable,
    pub(crate) extensions_by_layout: IntTable,
    pub(crate) registry: ExtensionRegistry,
    pub(crate) layouts: LayoutStore,
    pub(crate) files: Vec<FileDef>,
    pub(crate) messages: Vec<MessageDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) oneofs: Vec<OneofDef>,
    pub(crate) enums: Vec<EnumDef>,
    pub(crate) enum_values: Vec<EnumValueDef>,
    pub(crate) services: Vec<ServiceDef>,
    pub(crate) methods: Vec<MethodDef>,
}

/// Per-kind lengths captured before a build, for rollback.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PoolMark {
    pub(crate) files: usize,
    pub(crate) messages: usize,
    pub(crate) fields: usize,
    pub(crate) oneofs: usize,
    pub(crate) enums: usize,
    pub(crate) enum_values: usize,
    pub(crate) services: usize,
    pub(crate) methods: usize,
    pub(crate) layouts: StoreMark,
    pub(crate) ext_layouts: usize,
}

impl PoolMark {
    /// Whether `r` was created after this mark.
    fn owns(&self, r: DefRef) -> bool {
        match r {
            DefRef::Extension(id) => id.index() >= self.fields,
            DefRef::Message(id) => id.index() >= self.messages,
            DefRef::Enum(id) => id.index() >= self.enums,
            DefRef::EnumValue(id) => id.index() >= self.enum_values,
            DefRef::Service(id) => id.index() >= self.services,
        }
    }
}

impl DefPool {
    /// Create an empty pool with the default configuration.
    pub fn new() -> Result<Self, DefError> {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool.
    pub fn with_config(config: PoolConfig) -> Result<Self, DefError> {
        let arena = Arena::with_config(&config.arena);
        let symbols = StrTable::new(config.symbol_table_size, &arena)?;
        let files_by_name = StrTable::new(config.file_table_size, &arena)?;
        let extensions_by_layout = IntTable::new(&arena)?;
        let registry = ExtensionRegistry::with_capacity(config.registry_size, &config.arena)
            .map_err(|e| DefError::layout("extension registry", e))?;
        Ok(Self {
            scratch: Vec::with_capacity(config.scratch_size),
            layouts: LayoutStore::new(config.platform),
            arena,
            config,
            bytes_loaded: 0,
            symbols,
            files_by_name,
            extensions_by_layout,
            registry,
            files: Vec::new(),
            messages: Vec::new(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            enums: Vec::new(),
            enum_values: Vec::new(),
            services: Vec::new(),
            methods: Vec::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The configuration the pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The file `id`.
    pub fn file(&self, id: FileId) -> &FileDef {
        &self.files[id.index()]
    }

    /// The message `id`.
    pub fn message(&self, id: MessageId) -> &MessageDef {
        &self.messages[id.index()]
    }

    /// The field or extension `id`.
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    /// The oneof `id`.
    pub fn oneof(&self, id: OneofId) -> &OneofDef {
        &self.oneofs[id.index()]
    }

    /// The enum `id`.
    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.index()]
    }

    /// The enum value `id`.
    pub fn enum_value(&self, id: EnumValueId) -> &EnumValueDef {
        &self.enum_values[id.index()]
    }

    /// The service `id`.
    pub fn service(&self, id: ServiceId) -> &ServiceDef {
        &self.services[id.index()]
    }

    /// The method `id`.
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    /// Number of loaded files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Every compiled layout of the pool.
    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }

    /// Target platform of layout compilation.
    pub fn platform(&self) -> Platform {
        self.layouts.platform()
    }

    /// Change the layout target. Fails once any file is loaded.
    pub fn set_platform(&mut self, platform: Platform) -> Result<(), DefError> {
        if !self.files.is_empty() || !self.layouts.set_platform(platform) {
            return Err(DefError::PlatformLocked);
        }
        self.config.platform = platform;
        Ok(())
    }

    /// Serialized descriptor bytes loaded through
    /// [`add_file_bytes`](Self::add_file_bytes) and
    /// [`load_def_init`](Self::load_def_init).
    pub fn bytes_loaded(&self) -> usize {
        self.bytes_loaded
    }

    /// The pool arena. Build arenas are fused into it.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The registry of every loaded extension layout.
    pub fn extension_registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Look up any fully qualified symbol.
    pub fn find_symbol(&self, name: &str) -> Option<DefRef> {
        self.symbols.lookup(name.as_bytes()).and_then(DefRef::unpack)
    }

    /// Look up a message by full name.
    pub fn find_message_by_name(&self, name: &str) -> Option<MessageId> {
        match self.find_symbol(name)? {
            DefRef::Message(id) => Some(id),
            _ => None,
        }
    }

    /// Look up an enum by full name.
    pub fn find_enum_by_name(&self, name: &str) -> Option<EnumId> {
        match self.find_symbol(name)? {
            DefRef::Enum(id) => Some(id),
            _ => None,
        }
    }

    /// Look up an enum value by full name, e.g. `pkg.VALUE`.
    pub fn find_enum_value_by_name(&self, name: &str) -> Option<EnumValueId> {
        match self.find_symbol(name)? {
            DefRef::EnumValue(id) => Some(id),
            _ => None,
        }
    }

    /// Look up a service by full name.
    pub fn find_service_by_name(&self, name: &str) -> Option<ServiceId> {
        match self.find_symbol(name)? {
            DefRef::Service(id) => Some(id),
            _ => None,
        }
    }

    /// Look up a loaded file by name.
    pub fn find_file_by_name(&self, name: &str) -> Option<FileId> {
        self.files_by_name
            .lookup(name.as_bytes())
            .map(|v| FileId(v as u32))
    }

    /// Look up an extension by full name.
    ///
    /// A message that declares the message-set extension of itself also
    /// resolves, to that extension.
    pub fn find_extension_by_name(&self, name: &str) -> Option<FieldId> {
        match self.find_symbol(name)? {
            DefRef::Extension(id) => Some(id),
            DefRef::Message(id) => {
                let m = self.message(id);
                if m.in_message_set() {
                    m.nested_extensions().first().copied()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Look up the extension `number` of `message`.
    pub fn find_extension_by_number(&self, message: MessageId, number: u32) -> Option<FieldId> {
        let ext = self.registry.lookup(self.message(message).layout(), number)?;
        self.find_extension_by_mini_table(ext)
    }

    /// Map a compiled extension layout back to its def.
    pub fn find_extension_by_mini_table(&self, ext: MiniTableExtensionId) -> Option<FieldId> {
        self.extensions_by_layout
            .lookup(u64::from(ext.0))
            .map(|v| FieldId(v as u32))
    }

    /// The file that defines `name`.
    ///
    /// Besides symbols, this accepts a field or oneof name qualified by its
    /// message.
    pub fn find_file_containing_symbol(&self, name: &str) -> Option<FileId> {
        if let Some(r) = self.find_symbol(name) {
            return Some(self.def_file(r));
        }
        let (parent, short) = name.rsplit_once('.')?;
        let msg = self.message(self.find_message_by_name(parent)?);
        msg.find_by_name(short)?;
        Some(msg.file())
    }

    /// Every loaded extension of `message`, in load order.
    pub fn get_all_extensions(&self, message: MessageId) -> Vec<FieldId> {
        let mut out: Vec<FieldId> = self
            .extensions_by_layout
            .iter()
            .map(|(_, v)| FieldId(v as u32))
            .filter(|&f| self.field(f).containing_type() == message)
            .collect();
        out.sort_unstable();
        out
    }

    fn def_file(&self, r: DefRef) -> FileId {
        match r {
            DefRef::Extension(id) => self.field(id).file(),
            DefRef::Message(id) => self.message(id).file(),
            DefRef::Enum(id) => self.enum_def(id).file(),
            DefRef::EnumValue(id) => self.enum_def(self.enum_value(id).enum_def()).file(),
            DefRef::Service(id) => self.service(id).file(),
        }
    }

    // ── Loading ────────────────────────────────────────────────────

    /// Build `proto` and add it to the pool.
    ///
    /// Every dependency must already be loaded. On error nothing of the
    /// file remains reachable.
    pub fn add_file(&mut self, proto: &FileDescriptorProto) -> Result<FileId, DefError> {
        self.build(proto, None)
    }

    /// Like [`add_file`](Self::add_file), with layouts compiled earlier
    /// (see [`FileDef::mini_table_file`]). The layout counts must match the
    /// file.
    pub fn add_file_with_layout(
        &mut self,
        proto: &FileDescriptorProto,
        layout: &MiniTableFile,
    ) -> Result<FileId, DefError> {
        self.build(proto, Some(layout))
    }

    /// Decode a serialized `FileDescriptorProto` and add it.
    pub fn add_file_bytes(&mut self, bytes: &[u8]) -> Result<FileId, DefError> {
        let proto = FileDescriptorProto::decode(bytes)?;
        let id = self.add_file(&proto)?;
        self.bytes_loaded += bytes.len();
        Ok(id)
    }

    /// Add every file of `set`, each after the set members it imports.
    ///
    /// Files that are already loaded are skipped. Returns the ids in load
    /// order. Stops at the first failure; files loaded before it stay.
    pub fn add_file_set(&mut self, set: &FileDescriptorSet) -> Result<Vec<FileId>, DefError> {
        let mut pending: IndexMap<&str, &FileDescriptorProto> =
            set.file.iter().map(|f| (f.name(), f)).collect();
        let mut loaded = Vec::with_capacity(pending.len());
        while let Some((_, proto)) = pending.shift_remove_index(0) {
            self.add_with_deps(proto, &mut pending, &mut loaded)?;
        }
        Ok(loaded)
    }

    fn add_with_deps<'s>(
        &mut self,
        proto: &'s FileDescriptorProto,
        pending: &mut IndexMap<&'s str, &'s FileDescriptorProto>,
        loaded: &mut Vec<FileId>,
    ) -> Result<(), DefError> {
        for dep in &proto.dependency {
            if let Some(dep_proto) = pending.shift_remove(dep.as_str()) {
                self.add_with_deps(dep_proto, pending, loaded)?;
            }
        }
        if self.find_file_by_name(proto.name()).is_none() {
            loaded.push(self.add_file(proto)?);
        }
        Ok(())
    }

    /// Load a bootstrap unit and, first, everything it depends on.
    ///
    /// Units whose file is already loaded are skipped.
    pub fn load_def_init(&mut self, init: &DefInit<'_>) -> Result<FileId, DefError> {
        if let Some(id) = self.find_file_by_name(init.filename) {
            return Ok(id);
        }
        for dep in init.deps {
            self.load_def_init(dep)?;
        }
        let proto = FileDescriptorProto::decode(init.descriptor)?;
        let id = match init.layout {
            Some(layout) => self.add_file_with_layout(&proto, layout)?,
            None => self.add_file(&proto)?,
        };
        self.bytes_loaded += init.descriptor.len();
        Ok(id)
    }

    fn build(
        &mut self,
        proto: &FileDescriptorProto,
        layout: Option<&MiniTableFile>,
    ) -> Result<FileId, DefError> {
        let mark = self.mark();
        let arena = Arena::with_config(&self.config.arena);
        let result = Builder::new(self, &arena, layout).build(proto);
        match result {
            Ok(id) => {
                let used = arena.bytes_used();
                self.arena.fuse(arena);
                debug!(
                    file = proto.name(),
                    messages = self.messages.len() - mark.messages,
                    enums = self.enums.len() - mark.enums,
                    fields = self.fields.len() - mark.fields,
                    bytes = used,
                    "file loaded"
                );
                Ok(id)
            }
            Err(e) => {
                self.rollback(mark);
                debug!(file = proto.name(), error = %e, "file rejected");
                Err(e)
            }
        }
    }

    pub(crate) fn mark(&self) -> PoolMark {
        PoolMark {
            files: self.files.len(),
            messages: self.messages.len(),
            fields: self.fields.len(),
            oneofs: self.oneofs.len(),
            enums: self.enums.len(),
            enum_values: self.enum_values.len(),
            services: self.services.len(),
            methods: self.methods.len(),
            layouts: self.layouts.mark(),
            ext_layouts: self.layouts.extension_count(),
        }
    }

    /// Undo everything added since `mark`.
    fn rollback(&mut self, mark: PoolMark) {
        let mut swept = 0usize;
        let mut cursor = BEGIN;
        loop {
            let Some(word) = self.symbols.next(&mut cursor).map(|(_, v)| v) else {
                break;
            };
            if DefRef::unpack(word).is_some_and(|r| mark.owns(r)) {
                self.symbols.remove_iter(&mut cursor);
                swept += 1;
            }
        }

        if let Some(file) = self.files.get(mark.files) {
            if self.find_file_by_name(&file.name) == Some(FileId(mark.files as u32)) {
                self.files_by_name.remove(file.name.as_bytes());
            }
        }

        for i in mark.ext_layouts..self.layouts.extension_count() {
            let id = MiniTableExtensionId(i as u32);
            if let Some(ext) = self.layouts.extension(id) {
                let (extendee, number) = (ext.extendee(), ext.number());
                if self.registry.lookup(extendee, number) == Some(id) {
                    self.registry.remove(extendee, number);
                }
            }
            self.extensions_by_layout.remove(i as u64);
        }

        self.files.truncate(mark.files);
        self.messages.truncate(mark.messages);
        self.fields.truncate(mark.fields);
        self.oneofs.truncate(mark.oneofs);
        self.enums.truncate(mark.enums);
        self.enum_values.truncate(mark.enum_values);
        self.services.truncate(mark.services);
        self.methods.truncate(mark.methods);
        self.layouts.truncate(mark.layouts);
        warn!(symbols = swept, "rolled back partially built file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpb_core::FieldType;
    use hpb_test_utils::fixtures::{shop, shop_ext};
    use hpb_test_utils::*;
    use tracing_test::traced_test;

    fn broken() -> FileDescriptorProto {
        let mut f = file("broken.proto", "broken");
        f.message_type.push(message("Ok", Vec::new()));
        f.message_type
            .push(message("Bad", vec![typed("x", 1, FieldType::Message, "Missing")]));
        f
    }

    #[traced_test]
    #[test]
    fn loading_logs_the_file() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&shop()).unwrap();
        assert!(logs_contain("file loaded"));
        assert!(logs_contain("shop.proto"));
        assert!(!logs_contain("rolled back"));
    }

    #[traced_test]
    #[test]
    fn rejection_logs_rollback() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&broken()).unwrap_err();
        assert!(logs_contain("rolled back partially built file"));
        assert!(logs_contain("file rejected"));
        assert!(logs_contain("broken.proto"));
    }

    #[test]
    fn rollback_sweeps_only_new_symbols() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&shop()).unwrap();
        let before = pool.symbols.count();
        pool.add_file(&broken()).unwrap_err();
        assert_eq!(pool.symbols.count(), before);
        assert!(pool.find_message_by_name("broken.Ok").is_none());
        assert!(pool.find_file_by_name("broken.proto").is_none());
        assert_eq!(pool.file_count(), 1);
    }

    #[test]
    fn rollback_unregisters_extensions() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&shop()).unwrap();
        let mut f = shop_ext();
        f.message_type[0]
            .field
            .push(typed("bad", 2, FieldType::Message, "Missing"));
        pool.add_file(&f).unwrap_err();
        assert_eq!(pool.registry.len(), 0);
        assert_eq!(pool.extensions_by_layout.count(), 0);
        assert_eq!(pool.layouts.extension_count(), 0);

        pool.add_file(&shop_ext()).unwrap();
        assert_eq!(pool.registry.len(), 2);
    }

    #[test]
    fn failed_file_does_not_count_bytes() {
        let mut pool = DefPool::new().unwrap();
        let bytes = broken().encode_to_vec();
        pool.add_file_bytes(&bytes).unwrap_err();
        assert_eq!(pool.bytes_loaded(), 0);
    }

    #[test]
    fn arena_grows_only_on_success() {
        let mut pool = DefPool::new().unwrap();
        let start = pool.arena().fused_count();
        pool.add_file(&broken()).unwrap_err();
        assert_eq!(pool.arena().fused_count(), start);
        pool.add_file(&shop()).unwrap();
        assert_eq!(pool.arena().fused_count(), start + 1);
    }
}
