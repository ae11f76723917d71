//! Owner of every compiled table, addressed by id.
//!
//! Tables refer to each other through [`MiniTableId`] and
//! [`MiniTableEnumId`] rather than pointers, so a store can hold mutually
//! recursive messages. Ids are only meaningful within the store that
//! issued them.

use hpb_core::{FieldType, Platform};

use crate::enum_table::MiniTableEnum;
use crate::error::MiniTableError;
use crate::extension::MiniTableExtension;
use crate::field::FieldMode;
use crate::file::MiniTableFile;
use crate::id::{MiniTableEnumId, MiniTableExtensionId, MiniTableId};
use crate::message::{MiniTable, MiniTableSub};

/// Store lengths captured by [`LayoutStore::mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreMark {
    msgs: usize,
    enums: usize,
    exts: usize,
}

/// Append-only arena of compiled layouts.
#[derive(Debug)]
pub struct LayoutStore {
    platform: Platform,
    msgs: Vec<MiniTable>,
    enums: Vec<MiniTableEnum>,
    exts: Vec<MiniTableExtension>,
}

impl LayoutStore {
    /// Create an empty store compiling for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform: platform.resolve(),
            msgs: Vec::new(),
            enums: Vec::new(),
            exts: Vec::new(),
        }
    }

    /// Target platform of every layout in the store.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Change the target platform. Only valid while the store is empty.
    pub fn set_platform(&mut self, platform: Platform) -> bool {
        if !self.is_empty() {
            return false;
        }
        self.platform = platform.resolve();
        true
    }

    /// Whether the store holds no tables.
    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty() && self.enums.is_empty() && self.exts.is_empty()
    }

    /// Add a message layout.
    pub fn add_message(&mut self, table: MiniTable) -> MiniTableId {
        self.msgs.push(table);
        MiniTableId(self.msgs.len() as u32 - 1)
    }

    /// Add an enum table.
    pub fn add_enum(&mut self, table: MiniTableEnum) -> MiniTableEnumId {
        self.enums.push(table);
        MiniTableEnumId(self.enums.len() as u32 - 1)
    }

    /// Add an extension layout.
    pub fn add_extension(&mut self, ext: MiniTableExtension) -> MiniTableExtensionId {
        self.exts.push(ext);
        MiniTableExtensionId(self.exts.len() as u32 - 1)
    }

    /// The message layout `id`.
    pub fn message(&self, id: MiniTableId) -> Option<&MiniTable> {
        self.msgs.get(id.0 as usize)
    }

    /// The enum table `id`.
    pub fn enum_table(&self, id: MiniTableEnumId) -> Option<&MiniTableEnum> {
        self.enums.get(id.0 as usize)
    }

    /// The extension layout `id`.
    pub fn extension(&self, id: MiniTableExtensionId) -> Option<&MiniTableExtension> {
        self.exts.get(id.0 as usize)
    }

    /// Number of message layouts.
    pub fn message_count(&self) -> usize {
        self.msgs.len()
    }

    /// Number of enum tables.
    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Number of extension layouts.
    pub fn extension_count(&self) -> usize {
        self.exts.len()
    }

    /// Capture the current lengths for a later [`truncate`](Self::truncate).
    pub fn mark(&self) -> StoreMark {
        StoreMark {
            msgs: self.msgs.len(),
            enums: self.enums.len(),
            exts: self.exts.len(),
        }
    }

    /// Drop every table added after `mark`.
    pub fn truncate(&mut self, mark: StoreMark) {
        self.msgs.truncate(mark.msgs);
        self.enums.truncate(mark.enums);
        self.exts.truncate(mark.exts);
    }

    /// Attach `sub` to field `field_index` of `table`.
    ///
    /// Only message and group fields accept a sub-message. A map-entry
    /// sub switches a message field to [`FieldMode::Map`], unless `table`
    /// is itself a map entry; groups never take a map entry.
    pub fn set_sub_message(
        &mut self,
        table: MiniTableId,
        field_index: usize,
        sub: MiniTableId,
    ) -> Result<(), MiniTableError> {
        let sub_is_map = self
            .message(sub)
            .map(MiniTable::is_map_entry)
            .ok_or(MiniTableError::InvalidSubMessage { number: 0 })?;
        let t = self
            .msgs
            .get_mut(table.0 as usize)
            .ok_or(MiniTableError::InvalidSubMessage { number: 0 })?;
        let table_is_map = t.is_map_entry();
        let field = t
            .fields
            .get_mut(field_index)
            .ok_or(MiniTableError::InvalidSubMessage { number: 0 })?;
        let invalid = MiniTableError::InvalidSubMessage {
            number: field.number,
        };
        match field.descriptor_type {
            FieldType::Message => {
                if sub_is_map {
                    if table_is_map {
                        return Err(invalid);
                    }
                    field.mode = FieldMode::Map;
                }
            }
            FieldType::Group if !sub_is_map => {}
            _ => return Err(invalid),
        }
        let slot = field.sub_index.ok_or(invalid.clone())? as usize;
        match t.subs.get_mut(slot) {
            Some(s @ MiniTableSub::Message(_)) => {
                *s = MiniTableSub::Message(Some(sub));
                Ok(())
            }
            _ => Err(invalid),
        }
    }

    /// Attach `sub` to the closed-enum field `field_index` of `table`.
    pub fn set_sub_enum(
        &mut self,
        table: MiniTableId,
        field_index: usize,
        sub: MiniTableEnumId,
    ) -> Result<(), MiniTableError> {
        if self.enum_table(sub).is_none() {
            return Err(MiniTableError::InvalidSubEnum { number: 0 });
        }
        let t = self
            .msgs
            .get_mut(table.0 as usize)
            .ok_or(MiniTableError::InvalidSubEnum { number: 0 })?;
        let field = t
            .fields
            .get(field_index)
            .ok_or(MiniTableError::InvalidSubEnum { number: 0 })?;
        let invalid = MiniTableError::InvalidSubEnum {
            number: field.number,
        };
        if !field.is_closed_enum() {
            return Err(invalid);
        }
        let slot = field.sub_index.ok_or(invalid.clone())? as usize;
        match t.subs.get_mut(slot) {
            Some(s @ MiniTableSub::Enum(_)) => {
                *s = MiniTableSub::Enum(Some(sub));
                Ok(())
            }
            _ => Err(invalid),
        }
    }

    /// Link every sub-table slot of `table` in field order: `msgs` feeds
    /// the message and group fields, `enums` the closed-enum fields. Both
    /// lists must be consumed exactly.
    pub fn link(
        &mut self,
        table: MiniTableId,
        msgs: &[MiniTableId],
        enums: &[MiniTableEnumId],
    ) -> Result<(), MiniTableError> {
        let Some(t) = self.message(table) else {
            return Err(MiniTableError::InvalidSubMessage { number: 0 });
        };
        let sub_fields: Vec<(usize, u32, bool)> = t
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_sub_message() || f.is_closed_enum())
            .map(|(i, f)| (i, f.number, f.is_sub_message()))
            .collect();

        let mut next_msg = msgs.iter();
        let mut next_enum = enums.iter();
        for &(i, number, _) in sub_fields.iter().filter(|(_, _, m)| *m) {
            let sub = next_msg
                .next()
                .ok_or(MiniTableError::InvalidSubMessage { number })?;
            self.set_sub_message(table, i, *sub)?;
        }
        for &(i, number, _) in sub_fields.iter().filter(|(_, _, m)| !*m) {
            let sub = next_enum
                .next()
                .ok_or(MiniTableError::InvalidSubEnum { number })?;
            self.set_sub_enum(table, i, *sub)?;
        }
        if next_msg.next().is_some() {
            return Err(MiniTableError::InvalidSubMessage { number: 0 });
        }
        if next_enum.next().is_some() {
            return Err(MiniTableError::InvalidSubEnum { number: 0 });
        }
        Ok(())
    }

    /// Point extension `id` at `extendee` and `sub`.
    ///
    /// Used after importing precompiled extensions, whose ids belong to
    /// the store that exported them.
    pub fn set_extension_links(
        &mut self,
        id: MiniTableExtensionId,
        extendee: MiniTableId,
        sub: MiniTableSub,
    ) -> bool {
        match self.exts.get_mut(id.0 as usize) {
            Some(ext) => {
                ext.extendee = extendee;
                ext.sub = sub;
                true
            }
            None => false,
        }
    }

    /// Copy the listed tables out of the store.
    pub fn export(
        &self,
        msgs: &[MiniTableId],
        enums: &[MiniTableEnumId],
        exts: &[MiniTableExtensionId],
    ) -> MiniTableFile {
        MiniTableFile {
            msgs: msgs.iter().filter_map(|&id| self.message(id).cloned()).collect(),
            enums: enums.iter().filter_map(|&id| self.enum_table(id).cloned()).collect(),
            exts: exts.iter().filter_map(|&id| self.extension(id).cloned()).collect(),
        }
    }
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new(Platform::Native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MtDataEncoder;
    use crate::wire::field_modifier;
    use hpb_arena::Arena;

    fn table(f: impl FnOnce(&mut MtDataEncoder<'_>)) -> MiniTable {
        let mut buf = Vec::new();
        f(&mut MtDataEncoder::new(&mut buf));
        MiniTable::build(&buf, Platform::Bits64, &Arena::new()).unwrap()
    }

    fn map_entry() -> MiniTable {
        table(|e| e.encode_map(FieldType::String, FieldType::Int32, 0, 0).unwrap())
    }

    #[test]
    fn ids_are_sequential() {
        let mut s = LayoutStore::new(Platform::Bits64);
        assert_eq!(s.add_message(MiniTable::empty()), MiniTableId(0));
        assert_eq!(s.add_message(MiniTable::empty()), MiniTableId(1));
        assert_eq!(s.message_count(), 2);
        assert!(!s.set_platform(Platform::Bits32));
    }

    #[test]
    fn truncate_rolls_back_to_mark() {
        let mut s = LayoutStore::new(Platform::Bits64);
        s.add_message(MiniTable::empty());
        let mark = s.mark();
        s.add_message(MiniTable::empty());
        s.add_enum(MiniTableEnum::build(b"!", &Arena::new()).unwrap());
        s.truncate(mark);
        assert_eq!(s.message_count(), 1);
        assert_eq!(s.enum_count(), 0);
    }

    #[test]
    fn link_attaches_subs_in_field_order() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let parent = s.add_message(table(|e| {
            e.start_message(0);
            e.put_field(FieldType::Message, 1, 0).unwrap();
            e.put_field(FieldType::Enum, 2, field_modifier::IS_CLOSED_ENUM)
                .unwrap();
            e.put_field(FieldType::Group, 3, 0).unwrap();
        }));
        let a = s.add_message(MiniTable::empty());
        let b = s.add_message(MiniTable::empty());
        let en = s.add_enum(MiniTableEnum::build(b"!)", &Arena::new()).unwrap());
        s.link(parent, &[a, b], &[en]).unwrap();

        let t = s.message(parent).unwrap();
        assert_eq!(t.sub_message(t.field(0).unwrap()), Some(a));
        assert_eq!(t.sub_message(t.field(2).unwrap()), Some(b));
        assert_eq!(t.sub_enum(t.field(1).unwrap()), Some(en));
    }

    #[test]
    fn link_rejects_count_mismatch() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let parent = s.add_message(table(|e| {
            e.start_message(0);
            e.put_field(FieldType::Message, 1, 0).unwrap();
        }));
        let a = s.add_message(MiniTable::empty());
        assert!(s.link(parent, &[], &[]).is_err());
        assert!(s.link(parent, &[a, a], &[]).is_err());
    }

    #[test]
    fn map_entry_sub_makes_map_field() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let parent = s.add_message(table(|e| {
            e.start_message(0);
            e.put_field(FieldType::Message, 1, field_modifier::IS_REPEATED)
                .unwrap();
            e.put_field(FieldType::Group, 2, 0).unwrap();
        }));
        let entry = s.add_message(map_entry());
        s.set_sub_message(parent, 0, entry).unwrap();
        assert!(s.message(parent).unwrap().field(0).unwrap().is_map());
        assert_eq!(
            s.set_sub_message(parent, 1, entry),
            Err(MiniTableError::InvalidSubMessage { number: 2 })
        );
    }

    #[test]
    fn map_entry_cannot_nest_map_entry() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let outer = s.add_message(table(|e| {
            e.encode_map(FieldType::Int32, FieldType::Message, 0, 0)
                .unwrap()
        }));
        let inner = s.add_message(map_entry());
        assert!(s.set_sub_message(outer, 1, inner).is_err());
    }

    #[test]
    fn scalar_fields_reject_subs() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let t = s.add_message(table(|e| {
            e.start_message(0);
            e.put_field(FieldType::Int32, 1, 0).unwrap();
            e.put_field(FieldType::Enum, 2, 0).unwrap();
        }));
        let m = s.add_message(MiniTable::empty());
        let en = s.add_enum(MiniTableEnum::build(b"!", &Arena::new()).unwrap());
        assert!(s.set_sub_message(t, 0, m).is_err());
        // Open enums carry no sub slot.
        assert_eq!(
            s.set_sub_enum(t, 1, en),
            Err(MiniTableError::InvalidSubEnum { number: 2 })
        );
    }

    #[test]
    fn export_copies_tables() {
        let mut s = LayoutStore::new(Platform::Bits64);
        let m = s.add_message(map_entry());
        let file = s.export(&[m], &[], &[]);
        assert_eq!(file.msgs.len(), 1);
        assert!(file.msgs[0].is_map_entry());
    }
}
