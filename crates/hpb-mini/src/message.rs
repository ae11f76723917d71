//! Compiled message layouts.

use hpb_arena::Arena;
use hpb_core::Platform;

use crate::decode;
use crate::error::MiniTableError;
use crate::field::MiniTableField;
use crate::id::{MiniTableEnumId, MiniTableId};

/// Extension and special-encoding class of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtMode {
    /// No extension ranges.
    NonExtendable,
    /// Declares extension ranges.
    Extendable,
    /// Uses the message-set wire format.
    IsMessageSet,
    /// A synthesized map entry.
    IsMapEntry,
}

/// A sub-table slot of a message layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiniTableSub {
    /// Sub-message slot; `None` until linked.
    Message(Option<MiniTableId>),
    /// Closed-enum slot; `None` until linked.
    Enum(Option<MiniTableEnumId>),
}

/// A compiled message layout.
///
/// Fields are stored in ascending number order. Sub-message slots come
/// before sub-enum slots in [`subs`](Self::subs).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiniTable {
    pub(crate) fields: Vec<MiniTableField>,
    pub(crate) subs: Vec<MiniTableSub>,
    pub(crate) size: u16,
    pub(crate) ext: ExtMode,
    pub(crate) dense_below: usize,
    pub(crate) required_count: u8,
}

impl MiniTable {
    /// An empty, non-extendable layout.
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            subs: Vec::new(),
            size: 0,
            ext: ExtMode::NonExtendable,
            dense_below: 0,
            required_count: 0,
        }
    }

    /// Compile a message, map or message-set descriptor for `platform`.
    pub fn build(data: &[u8], platform: Platform, arena: &Arena) -> Result<Self, MiniTableError> {
        decode::build_message(data, platform, arena)
    }

    /// All fields in number order.
    pub fn fields(&self) -> &[MiniTableField] {
        &self.fields
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field at layout position `i`.
    pub fn field(&self, i: usize) -> Option<&MiniTableField> {
        self.fields.get(i)
    }

    /// Look up a field by number.
    pub fn find_field_by_number(&self, number: u32) -> Option<&MiniTableField> {
        if number >= 1 && (number as usize) <= self.dense_below {
            return self.fields.get(number as usize - 1);
        }
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|i| &self.fields[i])
    }

    /// Layout position of the field with `number`.
    pub fn field_index(&self, number: u32) -> Option<usize> {
        self.fields.binary_search_by_key(&number, |f| f.number).ok()
    }

    /// Sub-table slots.
    pub fn subs(&self) -> &[MiniTableSub] {
        &self.subs
    }

    /// The linked sub-message of `field`, if any.
    pub fn sub_message(&self, field: &MiniTableField) -> Option<MiniTableId> {
        match self.subs.get(field.sub_index? as usize)? {
            MiniTableSub::Message(id) => *id,
            MiniTableSub::Enum(_) => None,
        }
    }

    /// The linked sub-enum of `field`, if any.
    pub fn sub_enum(&self, field: &MiniTableField) -> Option<MiniTableEnumId> {
        match self.subs.get(field.sub_index? as usize)? {
            MiniTableSub::Enum(id) => *id,
            MiniTableSub::Message(_) => None,
        }
    }

    /// Message size in bytes, a multiple of 8.
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Extension class.
    pub fn ext_mode(&self) -> ExtMode {
        self.ext
    }

    /// Whether this is a map entry.
    pub fn is_map_entry(&self) -> bool {
        self.ext == ExtMode::IsMapEntry
    }

    /// Whether this uses the message-set wire format.
    pub fn is_message_set(&self) -> bool {
        self.ext == ExtMode::IsMessageSet
    }

    /// Number of leading fields numbered `1..=n` without a gap.
    pub fn dense_below(&self) -> usize {
        self.dense_below
    }

    /// Number of required fields; they hold hasbits `1..=required_count`.
    pub fn required_count(&self) -> u8 {
        self.required_count
    }
}

impl Default for MiniTable {
    fn default() -> Self {
        Self::empty()
    }
}
