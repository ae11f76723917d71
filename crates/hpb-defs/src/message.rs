//! Message types.

use hpb_core::Syntax;
use hpb_descriptor::{ExtensionRangeOptions, MessageOptions, Options};
use hpb_mini::{message_modifier, MiniTable, MiniTableId, MtDataEncoder};
use hpb_table::{IntTable, StrTable};

use crate::error::DefError;
use crate::id::{EnumId, FieldId, FileId, MessageId, OneofId};
use crate::names;
use crate::pool::DefPool;
use crate::symbol::Member;
use crate::well_known::WellKnownType;

/// Largest legal field number, `2^29 - 1`.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// A range of field numbers reserved for extensions. `end` is exclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionRange {
    pub(crate) start: i32,
    pub(crate) end: i32,
    pub(crate) options: Option<Options<ExtensionRangeOptions>>,
}

impl ExtensionRange {
    /// First number in the range.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// One past the last number in the range.
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Range options, if any.
    pub fn options(&self) -> Option<&Options<ExtensionRangeOptions>> {
        self.options.as_ref()
    }

    /// Whether `number` falls in the range.
    pub fn contains(&self, number: i64) -> bool {
        i64::from(self.start) <= number && number < i64::from(self.end)
    }
}

/// A range of reserved field numbers. `end` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservedRange {
    pub(crate) start: i32,
    pub(crate) end: i32,
}

impl ReservedRange {
    /// First reserved number.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// One past the last reserved number.
    pub fn end(&self) -> i32 {
        self.end
    }
}

/// A message type.
#[derive(Debug)]
pub struct MessageDef {
    pub(crate) full_name: String,
    pub(crate) file: FileId,
    pub(crate) containing_type: Option<MessageId>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) oneofs: Vec<OneofId>,
    pub(crate) real_oneof_count: usize,
    pub(crate) nested_messages: Vec<MessageId>,
    pub(crate) nested_enums: Vec<EnumId>,
    pub(crate) nested_extensions: Vec<FieldId>,
    pub(crate) extension_ranges: Vec<ExtensionRange>,
    pub(crate) reserved_ranges: Vec<ReservedRange>,
    pub(crate) reserved_names: Vec<String>,
    /// Field number to field.
    pub(crate) itof: IntTable,
    /// Field, oneof and JSON names to members.
    pub(crate) ntof: StrTable,
    pub(crate) well_known_type: WellKnownType,
    pub(crate) is_map_entry: bool,
    pub(crate) is_message_set: bool,
    pub(crate) in_message_set: bool,
    pub(crate) layout: MiniTableId,
    pub(crate) options: Option<Options<MessageOptions>>,
}

impl MessageDef {
    /// Fully qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// The defining file.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// The enclosing message of a nested type.
    pub fn containing_type(&self) -> Option<MessageId> {
        self.containing_type
    }

    /// Regular fields in declaration order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// Number of regular fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The `i`th field in declaration order.
    pub fn field(&self, i: usize) -> Option<FieldId> {
        self.fields.get(i).copied()
    }

    /// Look a field up by number.
    pub fn find_field_by_number(&self, number: u32) -> Option<FieldId> {
        self.itof.lookup(u64::from(number)).map(|v| FieldId(v as u32))
    }

    /// Look a field up by declared name.
    pub fn find_field_by_name(&self, name: &str) -> Option<FieldId> {
        match self.find_member(name)? {
            Member::Field(id) => Some(id),
            _ => None,
        }
    }

    /// Look a oneof up by name.
    pub fn find_oneof_by_name(&self, name: &str) -> Option<OneofId> {
        match self.find_member(name)? {
            Member::Oneof(id) => Some(id),
            _ => None,
        }
    }

    /// Look a field or oneof up by name. JSON names do not match.
    pub fn find_by_name(&self, name: &str) -> Option<Member> {
        self.find_member(name)
            .filter(|m| !matches!(m, Member::JsonName(_)))
    }

    /// Look a field up by JSON name, falling back to its declared name.
    pub fn find_by_json_name(&self, name: &str) -> Option<FieldId> {
        match self.find_member(name)? {
            Member::Field(id) | Member::JsonName(id) => Some(id),
            Member::Oneof(_) => None,
        }
    }

    pub(crate) fn find_member(&self, name: &str) -> Option<Member> {
        self.ntof.lookup(name.as_bytes()).and_then(Member::unpack)
    }

    /// Oneofs, real ones first.
    pub fn oneofs(&self) -> &[OneofId] {
        &self.oneofs
    }

    /// The `i`th oneof.
    pub fn oneof(&self, i: usize) -> Option<OneofId> {
        self.oneofs.get(i).copied()
    }

    /// Oneofs that are not synthetic wrappers of proto3 `optional` fields.
    pub fn real_oneof_count(&self) -> usize {
        self.real_oneof_count
    }

    /// Directly nested messages.
    pub fn nested_messages(&self) -> &[MessageId] {
        &self.nested_messages
    }

    /// Directly nested enums.
    pub fn nested_enums(&self) -> &[EnumId] {
        &self.nested_enums
    }

    /// Extensions declared inside this message, of any extendee.
    pub fn nested_extensions(&self) -> &[FieldId] {
        &self.nested_extensions
    }

    /// Extension ranges.
    pub fn extension_ranges(&self) -> &[ExtensionRange] {
        &self.extension_ranges
    }

    /// Whether `number` lies in one of the extension ranges.
    pub fn is_valid_extension_number(&self, number: i64) -> bool {
        self.extension_ranges.iter().any(|r| r.contains(number))
    }

    /// Reserved number ranges.
    pub fn reserved_ranges(&self) -> &[ReservedRange] {
        &self.reserved_ranges
    }

    /// Reserved field names.
    pub fn reserved_names(&self) -> &[String] {
        &self.reserved_names
    }

    /// Special meaning, if this is a well-known type.
    pub fn well_known_type(&self) -> WellKnownType {
        self.well_known_type
    }

    /// Whether this is a synthesized map entry.
    pub fn is_map_entry(&self) -> bool {
        self.is_map_entry
    }

    /// Whether this uses the message-set wire format.
    pub fn is_message_set(&self) -> bool {
        self.is_message_set
    }

    /// Whether this message declares the canonical message-set extension
    /// of itself.
    pub fn in_message_set(&self) -> bool {
        self.in_message_set
    }

    /// Id of the compiled layout in the pool's store.
    pub fn layout(&self) -> MiniTableId {
        self.layout
    }

    /// The compiled layout.
    pub fn mini_table<'p>(&self, pool: &'p DefPool) -> Option<&'p MiniTable> {
        pool.layouts().message(self.layout)
    }

    /// `MessageOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<MessageOptions>> {
        self.options.as_ref()
    }

    /// Fields ordered by number.
    pub(crate) fn sorted_fields(&self, pool: &DefPool) -> Vec<FieldId> {
        let mut sorted = self.fields.clone();
        sorted.sort_by_key(|&f| pool.field(f).number());
        sorted
    }

    fn modifiers(&self, pool: &DefPool) -> u64 {
        let mut out = 0;
        if pool.file(self.file).syntax() == Syntax::Proto3 {
            out |= message_modifier::VALIDATE_UTF8 | message_modifier::DEFAULT_IS_PACKED;
        }
        if !self.extension_ranges.is_empty() {
            out |= message_modifier::IS_EXTENDABLE;
        }
        out
    }

    /// Append this message's mini descriptor to `out`.
    ///
    /// Fields are written in ascending number order, followed by the real
    /// oneofs. Map entries and message sets use their own encodings.
    pub fn mini_descriptor_encode(&self, pool: &DefPool, out: &mut Vec<u8>) -> Result<(), DefError> {
        let layout_err = |source| DefError::layout(&self.full_name, source);
        let sorted = self.sorted_fields(pool);
        let mut e = MtDataEncoder::new(out);
        if self.is_map_entry {
            let &[key, value] = sorted.as_slice() else {
                return Err(DefError::MapEntryFields {
                    message: self.full_name.clone(),
                    count: sorted.len(),
                });
            };
            let (key, value) = (pool.field(key), pool.field(value));
            e.encode_map(
                key.field_type(),
                value.field_type(),
                key.modifiers(),
                value.modifiers(),
            )
            .map_err(layout_err)?;
        } else if self.is_message_set {
            e.encode_message_set();
        } else {
            e.start_message(self.modifiers(pool));
            for &f in &sorted {
                let f = pool.field(f);
                e.put_field(f.field_type(), f.number(), f.modifiers())
                    .map_err(layout_err)?;
            }
            for &o in &self.oneofs[..self.real_oneof_count] {
                e.start_oneof();
                for &f in pool.oneof(o).fields() {
                    e.put_oneof_field(pool.field(f).number());
                }
            }
        }
        Ok(())
    }
}
