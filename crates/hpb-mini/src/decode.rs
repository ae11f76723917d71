//! Mini-descriptor decoder and layout assignment.
//!
//! Decoding runs in three steps for an ordinary message:
//!
//! 1. Parse the field list, modifiers and oneof section into provisional
//!    field records plus one presence class per field.
//! 2. Assign hasbits: required fields first, then every other scalar
//!    with explicit presence. The hasbit bytes open the message.
//! 3. Sort the remaining storage items by `(rep, kind, index)` and place
//!    each at the next aligned offset. Oneofs contribute one data item and
//!    one 4-byte case item; all members share the data slot.
//!
//! Map entries and message sets skip step 3 and use fixed layouts.

use hpb_arena::Arena;
use hpb_core::{FieldType, Platform};
use smallvec::SmallVec;

use crate::base92::{from_base92, get_varint, index_of, to_base92};
use crate::error::MiniTableError;
use crate::extension::MiniTableExtension;
use crate::field::{FieldMode, FieldRep, MiniTableField};
use crate::id::MiniTableId;
use crate::message::{ExtMode, MiniTable, MiniTableSub};
use crate::wire::{encoded_modifier, message_modifier, value, version, EncodedType, REPEATED_BASE};

/// Largest message size in bytes.
const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Offset of the map key; the leading 8 bytes hold hasbits.
const MAP_HASBIT_BYTES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Presence {
    None,
    Hasbit,
    Required,
    Oneof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ItemKind {
    OneofCase = 0,
    OneofField = 1,
    Field = 2,
}

#[derive(Clone, Copy, Debug)]
struct LayoutItem {
    rep: FieldRep,
    kind: ItemKind,
    /// Field index, or the last member's index for oneof items.
    index: u16,
    /// Position in `Decoder::oneofs` for oneof items.
    oneof: usize,
    offset: u16,
}

fn encoded_rep(t: EncodedType) -> Option<FieldRep> {
    use EncodedType::*;
    Some(match t {
        Double | Int64 | UInt64 | Fixed64 | SFixed64 | SInt64 => FieldRep::EightByte,
        Float | Int32 | Fixed32 | UInt32 | OpenEnum | SFixed32 | SInt32 | ClosedEnum => {
            FieldRep::FourByte
        }
        Bool => FieldRep::OneByte,
        String | Bytes => FieldRep::StringView,
        Group | Message => return None,
    })
}

struct Decoder<'d> {
    data: &'d [u8],
    pos: usize,
    platform: Platform,
    /// `false` while decoding an extension.
    for_message: bool,
    fields: Vec<MiniTableField>,
    presence: SmallVec<[Presence; 16]>,
    oneofs: Vec<SmallVec<[u16; 4]>>,
    items: Vec<LayoutItem>,
    ext: ExtMode,
    dense_below: Option<usize>,
    submsg_count: u16,
    subenum_count: u16,
    size: usize,
    required_count: u8,
}

impl<'d> Decoder<'d> {
    fn new(data: &'d [u8], platform: Platform, for_message: bool, fields: Vec<MiniTableField>) -> Self {
        Self {
            data,
            pos: 0,
            platform: platform.resolve(),
            for_message,
            fields,
            presence: SmallVec::new(),
            oneofs: Vec::new(),
            items: Vec::new(),
            ext: ExtMode::NonExtendable,
            dense_below: None,
            submsg_count: 0,
            subenum_count: 0,
            size: 0,
            required_count: 0,
        }
    }

    fn varint(&mut self, first: u8, min: u8, max: u8) -> Result<u32, MiniTableError> {
        get_varint(self.data, &mut self.pos, first, min, max).ok_or(MiniTableError::OverlongVarint)
    }

    fn push_field(&mut self, ch: u8, number: u32, msg_modifiers: u64) -> Result<(), MiniTableError> {
        if from_base92(ch).is_none() {
            return Err(MiniTableError::InvalidChar { found: ch as char });
        }
        let pointer = FieldRep::pointer(self.platform);
        let mut raw = index_of(ch) as u8;
        let (mode, rep, presence) = if ch >= to_base92(REPEATED_BASE) {
            raw -= REPEATED_BASE;
            (FieldMode::Array, Some(pointer), Presence::None)
        } else {
            let rep = match EncodedType::from_u8(raw) {
                Some(EncodedType::Group | EncodedType::Message) => Some(pointer),
                Some(t) => encoded_rep(t),
                None => None,
            };
            (FieldMode::Scalar, rep, Presence::Hasbit)
        };
        let encoded = EncodedType::from_u8(raw).ok_or(MiniTableError::InvalidFieldType { value: raw })?;
        let rep = rep.ok_or(MiniTableError::InvalidFieldType { value: raw })?;

        let mut descriptor_type = encoded.field_type();
        let mut alternate = false;
        if encoded == EncodedType::OpenEnum {
            descriptor_type = FieldType::Int32;
            alternate = true;
        } else if descriptor_type == FieldType::String
            && msg_modifiers & message_modifier::VALIDATE_UTF8 == 0
        {
            descriptor_type = FieldType::Bytes;
            alternate = true;
        }

        let sub_index = match descriptor_type {
            FieldType::Message | FieldType::Group => {
                self.submsg_count += 1;
                Some(self.submsg_count - 1)
            }
            FieldType::Enum => {
                self.subenum_count += 1;
                Some(self.subenum_count - 1)
            }
            _ => None,
        };

        let mut field = MiniTableField {
            number,
            offset: 0,
            presence: 0,
            sub_index,
            descriptor_type,
            mode,
            rep,
            packed: false,
            extension: false,
            alternate,
        };
        if field.is_packable() && msg_modifiers & message_modifier::DEFAULT_IS_PACKED != 0 {
            field.packed = true;
        }
        self.fields.push(field);
        self.presence.push(presence);
        Ok(())
    }

    fn modify_last_field(&mut self, mods: u32) -> Result<(), MiniTableError> {
        let i = self.fields.len() - 1;
        let field = &mut self.fields[i];
        if mods & encoded_modifier::FLIP_PACKED != 0 {
            if !field.is_packable() {
                return Err(MiniTableError::UnpackableFlip {
                    number: field.number,
                });
            }
            field.packed = !field.packed;
        }
        let singular = mods & encoded_modifier::IS_PROTO3_SINGULAR != 0;
        let required = mods & encoded_modifier::IS_REQUIRED != 0;
        if (singular || required) && self.presence[i] != Presence::Hasbit {
            return Err(MiniTableError::InvalidRepeatedModifier {
                number: field.number,
            });
        }
        if singular && required {
            return Err(MiniTableError::SingularAndRequired {
                number: field.number,
            });
        }
        if singular {
            self.presence[i] = Presence::None;
        }
        if required {
            self.presence[i] = Presence::Required;
        }
        Ok(())
    }

    fn push_oneof(&mut self, members: &SmallVec<[u16; 4]>, rep: FieldRep) -> Result<(), MiniTableError> {
        let last = *members.last().ok_or(MiniTableError::EmptyOneof)?;
        let oneof = self.oneofs.len();
        self.oneofs.push(members.clone());
        self.items.push(LayoutItem {
            rep,
            kind: ItemKind::OneofField,
            index: last,
            oneof,
            offset: 0,
        });
        self.items.push(LayoutItem {
            rep: FieldRep::FourByte,
            kind: ItemKind::OneofCase,
            index: last,
            oneof,
            offset: 0,
        });
        Ok(())
    }

    fn decode_oneofs(&mut self) -> Result<(), MiniTableError> {
        let mut members: SmallVec<[u16; 4]> = SmallVec::new();
        let mut rep = FieldRep::OneByte;
        while self.pos < self.data.len() {
            let ch = self.data[self.pos];
            self.pos += 1;
            if ch == value::FIELD_SEPARATOR {
                continue;
            }
            if ch == value::ONEOF_SEPARATOR {
                self.push_oneof(&members, rep)?;
                members.clear();
                rep = FieldRep::OneByte;
                continue;
            }
            if !(value::MIN_ONEOF_FIELD..=value::MAX_ONEOF_FIELD).contains(&ch) || from_base92(ch).is_none() {
                return Err(MiniTableError::InvalidChar { found: ch as char });
            }
            let number = self.varint(ch, value::MIN_ONEOF_FIELD, value::MAX_ONEOF_FIELD)?;
            let i = self
                .fields
                .binary_search_by_key(&number, |f| f.number)
                .map_err(|_| MiniTableError::UnknownOneofField { number })?;
            if self.presence[i] != Presence::Hasbit {
                return Err(MiniTableError::InvalidOneofField { number });
            }
            let field_rep = self.fields[i].rep;
            if field_rep.size(self.platform) > rep.size(self.platform) {
                rep = field_rep;
            }
            self.presence[i] = Presence::Oneof;
            members.push(i as u16);
        }
        self.push_oneof(&members, rep)
    }

    /// Parse the descriptor body. For extensions, stops after one field.
    fn parse(&mut self) -> Result<(), MiniTableError> {
        let mut msg_modifiers: u64 = 0;
        let mut last_number: u32 = 0;
        while self.pos < self.data.len() {
            let ch = self.data[self.pos];
            self.pos += 1;
            if ch <= value::MAX_FIELD {
                if !self.for_message && !self.fields.is_empty() {
                    self.pos -= 1;
                    return Ok(());
                }
                last_number = last_number.wrapping_add(1);
                self.push_field(ch, last_number, msg_modifiers)?;
            } else if (value::MIN_MODIFIER..=value::MAX_MODIFIER).contains(&ch) {
                let mods = self.varint(ch, value::MIN_MODIFIER, value::MAX_MODIFIER)?;
                if !self.fields.is_empty() {
                    self.modify_last_field(mods)?;
                } else {
                    if !self.for_message {
                        return Err(MiniTableError::ExtensionModifiers);
                    }
                    msg_modifiers = mods as u64;
                    if msg_modifiers & message_modifier::IS_EXTENDABLE != 0 {
                        self.ext = ExtMode::Extendable;
                    }
                }
            } else if ch == value::END {
                if !self.for_message {
                    return Err(MiniTableError::ExtensionOneofs);
                }
                self.decode_oneofs()?;
            } else if (value::MIN_SKIP..=value::MAX_SKIP).contains(&ch) {
                if self.for_message && self.dense_below.is_none() {
                    self.dense_below = Some(self.fields.len());
                }
                let skip = self.varint(ch, value::MIN_SKIP, value::MAX_SKIP)?;
                last_number = last_number.wrapping_add(skip).wrapping_sub(1);
            } else {
                return Err(MiniTableError::InvalidChar { found: ch as char });
            }
        }
        Ok(())
    }

    fn assign_hasbits(&mut self) -> Result<(), MiniTableError> {
        let mut last: i16 = 0;
        for (field, presence) in self.fields.iter_mut().zip(&self.presence) {
            match presence {
                Presence::Required => {
                    last += 1;
                    field.presence = last;
                }
                Presence::None => field.presence = 0,
                _ => {}
            }
        }
        if last > 63 {
            return Err(MiniTableError::TooManyRequired);
        }
        self.required_count = last as u8;
        for (field, presence) in self.fields.iter_mut().zip(&self.presence) {
            if *presence == Presence::Hasbit {
                last += 1;
                field.presence = last;
            }
        }
        self.size = if last > 0 {
            (last as usize + 1).div_ceil(8)
        } else {
            0
        };
        Ok(())
    }

    fn sort_layout_items(&mut self) {
        for (i, (field, presence)) in self.fields.iter().zip(&self.presence).enumerate() {
            if *presence == Presence::Oneof {
                continue;
            }
            self.items.push(LayoutItem {
                rep: field.rep,
                kind: ItemKind::Field,
                index: i as u16,
                oneof: 0,
                offset: 0,
            });
        }
        self.items.sort_unstable_by_key(|item| (item.rep, item.kind, item.index));
    }

    fn place(&mut self, rep: FieldRep) -> Result<u16, MiniTableError> {
        let size = rep.size(self.platform);
        let align = rep.align(self.platform);
        let offset = self.size.next_multiple_of(align);
        let end = offset + size;
        if end > MAX_MESSAGE_SIZE {
            return Err(MiniTableError::MessageTooLarge {
                max: MAX_MESSAGE_SIZE,
            });
        }
        self.size = end;
        Ok(offset as u16)
    }

    fn assign_offsets(&mut self) -> Result<(), MiniTableError> {
        for i in 0..self.items.len() {
            self.items[i].offset = self.place(self.items[i].rep)?;
        }
        for item in &self.items {
            match item.kind {
                ItemKind::OneofCase => {
                    for &m in &self.oneofs[item.oneof] {
                        self.fields[m as usize].presence = !(item.offset as i16);
                    }
                }
                ItemKind::OneofField => {
                    for &m in &self.oneofs[item.oneof] {
                        self.fields[m as usize].offset = item.offset;
                    }
                }
                ItemKind::Field => self.fields[item.index as usize].offset = item.offset,
            }
        }
        self.size = self.size.next_multiple_of(8);
        Ok(())
    }

    fn validate_entry_field(&self, i: usize, expected: u32) -> Result<(), MiniTableError> {
        let name = if expected == 1 { "key" } else { "val" };
        let f = &self.fields[i];
        if f.number != expected {
            return Err(MiniTableError::MapEntryNumber {
                name,
                expected,
                found: f.number,
            });
        }
        if f.is_repeated_or_map() {
            return Err(MiniTableError::MapEntryRepeated { name });
        }
        let field_type = f.field_type();
        let bad = if expected == 1 {
            matches!(
                field_type,
                FieldType::Float
                    | FieldType::Double
                    | FieldType::Message
                    | FieldType::Group
                    | FieldType::Bytes
                    | FieldType::Enum
            )
        } else {
            field_type == FieldType::Group
        };
        if bad {
            return Err(MiniTableError::MapEntryType { name, field_type });
        }
        Ok(())
    }

    fn parse_message(&mut self) -> Result<(), MiniTableError> {
        self.parse()?;
        if self.dense_below.is_none() {
            self.dense_below = Some(self.fields.len());
        }
        self.assign_hasbits()
    }

    fn parse_map(&mut self) -> Result<(), MiniTableError> {
        self.parse_message()?;
        if self.fields.len() != 2 {
            return Err(MiniTableError::MapFieldCount {
                count: self.fields.len(),
            });
        }
        if self.items.iter().any(|i| i.kind == ItemKind::OneofCase) {
            return Err(MiniTableError::MapOneof);
        }
        self.validate_entry_field(0, 1)?;
        self.validate_entry_field(1, 2)?;
        let kv = 2 * self.platform.pointer_size() as usize;
        self.fields[0].offset = MAP_HASBIT_BYTES as u16;
        self.fields[1].offset = (MAP_HASBIT_BYTES + kv) as u16;
        self.size = (MAP_HASBIT_BYTES + 2 * kv).next_multiple_of(8);
        self.ext = ExtMode::IsMapEntry;
        Ok(())
    }

    fn into_table(self, arena: &Arena) -> Result<MiniTable, MiniTableError> {
        let Decoder {
            mut fields,
            submsg_count,
            subenum_count,
            size,
            ext,
            dense_below,
            required_count,
            ..
        } = self;
        let total = submsg_count as usize + subenum_count as usize;
        let mut subs = arena.alloc_vec::<MiniTableSub>(total)?;
        subs.extend((0..submsg_count).map(|_| MiniTableSub::Message(None)));
        subs.extend((0..subenum_count).map(|_| MiniTableSub::Enum(None)));
        if subenum_count > 0 {
            for f in &mut fields {
                if f.descriptor_type == FieldType::Enum {
                    f.sub_index = f.sub_index.map(|i| i + submsg_count);
                }
            }
        }
        Ok(MiniTable {
            fields,
            subs,
            size: size as u16,
            ext,
            dense_below: dense_below.unwrap_or(0),
            required_count,
        })
    }
}

/// Compile a message-family descriptor.
pub(crate) fn build_message(data: &[u8], platform: Platform, arena: &Arena) -> Result<MiniTable, MiniTableError> {
    let Some((&vers, body)) = data.split_first() else {
        return Ok(MiniTable::empty());
    };
    // Body length bounds the field count.
    let fields = arena.alloc_vec::<MiniTableField>(body.len())?;
    let mut d = Decoder::new(body, platform, true, fields);
    match vers {
        version::MAP => d.parse_map()?,
        version::MESSAGE => {
            d.parse_message()?;
            d.sort_layout_items();
            d.assign_offsets()?;
        }
        version::MESSAGE_SET => {
            if !body.is_empty() {
                return Err(MiniTableError::MessageSetLength { len: body.len() });
            }
            let mut table = MiniTable::empty();
            table.ext = ExtMode::IsMessageSet;
            return Ok(table);
        }
        other => {
            return Err(MiniTableError::InvalidVersion {
                kind: "message",
                found: other as char,
            })
        }
    }
    d.into_table(arena)
}

/// Compile an extension descriptor against its extendee.
pub(crate) fn build_extension(
    data: &[u8],
    extendee_id: MiniTableId,
    extendee: &MiniTable,
    sub: MiniTableSub,
    platform: Platform,
) -> Result<MiniTableExtension, MiniTableError> {
    // A non-empty descriptor must carry the version character.
    let body = match data.split_first() {
        Some((&version::EXTENSION, body)) => body,
        Some((&other, _)) => {
            return Err(MiniTableError::InvalidVersion {
                kind: "ext",
                found: other as char,
            })
        }
        None => data,
    };
    let mut d = Decoder::new(body, platform, false, Vec::with_capacity(1));
    d.parse()?;
    if d.fields.len() != 1 {
        return Err(MiniTableError::ExtensionFieldCount {
            count: d.fields.len(),
        });
    }
    let mut field = d.fields.swap_remove(0);
    field.extension = true;
    field.offset = 0;
    field.presence = 0;
    if extendee.is_message_set() && (!field.is_sub_message() || field.mode == FieldMode::Array) {
        return Err(MiniTableError::InvalidMessageSetExtension {
            number: field.number,
        });
    }
    Ok(MiniTableExtension {
        field,
        extendee: extendee_id,
        sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MtDataEncoder;
    use crate::wire::field_modifier;

    fn build(f: impl FnOnce(&mut MtDataEncoder<'_>), platform: Platform) -> Result<MiniTable, MiniTableError> {
        let mut buf = Vec::new();
        f(&mut MtDataEncoder::new(&mut buf));
        MiniTable::build(&buf, platform, &Arena::new())
    }

    #[test]
    fn empty_input_builds_empty_table() {
        let t = MiniTable::build(b"", Platform::Bits64, &Arena::new()).unwrap();
        assert_eq!(t.field_count(), 0);
        assert_eq!(t.size(), 0);
    }

    #[test]
    fn scalar_layout_sorts_by_rep() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int64, 1, 0).unwrap();
                e.put_field(FieldType::Bool, 2, 0).unwrap();
                e.put_field(FieldType::Int32, 3, 0).unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        // Three hasbits (1..=3) fit in one byte.
        let f1 = t.find_field_by_number(1).unwrap();
        let f2 = t.find_field_by_number(2).unwrap();
        let f3 = t.find_field_by_number(3).unwrap();
        assert_eq!(f1.hasbit(), Some(1));
        assert_eq!(f3.hasbit(), Some(3));
        assert_eq!(f2.offset(), 1);
        assert_eq!(f3.offset(), 4);
        assert_eq!(f1.offset(), 8);
        assert_eq!(t.size(), 16);
        assert_eq!(t.dense_below(), 3);
    }

    #[test]
    fn string_view_size_depends_on_platform() {
        let enc = |e: &mut MtDataEncoder<'_>| {
            e.start_message(message_modifier::VALIDATE_UTF8);
            e.put_field(FieldType::String, 1, 0).unwrap();
        };
        let t32 = build(enc, Platform::Bits32).unwrap();
        let t64 = build(enc, Platform::Bits64).unwrap();
        assert_eq!(t32.find_field_by_number(1).unwrap().offset(), 4);
        assert_eq!(t32.size(), 16);
        assert_eq!(t64.find_field_by_number(1).unwrap().offset(), 8);
        assert_eq!(t64.size(), 24);
        assert_eq!(t64.field(0).unwrap().descriptor_type(), FieldType::String);
    }

    #[test]
    fn unchecked_strings_become_alternate_bytes() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::String, 1, 0).unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        let f = t.field(0).unwrap();
        assert_eq!(f.descriptor_type(), FieldType::Bytes);
        assert_eq!(f.field_type(), FieldType::String);
    }

    #[test]
    fn required_fields_take_low_hasbits() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int32, 1, 0).unwrap();
                e.put_field(FieldType::Int32, 2, field_modifier::IS_REQUIRED)
                    .unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(t.required_count(), 1);
        assert_eq!(t.find_field_by_number(2).unwrap().hasbit(), Some(1));
        assert_eq!(t.find_field_by_number(1).unwrap().hasbit(), Some(2));
    }

    #[test]
    fn proto3_singular_has_no_presence() {
        let t = build(
            |e| {
                e.start_message(message_modifier::VALIDATE_UTF8 | message_modifier::DEFAULT_IS_PACKED);
                e.put_field(FieldType::Int32, 1, field_modifier::IS_PROTO3_SINGULAR)
                    .unwrap();
                e.put_field(FieldType::Int32, 2, field_modifier::IS_REPEATED | field_modifier::IS_PACKED)
                    .unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        assert!(!t.field(0).unwrap().has_presence());
        assert!(t.field(1).unwrap().is_packed());
        assert_eq!(t.field(1).unwrap().mode(), FieldMode::Array);
        assert_eq!(t.size(), 16);
    }

    #[test]
    fn oneof_members_share_storage() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int32, 1, 0).unwrap();
                e.put_field(FieldType::Double, 2, 0).unwrap();
                e.put_field(FieldType::Bool, 3, 0).unwrap();
                e.start_oneof();
                e.put_oneof_field(1);
                e.put_oneof_field(2);
            },
            Platform::Bits64,
        )
        .unwrap();
        let f1 = t.find_field_by_number(1).unwrap();
        let f2 = t.find_field_by_number(2).unwrap();
        assert_eq!(f1.offset(), f2.offset());
        assert_eq!(f1.offset() % 8, 0);
        assert_eq!(f1.oneof_case_offset(), f2.oneof_case_offset());
        assert!(f1.oneof_case_offset().is_some());
        assert_eq!(t.find_field_by_number(3).unwrap().hasbit(), Some(1));
    }

    #[test]
    fn oneof_errors() {
        let err = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int32, 1, 0).unwrap();
                e.start_oneof();
                e.put_oneof_field(7);
            },
            Platform::Bits64,
        )
        .unwrap_err();
        assert_eq!(err, MiniTableError::UnknownOneofField { number: 7 });

        let err = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int32, 1, field_modifier::IS_REPEATED)
                    .unwrap();
                e.start_oneof();
                e.put_oneof_field(1);
            },
            Platform::Bits64,
        )
        .unwrap_err();
        assert_eq!(err, MiniTableError::InvalidOneofField { number: 1 });

        let err = MiniTable::build(b"$(^", Platform::Bits64, &Arena::new()).unwrap_err();
        assert_eq!(err, MiniTableError::EmptyOneof);
    }

    #[test]
    fn modifier_errors() {
        // Flip packed on a string.
        let err = MiniTable::build(b"$EM", Platform::Bits64, &Arena::new());
        assert!(matches!(err, Err(MiniTableError::UnpackableFlip { number: 1 })));
        // Required on a repeated field.
        let rep_int32 = to_base92(REPEATED_BASE + EncodedType::Int32 as u8);
        let data = [b'$', rep_int32, b'N'];
        let err = MiniTable::build(&data, Platform::Bits64, &Arena::new());
        assert!(matches!(err, Err(MiniTableError::InvalidRepeatedModifier { number: 1 })));
        // Singular and required: 2 | 4 = 6 -> 'R'.
        let err = MiniTable::build(b"$(R", Platform::Bits64, &Arena::new());
        assert!(matches!(err, Err(MiniTableError::SingularAndRequired { number: 1 })));
    }

    #[test]
    fn invalid_input_is_rejected() {
        let a = Arena::new();
        assert!(matches!(
            MiniTable::build(b"X", Platform::Bits64, &a),
            Err(MiniTableError::InvalidVersion { kind: "message", .. })
        ));
        assert!(matches!(
            MiniTable::build(b"$\"", Platform::Bits64, &a),
            Err(MiniTableError::InvalidChar { .. })
        ));
        assert!(matches!(
            MiniTable::build(b"&(", Platform::Bits64, &a),
            Err(MiniTableError::MessageSetLength { len: 1 })
        ));
    }

    #[test]
    fn skips_break_dense_prefix() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Int32, 1, 0).unwrap();
                e.put_field(FieldType::Int32, 2, 0).unwrap();
                e.put_field(FieldType::Int32, 100, 0).unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(t.dense_below(), 2);
        assert_eq!(t.find_field_by_number(100).unwrap().number(), 100);
        assert!(t.find_field_by_number(3).is_none());
    }

    #[test]
    fn map_entry_layout_is_fixed() {
        let t = build(
            |e| {
                e.encode_map(FieldType::Int32, FieldType::Message, 0, 0)
                    .unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        assert!(t.is_map_entry());
        assert_eq!(t.field(0).unwrap().offset(), 8);
        assert_eq!(t.field(1).unwrap().offset(), 24);
        assert_eq!(t.size(), 40);
        assert_eq!(t.subs(), &[MiniTableSub::Message(None)]);

        let t32 = build(
            |e| {
                e.encode_map(FieldType::Int32, FieldType::Int32, 0, 0).unwrap();
            },
            Platform::Bits32,
        )
        .unwrap();
        assert_eq!(t32.field(1).unwrap().offset(), 16);
        assert_eq!(t32.size(), 24);
    }

    #[test]
    fn map_entry_rejects_bad_keys() {
        let err = build(
            |e| {
                e.encode_map(FieldType::Double, FieldType::Int32, 0, 0)
                    .unwrap();
            },
            Platform::Bits64,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MiniTableError::MapEntryType {
                name: "key",
                field_type: FieldType::Double
            }
        );
    }

    #[test]
    fn enum_subs_follow_message_subs() {
        let t = build(
            |e| {
                e.start_message(0);
                e.put_field(FieldType::Enum, 1, field_modifier::IS_CLOSED_ENUM)
                    .unwrap();
                e.put_field(FieldType::Message, 2, 0).unwrap();
                e.put_field(FieldType::Enum, 3, 0).unwrap();
            },
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(t.field(0).unwrap().sub_index(), Some(1));
        assert_eq!(t.field(1).unwrap().sub_index(), Some(0));
        // Open enums need no sub table.
        assert_eq!(t.field(2).unwrap().sub_index(), None);
        assert_eq!(t.field(2).unwrap().field_type(), FieldType::Enum);
        assert_eq!(t.subs().len(), 2);
    }

    #[test]
    fn message_set_has_no_fields() {
        let t = build(|e| e.encode_message_set(), Platform::Bits64).unwrap();
        assert!(t.is_message_set());
        assert_eq!(t.field_count(), 0);
    }

    #[test]
    fn extendable_modifier_sets_ext_mode() {
        let t = build(
            |e| e.start_message(message_modifier::IS_EXTENDABLE),
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(t.ext_mode(), ExtMode::Extendable);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fields_are_found_and_aligned(
                numbers in prop::collection::btree_set(1u32..5000, 1..40),
                types in prop::collection::vec(0usize..18, 40),
            ) {
                let numbers: Vec<u32> = numbers.into_iter().collect();
                let mut buf = Vec::new();
                let mut e = MtDataEncoder::new(&mut buf);
                e.start_message(message_modifier::VALIDATE_UTF8);
                for (n, t) in numbers.iter().zip(&types) {
                    e.put_field(FieldType::ALL[*t], *n, 0).unwrap();
                }
                let t = MiniTable::build(&buf, Platform::Bits64, &Arena::new()).unwrap();
                prop_assert_eq!(t.field_count(), numbers.len());
                prop_assert_eq!(t.size() % 8, 0);
                for n in &numbers {
                    let f = t.find_field_by_number(*n).unwrap();
                    let align = f.rep().align(Platform::Bits64) as u16;
                    prop_assert_eq!(f.offset() % align, 0);
                    prop_assert!(f.offset() as usize + f.rep().size(Platform::Bits64) <= t.size() as usize);
                }
            }
        }
    }
}
