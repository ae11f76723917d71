//! `MtDataEncoder`: writes mini descriptors.
//!
//! Each primitive appends to a caller-owned buffer, so the def pool can
//! reuse one scratch allocation across every message it builds.

use hpb_core::FieldType;

use crate::base92::{put_varint, to_base92};
use crate::error::MiniTableError;
use crate::wire::{
    encoded_modifier, field_modifier, message_modifier, value, version, EncodedType,
    REPEATED_BASE,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OneofState {
    NotStarted,
    StartedOneof,
    EmittedOneofField,
}

/// Streaming writer for message, enum, map and extension descriptors.
#[derive(Debug)]
pub struct MtDataEncoder<'a> {
    out: &'a mut Vec<u8>,
    msg_modifiers: u64,
    last_field_num: u32,
    oneof_state: OneofState,
    present_values_mask: u64,
    last_written_value: u32,
}

impl<'a> MtDataEncoder<'a> {
    /// Create an encoder that appends to `out`.
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self {
            out,
            msg_modifiers: 0,
            last_field_num: 0,
            oneof_state: OneofState::NotStarted,
            present_values_mask: 0,
            last_written_value: 0,
        }
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.out
    }

    fn put(&mut self, index: u8) {
        self.out.push(to_base92(index));
    }

    fn reset_message(&mut self, msg_modifiers: u64) {
        self.msg_modifiers = msg_modifiers;
        self.last_field_num = 0;
        self.oneof_state = OneofState::NotStarted;
    }

    fn put_modifier(&mut self, modifiers: u32) {
        if modifiers != 0 {
            put_varint(
                self.out,
                modifiers,
                value::MIN_MODIFIER,
                value::MAX_MODIFIER,
            );
        }
    }

    /// Begin a message with the given message modifiers.
    pub fn start_message(&mut self, msg_modifiers: u64) {
        self.reset_message(msg_modifiers);
        self.out.push(version::MESSAGE);
        self.put_modifier(msg_modifiers as u32);
    }

    /// Append one field. Numbers must be strictly ascending.
    pub fn put_field(
        &mut self,
        field_type: FieldType,
        number: u32,
        field_mods: u64,
    ) -> Result<(), MiniTableError> {
        if number <= self.last_field_num {
            return Err(MiniTableError::FieldOrder {
                number,
                last: self.last_field_num,
            });
        }
        if self.last_field_num + 1 != number {
            put_varint(
                self.out,
                number - self.last_field_num,
                value::MIN_SKIP,
                value::MAX_SKIP,
            );
        }
        self.last_field_num = number;

        let mut encoded = EncodedType::from_field_type(field_type) as u8;
        if field_mods & field_modifier::IS_CLOSED_ENUM != 0 {
            debug_assert_eq!(field_type, FieldType::Enum);
            encoded = EncodedType::ClosedEnum as u8;
        }
        if field_mods & field_modifier::IS_REPEATED != 0 {
            encoded += REPEATED_BASE;
        }
        self.put(encoded);

        let mut mods = 0u32;
        if field_mods & field_modifier::IS_REPEATED != 0 && field_type.is_packable() {
            let packed = field_mods & field_modifier::IS_PACKED != 0;
            let default_packed = self.msg_modifiers & message_modifier::DEFAULT_IS_PACKED != 0;
            if packed != default_packed {
                mods |= encoded_modifier::FLIP_PACKED;
            }
        }
        if field_mods & field_modifier::IS_PROTO3_SINGULAR != 0 {
            mods |= encoded_modifier::IS_PROTO3_SINGULAR;
        }
        if field_mods & field_modifier::IS_REQUIRED != 0 {
            mods |= encoded_modifier::IS_REQUIRED;
        }
        self.put_modifier(mods);
        Ok(())
    }

    /// Begin a oneof. The first call also ends the field list.
    pub fn start_oneof(&mut self) {
        let sep = if self.oneof_state == OneofState::NotStarted {
            value::END
        } else {
            value::ONEOF_SEPARATOR
        };
        self.out.push(sep);
        self.oneof_state = OneofState::StartedOneof;
    }

    /// Add a member to the current oneof.
    pub fn put_oneof_field(&mut self, number: u32) {
        if self.oneof_state == OneofState::EmittedOneofField {
            self.out.push(value::FIELD_SEPARATOR);
        }
        put_varint(
            self.out,
            number,
            value::MIN_ONEOF_FIELD,
            value::MAX_ONEOF_FIELD,
        );
        self.oneof_state = OneofState::EmittedOneofField;
    }

    /// Begin an enum.
    pub fn start_enum(&mut self) {
        self.present_values_mask = 0;
        self.last_written_value = 0;
        self.out.push(version::ENUM);
    }

    fn flush_enum_mask(&mut self) {
        self.put(self.present_values_mask as u8);
        self.present_values_mask = 0;
        self.last_written_value = self.last_written_value.wrapping_add(5);
    }

    /// Mark `val` present. Values must be passed in ascending unsigned
    /// order; duplicates are allowed.
    pub fn put_enum_value(&mut self, val: u32) -> Result<(), MiniTableError> {
        if val < self.last_written_value {
            return Err(MiniTableError::EnumOrder {
                value: val,
                last: self.last_written_value,
            });
        }
        let mut delta = val - self.last_written_value;
        if delta >= 5 && self.present_values_mask != 0 {
            self.flush_enum_mask();
            delta -= 5;
        }
        if delta >= 5 {
            put_varint(self.out, delta, value::MIN_SKIP, value::MAX_SKIP);
            self.last_written_value += delta;
            delta = 0;
        }
        debug_assert_eq!(self.present_values_mask >> delta, 0);
        self.present_values_mask |= 1u64 << delta;
        Ok(())
    }

    /// Finish an enum, flushing any pending presence bits.
    pub fn end_enum(&mut self) {
        if self.present_values_mask != 0 {
            self.flush_enum_mask();
        }
    }

    /// Write a single-field extension descriptor.
    pub fn encode_extension(
        &mut self,
        field_type: FieldType,
        number: u32,
        field_mods: u64,
    ) -> Result<(), MiniTableError> {
        self.reset_message(0);
        self.out.push(version::EXTENSION);
        self.put_field(field_type, number, field_mods)
    }

    /// Write a map-entry descriptor with key field 1 and value field 2.
    pub fn encode_map(
        &mut self,
        key_type: FieldType,
        value_type: FieldType,
        key_mods: u64,
        value_mods: u64,
    ) -> Result<(), MiniTableError> {
        self.reset_message(0);
        self.out.push(version::MAP);
        self.put_field(key_type, 1, key_mods)?;
        self.put_field(value_type, 2, value_mods)
    }

    /// Write a message-set descriptor.
    pub fn encode_message_set(&mut self) {
        self.out.push(version::MESSAGE_SET);
    }
}
