//! Encode/decode for descriptor messages.
//!
//! Every message implements [`Message`]: a per-field merge step for
//! decoding and a field-number-ordered writer for encoding. Unknown fields
//! are skipped on decode and therefore dropped on re-encode.

use crate::error::DecodeError;
use crate::options::Options;
use crate::types::*;
use crate::wire::{self, expect, Reader, Tag, WireType};

/// A protobuf message this crate can read and write.
pub trait Message: Default {
    /// Merge one field whose tag has just been read.
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError>;

    /// Append every set field, in field-number order.
    fn encode_raw(&self, out: &mut Vec<u8>);

    /// Merge every field left in `r`.
    fn merge(&mut self, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        while !r.is_empty() {
            let tag = r.read_tag()?;
            self.merge_field(tag, r)?;
        }
        Ok(())
    }

    /// Decode a complete message.
    fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut msg = Self::default();
        msg.merge(&mut Reader::new(buf))?;
        Ok(msg)
    }

    /// Serialize to a fresh buffer.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_raw(&mut out);
        out
    }
}

// ── Field helpers ───────────────────────────────────────────────

fn nested<M: Message>(tag: Tag, r: &mut Reader<'_>, field: &'static str) -> Result<M, DecodeError> {
    expect(tag, WireType::Len, field)?;
    let mut sub = r.nested()?;
    let mut msg = M::default();
    msg.merge(&mut sub)?;
    Ok(msg)
}

fn options<T: Message>(
    slot: &mut Option<Options<T>>,
    tag: Tag,
    r: &mut Reader<'_>,
    field: &'static str,
) -> Result<(), DecodeError> {
    expect(tag, WireType::Len, field)?;
    let bytes = r.read_bytes()?;
    // Repeated occurrences of a message field concatenate.
    let mut raw = slot.take().map(|o| o.raw().to_vec()).unwrap_or_default();
    raw.extend_from_slice(bytes);
    *slot = Some(Options::from_bytes(raw));
    Ok(())
}

fn put_str(out: &mut Vec<u8>, number: u32, v: &Option<String>) {
    if let Some(v) = v {
        wire::write_bytes(out, number, v.as_bytes());
    }
}

fn put_strs(out: &mut Vec<u8>, number: u32, vs: &[String]) {
    for v in vs {
        wire::write_bytes(out, number, v.as_bytes());
    }
}

fn put_int32(out: &mut Vec<u8>, number: u32, v: Option<i32>) {
    if let Some(v) = v {
        wire::write_int32(out, number, v);
    }
}

fn put_bool(out: &mut Vec<u8>, number: u32, v: Option<bool>) {
    if let Some(v) = v {
        wire::write_bool(out, number, v);
    }
}

fn put_msgs<M: Message>(out: &mut Vec<u8>, number: u32, ms: &[M]) {
    for m in ms {
        wire::write_message(out, number, |buf| m.encode_raw(buf));
    }
}

fn put_options<T: Message>(out: &mut Vec<u8>, number: u32, v: &Option<Options<T>>) {
    if let Some(o) = v {
        wire::write_bytes(out, number, o.raw());
    }
}

// ── Messages ────────────────────────────────────────────────────

impl Message for FileDescriptorSet {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.file.push(nested(tag, r, "FileDescriptorSet.file")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_msgs(out, 1, &self.file);
    }
}

impl Message for FileDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "FileDescriptorProto.name")?),
            2 => self.package = Some(r.read_string(tag, "FileDescriptorProto.package")?),
            3 => self
                .dependency
                .push(r.read_string(tag, "FileDescriptorProto.dependency")?),
            4 => self
                .message_type
                .push(nested(tag, r, "FileDescriptorProto.message_type")?),
            5 => self
                .enum_type
                .push(nested(tag, r, "FileDescriptorProto.enum_type")?),
            6 => self.service.push(nested(tag, r, "FileDescriptorProto.service")?),
            7 => self
                .extension
                .push(nested(tag, r, "FileDescriptorProto.extension")?),
            8 => options(&mut self.options, tag, r, "FileDescriptorProto.options")?,
            10 => r.read_int32_into(tag, "FileDescriptorProto.public_dependency", &mut self.public_dependency)?,
            11 => r.read_int32_into(tag, "FileDescriptorProto.weak_dependency", &mut self.weak_dependency)?,
            12 => self.syntax = Some(r.read_string(tag, "FileDescriptorProto.syntax")?),
            14 => self.edition = Some(r.read_int32(tag, "FileDescriptorProto.edition")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_str(out, 2, &self.package);
        put_strs(out, 3, &self.dependency);
        put_msgs(out, 4, &self.message_type);
        put_msgs(out, 5, &self.enum_type);
        put_msgs(out, 6, &self.service);
        put_msgs(out, 7, &self.extension);
        put_options(out, 8, &self.options);
        for &d in &self.public_dependency {
            wire::write_int32(out, 10, d);
        }
        for &d in &self.weak_dependency {
            wire::write_int32(out, 11, d);
        }
        put_str(out, 12, &self.syntax);
        put_int32(out, 14, self.edition);
    }
}

impl Message for DescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "DescriptorProto.name")?),
            2 => self.field.push(nested(tag, r, "DescriptorProto.field")?),
            3 => self
                .nested_type
                .push(nested(tag, r, "DescriptorProto.nested_type")?),
            4 => self.enum_type.push(nested(tag, r, "DescriptorProto.enum_type")?),
            5 => self
                .extension_range
                .push(nested(tag, r, "DescriptorProto.extension_range")?),
            6 => self.extension.push(nested(tag, r, "DescriptorProto.extension")?),
            7 => options(&mut self.options, tag, r, "DescriptorProto.options")?,
            8 => self.oneof_decl.push(nested(tag, r, "DescriptorProto.oneof_decl")?),
            9 => self
                .reserved_range
                .push(nested(tag, r, "DescriptorProto.reserved_range")?),
            10 => self
                .reserved_name
                .push(r.read_string(tag, "DescriptorProto.reserved_name")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_msgs(out, 2, &self.field);
        put_msgs(out, 3, &self.nested_type);
        put_msgs(out, 4, &self.enum_type);
        put_msgs(out, 5, &self.extension_range);
        put_msgs(out, 6, &self.extension);
        put_options(out, 7, &self.options);
        put_msgs(out, 8, &self.oneof_decl);
        put_msgs(out, 9, &self.reserved_range);
        put_strs(out, 10, &self.reserved_name);
    }
}

impl Message for ExtensionRange {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.start = Some(r.read_int32(tag, "ExtensionRange.start")?),
            2 => self.end = Some(r.read_int32(tag, "ExtensionRange.end")?),
            3 => options(&mut self.options, tag, r, "ExtensionRange.options")?,
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_int32(out, 1, self.start);
        put_int32(out, 2, self.end);
        put_options(out, 3, &self.options);
    }
}

impl Message for ReservedRange {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.start = Some(r.read_int32(tag, "ReservedRange.start")?),
            2 => self.end = Some(r.read_int32(tag, "ReservedRange.end")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_int32(out, 1, self.start);
        put_int32(out, 2, self.end);
    }
}

impl Message for FieldDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "FieldDescriptorProto.name")?),
            2 => self.extendee = Some(r.read_string(tag, "FieldDescriptorProto.extendee")?),
            3 => self.number = Some(r.read_int32(tag, "FieldDescriptorProto.number")?),
            4 => self.label = Some(r.read_int32(tag, "FieldDescriptorProto.label")?),
            5 => self.r#type = Some(r.read_int32(tag, "FieldDescriptorProto.type")?),
            6 => self.type_name = Some(r.read_string(tag, "FieldDescriptorProto.type_name")?),
            7 => {
                self.default_value =
                    Some(r.read_string(tag, "FieldDescriptorProto.default_value")?)
            }
            8 => options(&mut self.options, tag, r, "FieldDescriptorProto.options")?,
            9 => self.oneof_index = Some(r.read_int32(tag, "FieldDescriptorProto.oneof_index")?),
            10 => self.json_name = Some(r.read_string(tag, "FieldDescriptorProto.json_name")?),
            17 => {
                self.proto3_optional =
                    Some(r.read_bool(tag, "FieldDescriptorProto.proto3_optional")?)
            }
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_str(out, 2, &self.extendee);
        put_int32(out, 3, self.number);
        put_int32(out, 4, self.label);
        put_int32(out, 5, self.r#type);
        put_str(out, 6, &self.type_name);
        put_str(out, 7, &self.default_value);
        put_options(out, 8, &self.options);
        put_int32(out, 9, self.oneof_index);
        put_str(out, 10, &self.json_name);
        put_bool(out, 17, self.proto3_optional);
    }
}

impl Message for OneofDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "OneofDescriptorProto.name")?),
            2 => options(&mut self.options, tag, r, "OneofDescriptorProto.options")?,
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_options(out, 2, &self.options);
    }
}

impl Message for EnumDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "EnumDescriptorProto.name")?),
            2 => self.value.push(nested(tag, r, "EnumDescriptorProto.value")?),
            3 => options(&mut self.options, tag, r, "EnumDescriptorProto.options")?,
            4 => self
                .reserved_range
                .push(nested(tag, r, "EnumDescriptorProto.reserved_range")?),
            5 => self
                .reserved_name
                .push(r.read_string(tag, "EnumDescriptorProto.reserved_name")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_msgs(out, 2, &self.value);
        put_options(out, 3, &self.options);
        put_msgs(out, 4, &self.reserved_range);
        put_strs(out, 5, &self.reserved_name);
    }
}

impl Message for EnumReservedRange {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.start = Some(r.read_int32(tag, "EnumReservedRange.start")?),
            2 => self.end = Some(r.read_int32(tag, "EnumReservedRange.end")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_int32(out, 1, self.start);
        put_int32(out, 2, self.end);
    }
}

impl Message for EnumValueDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "EnumValueDescriptorProto.name")?),
            2 => self.number = Some(r.read_int32(tag, "EnumValueDescriptorProto.number")?),
            3 => options(&mut self.options, tag, r, "EnumValueDescriptorProto.options")?,
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_int32(out, 2, self.number);
        put_options(out, 3, &self.options);
    }
}

impl Message for ServiceDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "ServiceDescriptorProto.name")?),
            2 => self.method.push(nested(tag, r, "ServiceDescriptorProto.method")?),
            3 => options(&mut self.options, tag, r, "ServiceDescriptorProto.options")?,
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_msgs(out, 2, &self.method);
        put_options(out, 3, &self.options);
    }
}

impl Message for MethodDescriptorProto {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.name = Some(r.read_string(tag, "MethodDescriptorProto.name")?),
            2 => self.input_type = Some(r.read_string(tag, "MethodDescriptorProto.input_type")?),
            3 => {
                self.output_type = Some(r.read_string(tag, "MethodDescriptorProto.output_type")?)
            }
            4 => options(&mut self.options, tag, r, "MethodDescriptorProto.options")?,
            5 => {
                self.client_streaming =
                    Some(r.read_bool(tag, "MethodDescriptorProto.client_streaming")?)
            }
            6 => {
                self.server_streaming =
                    Some(r.read_bool(tag, "MethodDescriptorProto.server_streaming")?)
            }
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.name);
        put_str(out, 2, &self.input_type);
        put_str(out, 3, &self.output_type);
        put_options(out, 4, &self.options);
        put_bool(out, 5, self.client_streaming);
        put_bool(out, 6, self.server_streaming);
    }
}
