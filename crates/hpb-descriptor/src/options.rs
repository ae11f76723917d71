//! Options messages, decoded on first access.
//!
//! Each descriptor keeps its options as the raw serialized bytes. The
//! typed view is parsed the first time it is asked for and cached; fields
//! this crate does not model are skipped.

use std::cell::OnceCell;
use std::fmt;

use crate::codec::Message;
use crate::error::DecodeError;
use crate::wire::{self, Reader, Tag};

/// Raw option bytes plus a lazily decoded `T`.
pub struct Options<T> {
    raw: Vec<u8>,
    parsed: OnceCell<T>,
}

impl<T: Message> Options<T> {
    /// Wrap serialized option bytes.
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        Self {
            raw,
            parsed: OnceCell::new(),
        }
    }

    /// Serialize `value` and keep it as the parsed view.
    pub fn from_message(value: T) -> Self {
        let raw = value.encode_to_vec();
        let parsed = OnceCell::new();
        let _ = parsed.set(value);
        Self { raw, parsed }
    }

    /// The serialized bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The decoded options, parsing on first call.
    pub fn get(&self) -> Result<&T, DecodeError> {
        if let Some(v) = self.parsed.get() {
            return Ok(v);
        }
        let v = T::decode(&self.raw)?;
        Ok(self.parsed.get_or_init(|| v))
    }
}

impl<T: Message + Clone> Clone for Options<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            parsed: self.parsed.clone(),
        }
    }
}

impl<T> fmt::Debug for Options<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("raw_len", &self.raw.len())
            .field("parsed", &self.parsed.get().is_some())
            .finish()
    }
}

impl<T> PartialEq for Options<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// `google.protobuf.FileOptions`, the subset hpb reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileOptions {
    /// `java_package` (1).
    pub java_package: Option<String>,
    /// `optimize_for` (9).
    pub optimize_for: Option<i32>,
    /// `go_package` (11).
    pub go_package: Option<String>,
    /// `deprecated` (23).
    pub deprecated: Option<bool>,
    /// `cc_enable_arenas` (31).
    pub cc_enable_arenas: Option<bool>,
}

/// `google.protobuf.MessageOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageOptions {
    /// `message_set_wire_format` (1).
    pub message_set_wire_format: Option<bool>,
    /// `no_standard_descriptor_accessor` (2).
    pub no_standard_descriptor_accessor: Option<bool>,
    /// `deprecated` (3).
    pub deprecated: Option<bool>,
    /// `map_entry` (7).
    pub map_entry: Option<bool>,
}

/// `google.protobuf.FieldOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldOptions {
    /// `ctype` (1).
    pub ctype: Option<i32>,
    /// `packed` (2).
    pub packed: Option<bool>,
    /// `deprecated` (3).
    pub deprecated: Option<bool>,
    /// `lazy` (5).
    pub lazy: Option<bool>,
    /// `jstype` (6).
    pub jstype: Option<i32>,
    /// `weak` (10).
    pub weak: Option<bool>,
}

/// `google.protobuf.OneofOptions`. hpb reads none of its fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OneofOptions {}

/// `google.protobuf.EnumOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumOptions {
    /// `allow_alias` (2).
    pub allow_alias: Option<bool>,
    /// `deprecated` (3).
    pub deprecated: Option<bool>,
}

/// `google.protobuf.EnumValueOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumValueOptions {
    /// `deprecated` (1).
    pub deprecated: Option<bool>,
}

/// `google.protobuf.ServiceOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceOptions {
    /// `deprecated` (33).
    pub deprecated: Option<bool>,
}

/// `google.protobuf.MethodOptions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodOptions {
    /// `deprecated` (33).
    pub deprecated: Option<bool>,
}

/// `google.protobuf.ExtensionRangeOptions`. hpb reads none of its fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtensionRangeOptions {}

fn put_bool(out: &mut Vec<u8>, number: u32, v: Option<bool>) {
    if let Some(v) = v {
        wire::write_bool(out, number, v);
    }
}

fn put_int32(out: &mut Vec<u8>, number: u32, v: Option<i32>) {
    if let Some(v) = v {
        wire::write_int32(out, number, v);
    }
}

fn put_str(out: &mut Vec<u8>, number: u32, v: &Option<String>) {
    if let Some(v) = v {
        wire::write_bytes(out, number, v.as_bytes());
    }
}

impl Message for FileOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.java_package = Some(r.read_string(tag, "FileOptions.java_package")?),
            9 => self.optimize_for = Some(r.read_int32(tag, "FileOptions.optimize_for")?),
            11 => self.go_package = Some(r.read_string(tag, "FileOptions.go_package")?),
            23 => self.deprecated = Some(r.read_bool(tag, "FileOptions.deprecated")?),
            31 => self.cc_enable_arenas = Some(r.read_bool(tag, "FileOptions.cc_enable_arenas")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_str(out, 1, &self.java_package);
        put_int32(out, 9, self.optimize_for);
        put_str(out, 11, &self.go_package);
        put_bool(out, 23, self.deprecated);
        put_bool(out, 31, self.cc_enable_arenas);
    }
}

impl Message for MessageOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => {
                self.message_set_wire_format =
                    Some(r.read_bool(tag, "MessageOptions.message_set_wire_format")?)
            }
            2 => {
                self.no_standard_descriptor_accessor =
                    Some(r.read_bool(tag, "MessageOptions.no_standard_descriptor_accessor")?)
            }
            3 => self.deprecated = Some(r.read_bool(tag, "MessageOptions.deprecated")?),
            7 => self.map_entry = Some(r.read_bool(tag, "MessageOptions.map_entry")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_bool(out, 1, self.message_set_wire_format);
        put_bool(out, 2, self.no_standard_descriptor_accessor);
        put_bool(out, 3, self.deprecated);
        put_bool(out, 7, self.map_entry);
    }
}

impl Message for FieldOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.ctype = Some(r.read_int32(tag, "FieldOptions.ctype")?),
            2 => self.packed = Some(r.read_bool(tag, "FieldOptions.packed")?),
            3 => self.deprecated = Some(r.read_bool(tag, "FieldOptions.deprecated")?),
            5 => self.lazy = Some(r.read_bool(tag, "FieldOptions.lazy")?),
            6 => self.jstype = Some(r.read_int32(tag, "FieldOptions.jstype")?),
            10 => self.weak = Some(r.read_bool(tag, "FieldOptions.weak")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_int32(out, 1, self.ctype);
        put_bool(out, 2, self.packed);
        put_bool(out, 3, self.deprecated);
        put_bool(out, 5, self.lazy);
        put_int32(out, 6, self.jstype);
        put_bool(out, 10, self.weak);
    }
}

impl Message for OneofOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        r.skip(tag)
    }

    fn encode_raw(&self, _out: &mut Vec<u8>) {}
}

impl Message for ExtensionRangeOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        r.skip(tag)
    }

    fn encode_raw(&self, _out: &mut Vec<u8>) {}
}

impl Message for EnumOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            2 => self.allow_alias = Some(r.read_bool(tag, "EnumOptions.allow_alias")?),
            3 => self.deprecated = Some(r.read_bool(tag, "EnumOptions.deprecated")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_bool(out, 2, self.allow_alias);
        put_bool(out, 3, self.deprecated);
    }
}

impl Message for EnumValueOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            1 => self.deprecated = Some(r.read_bool(tag, "EnumValueOptions.deprecated")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_bool(out, 1, self.deprecated);
    }
}

impl Message for ServiceOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            33 => self.deprecated = Some(r.read_bool(tag, "ServiceOptions.deprecated")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_bool(out, 33, self.deprecated);
    }
}

impl Message for MethodOptions {
    fn merge_field(&mut self, tag: Tag, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match tag.number {
            33 => self.deprecated = Some(r.read_bool(tag, "MethodOptions.deprecated")?),
            _ => r.skip(tag)?,
        }
        Ok(())
    }

    fn encode_raw(&self, out: &mut Vec<u8>) {
        put_bool(out, 33, self.deprecated);
    }
}
