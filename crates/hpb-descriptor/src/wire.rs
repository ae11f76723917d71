//! Protobuf wire primitives.
//!
//! Only what descriptors need: varints, fixed-width scalars,
//! length-delimited payloads and skipping of unknown fields, including
//! groups.

use crate::error::DecodeError;

/// Deepest nesting of messages or groups the reader accepts.
pub const RECURSION_LIMIT: u32 = 100;

/// The low three bits of a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint.
    Varint = 0,
    /// Little-endian eight bytes.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    Len = 2,
    /// Start of a delimited group.
    StartGroup = 3,
    /// End of a delimited group.
    EndGroup = 4,
    /// Little-endian four bytes.
    Fixed32 = 5,
}

impl WireType {
    fn from_bits(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Varint,
            1 => Self::Fixed64,
            2 => Self::Len,
            3 => Self::StartGroup,
            4 => Self::EndGroup,
            5 => Self::Fixed32,
            _ => return None,
        })
    }
}

/// A decoded tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Field number.
    pub number: u32,
    /// Wire type.
    pub wire_type: WireType,
}

// ── Writers ─────────────────────────────────────────────────────

/// Append a varint.
pub fn write_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

/// Append a tag.
pub fn write_tag(out: &mut Vec<u8>, number: u32, wire_type: WireType) {
    write_varint(out, (u64::from(number) << 3) | wire_type as u64);
}

/// Append an `int32` field. Negative values sign-extend to ten bytes.
pub fn write_int32(out: &mut Vec<u8>, number: u32, v: i32) {
    write_tag(out, number, WireType::Varint);
    write_varint(out, v as i64 as u64);
}

/// Append a `bool` field.
pub fn write_bool(out: &mut Vec<u8>, number: u32, v: bool) {
    write_tag(out, number, WireType::Varint);
    out.push(u8::from(v));
}

/// Append a length-delimited field.
pub fn write_bytes(out: &mut Vec<u8>, number: u32, v: &[u8]) {
    write_tag(out, number, WireType::Len);
    write_varint(out, v.len() as u64);
    out.extend_from_slice(v);
}

/// Append a sub-message field produced by `body`.
pub fn write_message(out: &mut Vec<u8>, number: u32, body: impl FnOnce(&mut Vec<u8>)) {
    let mut scratch = Vec::new();
    body(&mut scratch);
    write_bytes(out, number, &scratch);
}

// ── Reader ──────────────────────────────────────────────────────

/// Cursor over a serialized message.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: u32,
}

impl<'a> Reader<'a> {
    /// Start reading `buf` at nesting depth zero.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
        }
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Read a varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut v: u64 = 0;
        for i in 0..10 {
            let b = *self.buf.get(self.pos).ok_or(DecodeError::Truncated { detail: "varint" })?;
            self.pos += 1;
            v |= u64::from(b & 0x7f) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(v);
            }
        }
        Err(DecodeError::VarintTooLong)
    }

    /// Read a tag.
    pub fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let raw = self.read_varint()?;
        let wire_type = WireType::from_bits((raw & 7) as u8).ok_or(DecodeError::InvalidTag { tag: raw })?;
        let number = u32::try_from(raw >> 3)
            .ok()
            .filter(|&n| n != 0)
            .ok_or(DecodeError::InvalidTag { tag: raw })?;
        Ok(Tag { number, wire_type })
    }

    fn take(&mut self, len: usize, detail: &'static str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&e| e <= self.buf.len())
            .ok_or(DecodeError::Truncated { detail })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a length-delimited payload.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated { detail: "length" })?;
        self.take(len, "length-delimited field")
    }

    /// A reader over a nested message payload, one level deeper.
    pub fn nested(&mut self) -> Result<Reader<'a>, DecodeError> {
        if self.depth >= RECURSION_LIMIT {
            return Err(DecodeError::RecursionLimit);
        }
        let buf = self.read_bytes()?;
        Ok(Reader {
            buf,
            pos: 0,
            depth: self.depth + 1,
        })
    }

    /// Skip the value of a field whose tag was just read.
    pub fn skip(&mut self, tag: Tag) -> Result<(), DecodeError> {
        match tag.wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8, "fixed64")?;
            }
            WireType::Fixed32 => {
                self.take(4, "fixed32")?;
            }
            WireType::Len => {
                self.read_bytes()?;
            }
            WireType::StartGroup => {
                if self.depth >= RECURSION_LIMIT {
                    return Err(DecodeError::RecursionLimit);
                }
                self.depth += 1;
                loop {
                    if self.is_empty() {
                        return Err(DecodeError::UnbalancedGroup { number: tag.number });
                    }
                    let inner = self.read_tag()?;
                    if inner.wire_type == WireType::EndGroup {
                        if inner.number != tag.number {
                            return Err(DecodeError::UnbalancedGroup { number: inner.number });
                        }
                        break;
                    }
                    self.skip(inner)?;
                }
                self.depth -= 1;
            }
            WireType::EndGroup => {
                return Err(DecodeError::UnbalancedGroup { number: tag.number });
            }
        }
        Ok(())
    }

    /// Read a varint field as `int32`, truncating like protobuf does.
    pub fn read_int32(&mut self, tag: Tag, field: &'static str) -> Result<i32, DecodeError> {
        expect(tag, WireType::Varint, field)?;
        Ok(self.read_varint()? as i32)
    }

    /// Read a varint field as `bool`.
    pub fn read_bool(&mut self, tag: Tag, field: &'static str) -> Result<bool, DecodeError> {
        expect(tag, WireType::Varint, field)?;
        Ok(self.read_varint()? != 0)
    }

    /// Read a string field.
    pub fn read_string(&mut self, tag: Tag, field: &'static str) -> Result<String, DecodeError> {
        expect(tag, WireType::Len, field)?;
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Read a repeated `int32` field in either packed or unpacked form.
    pub fn read_int32_into(&mut self, tag: Tag, field: &'static str, out: &mut Vec<i32>) -> Result<(), DecodeError> {
        match tag.wire_type {
            WireType::Varint => out.push(self.read_varint()? as i32),
            WireType::Len => {
                let mut packed = Reader::new(self.read_bytes()?);
                while !packed.is_empty() {
                    out.push(packed.read_varint()? as i32);
                }
            }
            other => {
                return Err(DecodeError::WireTypeMismatch {
                    field,
                    found: other as u8,
                })
            }
        }
        Ok(())
    }
}

/// Fail unless `tag` has wire type `want`.
pub fn expect(tag: Tag, want: WireType, field: &'static str) -> Result<(), DecodeError> {
    if tag.wire_type == want {
        Ok(())
    } else {
        Err(DecodeError::WireTypeMismatch {
            field,
            found: tag.wire_type as u8,
        })
    }
}
