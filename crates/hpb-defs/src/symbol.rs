//! Tagged references stored as string-table values.
//!
//! Both the pool's symbol table and a message's member table map names to
//! a def of one of several kinds. The kind lives in the low three bits of
//! the stored word and the per-kind index above it.

use crate::id::{EnumId, EnumValueId, FieldId, MessageId, OneofId, ServiceId};

const TAG_BITS: u32 = 3;
const TAG_MASK: u64 = (1 << TAG_BITS) - 1;

/// A pool-level symbol: anything with a fully qualified name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefRef {
    /// An extension field.
    Extension(FieldId),
    /// A message type.
    Message(MessageId),
    /// An enum type.
    Enum(EnumId),
    /// An enum value. Values are scoped beside their enum, not inside it.
    EnumValue(EnumValueId),
    /// A service.
    Service(ServiceId),
}

impl DefRef {
    /// Pack into a table word.
    pub fn pack(self) -> u64 {
        let (index, tag) = match self {
            Self::Extension(id) => (id.0, 0),
            Self::Message(id) => (id.0, 1),
            Self::Enum(id) => (id.0, 2),
            Self::EnumValue(id) => (id.0, 3),
            Self::Service(id) => (id.0, 4),
        };
        (u64::from(index) << TAG_BITS) | tag
    }

    /// Unpack a table word written by [`DefRef::pack`].
    pub fn unpack(word: u64) -> Option<Self> {
        let index = u32::try_from(word >> TAG_BITS).ok()?;
        Some(match word & TAG_MASK {
            0 => Self::Extension(FieldId(index)),
            1 => Self::Message(MessageId(index)),
            2 => Self::Enum(EnumId(index)),
            3 => Self::EnumValue(EnumValueId(index)),
            4 => Self::Service(ServiceId(index)),
            _ => return None,
        })
    }

    /// Human-readable kind, used in resolution errors.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Extension(_) => "extension",
            Self::Message(_) => "message",
            Self::Enum(_) => "enum",
            Self::EnumValue(_) => "enum value",
            Self::Service(_) => "service",
        }
    }
}

/// A member of a message, found by short name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Member {
    /// A field, by its declared name.
    Field(FieldId),
    /// A oneof.
    Oneof(OneofId),
    /// A field, by its JSON name.
    JsonName(FieldId),
}

impl Member {
    pub(crate) fn pack(self) -> u64 {
        let (index, tag) = match self {
            Self::Field(id) => (id.0, 0),
            Self::Oneof(id) => (id.0, 1),
            Self::JsonName(id) => (id.0, 2),
        };
        (u64::from(index) << TAG_BITS) | tag
    }

    pub(crate) fn unpack(word: u64) -> Option<Self> {
        let index = u32::try_from(word >> TAG_BITS).ok()?;
        Some(match word & TAG_MASK {
            0 => Self::Field(FieldId(index)),
            1 => Self::Oneof(OneofId(index)),
            2 => Self::JsonName(FieldId(index)),
            _ => return None,
        })
    }
}
