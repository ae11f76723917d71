//! Constants of the mini-descriptor grammar and the modifier bit sets
//! shared by the encoder, the decoder and the def layer.

use hpb_core::FieldType;

/// Version characters that open each kind of descriptor.
pub mod version {
    /// Enum descriptor.
    pub const ENUM: u8 = b'!';
    /// Extension descriptor.
    pub const EXTENSION: u8 = b'#';
    /// Message descriptor.
    pub const MESSAGE: u8 = b'$';
    /// Map-entry descriptor.
    pub const MAP: u8 = b'%';
    /// Message-set descriptor.
    pub const MESSAGE_SET: u8 = b'&';
}

/// Character ranges and separators inside a descriptor.
pub mod value {
    /// First character of a field type.
    pub const MIN_FIELD: u8 = b' ';
    /// Last character of a field type.
    pub const MAX_FIELD: u8 = b'I';
    /// First character of a modifier varint.
    pub const MIN_MODIFIER: u8 = b'L';
    /// Last character of a modifier varint.
    pub const MAX_MODIFIER: u8 = b'[';
    /// Ends the field list and starts the oneof section.
    pub const END: u8 = b'^';
    /// First character of a skip varint.
    pub const MIN_SKIP: u8 = b'_';
    /// Last character of a skip varint.
    pub const MAX_SKIP: u8 = b'~';
    /// Separates two oneofs.
    pub const ONEOF_SEPARATOR: u8 = b'~';
    /// Separates two members of one oneof.
    pub const FIELD_SEPARATOR: u8 = b'|';
    /// First character of a oneof member number.
    pub const MIN_ONEOF_FIELD: u8 = b' ';
    /// Last character of a oneof member number.
    pub const MAX_ONEOF_FIELD: u8 = b'b';
    /// Last character of a five-value enum presence mask.
    pub const MAX_ENUM_MASK: u8 = b'A';
}

/// Field type as it appears in a descriptor, before the repeated offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EncodedType {
    /// `double`
    Double = 0,
    /// `float`
    Float = 1,
    /// `fixed32`
    Fixed32 = 2,
    /// `fixed64`
    Fixed64 = 3,
    /// `sfixed32`
    SFixed32 = 4,
    /// `sfixed64`
    SFixed64 = 5,
    /// `int32`
    Int32 = 6,
    /// `uint32`
    UInt32 = 7,
    /// `sint32`
    SInt32 = 8,
    /// `int64`
    Int64 = 9,
    /// `uint64`
    UInt64 = 10,
    /// `sint64`
    SInt64 = 11,
    /// Enum without closed-value checking.
    OpenEnum = 12,
    /// `bool`
    Bool = 13,
    /// `bytes`
    Bytes = 14,
    /// `string`
    String = 15,
    /// Delimited group.
    Group = 16,
    /// Sub-message.
    Message = 17,
    /// Enum whose values are checked against its table.
    ClosedEnum = 18,
}

/// Added to an [`EncodedType`] for repeated fields.
pub const REPEATED_BASE: u8 = 20;

impl EncodedType {
    /// Decode an encoded type value (`0..=18`).
    pub fn from_u8(v: u8) -> Option<Self> {
        use EncodedType::*;
        Some(match v {
            0 => Double,
            1 => Float,
            2 => Fixed32,
            3 => Fixed64,
            4 => SFixed32,
            5 => SFixed64,
            6 => Int32,
            7 => UInt32,
            8 => SInt32,
            9 => Int64,
            10 => UInt64,
            11 => SInt64,
            12 => OpenEnum,
            13 => Bool,
            14 => Bytes,
            15 => String,
            16 => Group,
            17 => Message,
            18 => ClosedEnum,
            _ => return None,
        })
    }

    /// The encoded form of a declared field type. Enums encode as open.
    pub fn from_field_type(t: FieldType) -> Self {
        match t {
            FieldType::Double => Self::Double,
            FieldType::Float => Self::Float,
            FieldType::Int64 => Self::Int64,
            FieldType::UInt64 => Self::UInt64,
            FieldType::Int32 => Self::Int32,
            FieldType::Fixed64 => Self::Fixed64,
            FieldType::Fixed32 => Self::Fixed32,
            FieldType::Bool => Self::Bool,
            FieldType::String => Self::String,
            FieldType::Group => Self::Group,
            FieldType::Message => Self::Message,
            FieldType::Bytes => Self::Bytes,
            FieldType::UInt32 => Self::UInt32,
            FieldType::Enum => Self::OpenEnum,
            FieldType::SFixed32 => Self::SFixed32,
            FieldType::SFixed64 => Self::SFixed64,
            FieldType::SInt32 => Self::SInt32,
            FieldType::SInt64 => Self::SInt64,
        }
    }

    /// The declared field type this encoding stands for.
    pub fn field_type(self) -> FieldType {
        match self {
            Self::Double => FieldType::Double,
            Self::Float => FieldType::Float,
            Self::Fixed32 => FieldType::Fixed32,
            Self::Fixed64 => FieldType::Fixed64,
            Self::SFixed32 => FieldType::SFixed32,
            Self::SFixed64 => FieldType::SFixed64,
            Self::Int32 => FieldType::Int32,
            Self::UInt32 => FieldType::UInt32,
            Self::SInt32 => FieldType::SInt32,
            Self::Int64 => FieldType::Int64,
            Self::UInt64 => FieldType::UInt64,
            Self::SInt64 => FieldType::SInt64,
            Self::OpenEnum | Self::ClosedEnum => FieldType::Enum,
            Self::Bool => FieldType::Bool,
            Self::Bytes => FieldType::Bytes,
            Self::String => FieldType::String,
            Self::Group => FieldType::Group,
            Self::Message => FieldType::Message,
        }
    }
}

/// Per-field modifier bits as written into a descriptor.
pub mod encoded_modifier {
    /// Packedness differs from the message default.
    pub const FLIP_PACKED: u32 = 1 << 0;
    /// Field is `required`.
    pub const IS_REQUIRED: u32 = 1 << 1;
    /// Proto3 singular field without presence.
    pub const IS_PROTO3_SINGULAR: u32 = 1 << 2;
}

/// Message-level modifier bits, passed to
/// [`MtDataEncoder::start_message`](crate::MtDataEncoder::start_message).
pub mod message_modifier {
    /// String fields must be valid UTF-8.
    pub const VALIDATE_UTF8: u64 = 1 << 0;
    /// Repeated scalars are packed unless flipped.
    pub const DEFAULT_IS_PACKED: u64 = 1 << 1;
    /// The message declares extension ranges.
    pub const IS_EXTENDABLE: u64 = 1 << 2;
}

/// Field-level modifier bits, passed to
/// [`MtDataEncoder::put_field`](crate::MtDataEncoder::put_field).
pub mod field_modifier {
    /// Field is repeated.
    pub const IS_REPEATED: u64 = 1 << 0;
    /// Field uses packed encoding.
    pub const IS_PACKED: u64 = 1 << 1;
    /// Enum field whose enum is closed.
    pub const IS_CLOSED_ENUM: u64 = 1 << 2;
    /// Singular field without explicit presence.
    pub const IS_PROTO3_SINGULAR: u64 = 1 << 3;
    /// Field is `required`.
    pub const IS_REQUIRED: u64 = 1 << 4;
}
