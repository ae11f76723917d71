//! Error types for mini-descriptor encoding, layout building and linking.

use std::error::Error;
use std::fmt;

use hpb_arena::ArenaError;
use hpb_core::FieldType;

use crate::id::MiniTableId;

/// Errors produced while encoding, decoding or linking mini tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MiniTableError {
    /// A descriptor began with the wrong version character.
    InvalidVersion {
        /// Which kind of descriptor was being built.
        kind: &'static str,
        /// The character found.
        found: char,
    },
    /// A character outside every valid range.
    InvalidChar {
        /// The character found.
        found: char,
    },
    /// A field type value outside the encoded-type table.
    InvalidFieldType {
        /// The decoded type value.
        value: u8,
    },
    /// A varint carried more than 32 bits.
    OverlongVarint,
    /// The packed flag was flipped on a field that cannot be packed.
    UnpackableFlip {
        /// Field number.
        number: u32,
    },
    /// Singular or required modifiers on a field without hasbit presence.
    InvalidRepeatedModifier {
        /// Field number.
        number: u32,
    },
    /// A field marked both proto3-singular and required.
    SingularAndRequired {
        /// Field number.
        number: u32,
    },
    /// A oneof with no members.
    EmptyOneof,
    /// A oneof named a field number the message does not have.
    UnknownOneofField {
        /// Field number.
        number: u32,
    },
    /// A repeated, required or singular field was placed in a oneof.
    InvalidOneofField {
        /// Field number.
        number: u32,
    },
    /// More than 63 required fields.
    TooManyRequired,
    /// The message layout exceeds the 16-bit size limit.
    MessageTooLarge {
        /// Maximum size in bytes.
        max: usize,
    },
    /// A map entry without exactly two fields.
    MapFieldCount {
        /// Number of fields found.
        count: usize,
    },
    /// A map entry declared a oneof.
    MapOneof,
    /// A map key or value had the wrong field number.
    MapEntryNumber {
        /// `"key"` or `"val"`.
        name: &'static str,
        /// Required number.
        expected: u32,
        /// Number found.
        found: u32,
    },
    /// A map key or value was repeated.
    MapEntryRepeated {
        /// `"key"` or `"val"`.
        name: &'static str,
    },
    /// A map key or value of a forbidden type.
    MapEntryType {
        /// `"key"` or `"val"`.
        name: &'static str,
        /// The offending type.
        field_type: FieldType,
    },
    /// A message-set descriptor carried a body.
    MessageSetLength {
        /// Body length in bytes.
        len: usize,
    },
    /// An extension descriptor carried message modifiers.
    ExtensionModifiers,
    /// An extension descriptor carried oneofs.
    ExtensionOneofs,
    /// An extension descriptor did not contain exactly one field.
    ExtensionFieldCount {
        /// Number of fields found.
        count: usize,
    },
    /// A message-set extension that is not a singular message.
    InvalidMessageSetExtension {
        /// Field number.
        number: u32,
    },
    /// Field numbers passed to the encoder did not ascend.
    FieldOrder {
        /// The number passed.
        number: u32,
        /// The previous number.
        last: u32,
    },
    /// Enum values passed to the encoder did not ascend.
    EnumOrder {
        /// The value passed.
        value: u32,
        /// The last value already covered.
        last: u32,
    },
    /// A sub-message could not be attached to a field.
    InvalidSubMessage {
        /// Field number.
        number: u32,
    },
    /// A sub-enum could not be attached to a field.
    InvalidSubEnum {
        /// Field number.
        number: u32,
    },
    /// An extension with the same extendee and number is registered.
    DuplicateExtension {
        /// The extended message.
        extendee: MiniTableId,
        /// Field number.
        number: u32,
    },
    /// An arena allocation failed.
    Arena(ArenaError),
}

impl fmt::Display for MiniTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !matches!(
            self,
            Self::FieldOrder { .. }
                | Self::EnumOrder { .. }
                | Self::InvalidSubMessage { .. }
                | Self::InvalidSubEnum { .. }
                | Self::DuplicateExtension { .. }
        ) {
            f.write_str("Error building mini table: ")?;
        }
        match self {
            Self::InvalidVersion { kind, found } => write!(f, "Invalid {kind} version: {found}"),
            Self::InvalidChar { found } => write!(f, "Invalid char: {found}"),
            Self::InvalidFieldType { value } => write!(f, "Invalid field type: {value}"),
            Self::OverlongVarint => write!(f, "Overlong varint"),
            Self::UnpackableFlip { number } => {
                write!(f, "Cannot flip packed on unpackable field {number}")
            }
            Self::InvalidRepeatedModifier { number } => {
                write!(f, "Invalid modifier(s) for repeated field {number}")
            }
            Self::SingularAndRequired { number } => {
                write!(f, "Field {number} cannot be both singular and required")
            }
            Self::EmptyOneof => write!(f, "Empty oneof"),
            Self::UnknownOneofField { number } => write!(
                f,
                "Couldn't add field number {number} to oneof, no such field number."
            ),
            Self::InvalidOneofField { number } => write!(
                f,
                "Cannot add repeated, required, or singular field {number} to oneof."
            ),
            Self::TooManyRequired => write!(f, "Too many required fields"),
            Self::MessageTooLarge { max } => {
                write!(f, "Message size exceeded maximum size of {max} bytes")
            }
            Self::MapFieldCount { count } => write!(f, "{count} fields in map"),
            Self::MapOneof => write!(f, "Map entry cannot have oneof"),
            Self::MapEntryNumber {
                name,
                expected,
                found,
            } => write!(
                f,
                "map {name} did not have expected number ({expected} vs {found})"
            ),
            Self::MapEntryRepeated { name } => write!(
                f,
                "map {name} cannot be repeated or map, or be in oneof"
            ),
            Self::MapEntryType { name, field_type } => {
                write!(f, "map {name} cannot have type {field_type}")
            }
            Self::MessageSetLength { len } => {
                write!(f, "Invalid message set encode length: {len}")
            }
            Self::ExtensionModifiers => write!(f, "Extensions cannot have message modifiers"),
            Self::ExtensionOneofs => write!(f, "Extensions cannot have oneofs."),
            Self::ExtensionFieldCount { count } => {
                write!(f, "Extension must have exactly one field, found {count}")
            }
            Self::InvalidMessageSetExtension { number } => write!(
                f,
                "Message set extension {number} must be a non-repeated message"
            ),
            Self::FieldOrder { number, last } => write!(
                f,
                "field number {number} does not follow field number {last}"
            ),
            Self::EnumOrder { value, last } => {
                write!(f, "enum value {value} is below already encoded value {last}")
            }
            Self::InvalidSubMessage { number } => {
                write!(f, "invalid sub-message for field {number}")
            }
            Self::InvalidSubEnum { number } => write!(f, "invalid sub-enum for field {number}"),
            Self::DuplicateExtension { extendee, number } => {
                write!(f, "extension {number} of table {extendee} is already registered")
            }
            Self::Arena(_) => write!(f, "Out of memory"),
        }
    }
}

impl Error for MiniTableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for MiniTableError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
