//! Error types for building and loading definitions.

use std::error::Error;
use std::fmt;

use hpb_arena::ArenaError;
use hpb_core::FieldType;
use hpb_descriptor::DecodeError;
use hpb_mini::MiniTableError;

/// Why a file could not be added to a [`DefPool`](crate::DefPool).
///
/// Every variant aborts the whole file; the pool is left as it was before
/// the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefError {
    /// A file with this name is already loaded.
    DuplicateFile {
        /// The file name.
        name: String,
    },
    /// A fully qualified name is already taken in the pool.
    DuplicateSymbol {
        /// The colliding full name.
        name: String,
    },
    /// An identifier or dotted name is malformed.
    InvalidName {
        /// The offending name.
        name: String,
    },
    /// A def that needs a name has none.
    MissingName {
        /// What kind of def it was, e.g. `"field"`.
        kind: &'static str,
    },
    /// The file name contains a NUL byte.
    FileNameNul,
    /// `syntax` is neither `"proto2"` nor `"proto3"`.
    InvalidSyntax {
        /// The declared syntax.
        value: String,
    },
    /// A dependency has not been loaded into the pool yet.
    MissingDependency {
        /// The dependency's file name.
        name: String,
    },
    /// A public or weak dependency index points outside `dependency`.
    DependencyIndex {
        /// `"public_dep"` or `"weak_dep"`.
        kind: &'static str,
        /// The out-of-range index.
        index: i32,
    },
    /// A message, group or enum field without `type_name`.
    MissingTypeName {
        /// Field full name.
        field: String,
        /// Declared type.
        field_type: FieldType,
    },
    /// A scalar field that carries a `type_name`.
    UnexpectedTypeName {
        /// Field full name.
        field: String,
        /// Declared type.
        field_type: FieldType,
    },
    /// `type` is absent without a `type_name`, or outside `1..=18`.
    InvalidFieldType {
        /// Field full name.
        field: String,
        /// The raw declared value, `0` when absent.
        value: i32,
    },
    /// `label` is outside `1..=3`.
    InvalidLabel {
        /// Field full name.
        field: String,
        /// The raw declared value.
        value: i32,
    },
    /// A proto3 field declared `required`.
    Proto3Required {
        /// Field full name.
        field: String,
    },
    /// A oneof member that is not `optional`.
    OneofLabel {
        /// Field full name.
        field: String,
    },
    /// `oneof_index` does not name a oneof of the message.
    OneofIndex {
        /// Field full name.
        field: String,
        /// The declared index.
        index: i32,
    },
    /// An extension declared a `oneof_index`.
    ExtensionInOneof {
        /// Extension full name.
        field: String,
    },
    /// A proto3 `optional` field that is not wrapped in a synthetic oneof.
    Proto3OptionalOutsideOneof {
        /// Field full name.
        field: String,
    },
    /// Field number outside `1..=2^29-1`.
    FieldNumber {
        /// Field full name.
        field: String,
        /// The declared number.
        number: i32,
    },
    /// Two members of one message share a name.
    DuplicateFieldName {
        /// The colliding short name.
        name: String,
    },
    /// A field's JSON name collides with another member.
    DuplicateJsonName {
        /// The colliding JSON name.
        name: String,
    },
    /// Two fields of one message share a number.
    DuplicateFieldNumber {
        /// The colliding number.
        number: u32,
    },
    /// A oneof name collides with another member of its message.
    DuplicateOneofName {
        /// Oneof full name.
        name: String,
    },
    /// Two members of one oneof share a number or name.
    DuplicateOneofField {
        /// Oneof full name.
        oneof: String,
        /// The colliding member name.
        field: String,
    },
    /// A synthetic oneof with other than one member.
    SyntheticOneofSize {
        /// Oneof short name.
        oneof: String,
        /// Its member count.
        count: usize,
    },
    /// A real oneof declared after a synthetic one.
    SyntheticOneofOrder {
        /// Short name of the misplaced real oneof.
        oneof: String,
    },
    /// A message-set message that declares regular fields.
    MessageSetFields {
        /// Message full name.
        message: String,
    },
    /// A map entry without exactly two fields.
    MapEntryFields {
        /// Message full name.
        message: String,
        /// Its field count.
        count: usize,
    },
    /// An extension range outside `1 <= start < end <= max`.
    ExtensionRange {
        /// Declared start.
        start: i32,
        /// Declared end, exclusive.
        end: i32,
        /// Message full name.
        message: String,
    },
    /// A reserved range outside `1 <= start < end <= 2^29`.
    ReservedRange {
        /// Declared start.
        start: i32,
        /// Declared end, exclusive.
        end: i32,
        /// Message full name.
        message: String,
    },
    /// An enum reserved range with `end < start`.
    EnumReservedRange {
        /// Declared start.
        start: i32,
        /// Declared end, inclusive.
        end: i32,
        /// Enum full name.
        name: String,
    },
    /// An enum without values.
    EmptyEnum {
        /// Enum full name.
        name: String,
    },
    /// A proto3 enum whose first value is not zero.
    Proto3EnumZero {
        /// Enum full name.
        name: String,
    },
    /// A type name that matches no symbol in scope.
    UnresolvedName {
        /// The name as written.
        name: String,
    },
    /// A type name that resolved to the wrong kind of def.
    TypeMismatch {
        /// The name as written.
        name: String,
        /// What the reference needed, e.g. `"message"`.
        expected: &'static str,
    },
    /// An extension without `extendee`.
    MissingExtendee {
        /// Extension full name.
        field: String,
    },
    /// An extension number outside every extension range of its extendee.
    ExtensionNumber {
        /// The extension number.
        number: u32,
        /// Extension full name.
        field: String,
        /// Extendee full name.
        message: String,
    },
    /// A proto3 field with `default_value`.
    Proto3Default {
        /// Field full name.
        field: String,
    },
    /// A message or group field with `default_value`.
    MessageDefault {
        /// Field full name.
        field: String,
    },
    /// A default that does not parse as the field's type.
    InvalidDefault {
        /// The default as written.
        value: String,
        /// Field full name.
        field: String,
        /// Field type.
        field_type: FieldType,
    },
    /// A numeric default of 63 bytes or more.
    DefaultTooLong {
        /// The default as written.
        value: String,
    },
    /// Precompiled layouts do not line up with the file.
    LayoutCount {
        /// `"Message"`, `"Enum"` or `"Extension"`.
        kind: &'static str,
        /// Count the file needs.
        expected: usize,
        /// Count the layout supplied.
        found: usize,
    },
    /// The platform was changed after files were loaded.
    PlatformLocked,
    /// Compiling or linking a layout failed.
    Layout {
        /// Full name of the def whose layout failed.
        name: String,
        /// The layout compiler's error.
        source: MiniTableError,
    },
    /// The serialized descriptor could not be decoded.
    Decode(DecodeError),
    /// An arena budget was exhausted.
    OutOfMemory(ArenaError),
}

impl fmt::Display for DefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFile { name } => write!(f, "duplicate file name {name}"),
            Self::DuplicateSymbol { name } => write!(f, "duplicate symbol '{name}'"),
            Self::InvalidName { name } => write!(f, "invalid name: '{name}'"),
            Self::MissingName { kind } => write!(f, "{kind} has no name"),
            Self::FileNameNul => write!(f, "File name contained embedded NULL"),
            Self::InvalidSyntax { value } => write!(f, "Invalid syntax '{value}'"),
            Self::MissingDependency { name } => {
                write!(f, "Depends on file '{name}', but it has not been loaded")
            }
            Self::DependencyIndex { kind, index } => write!(f, "{kind} {index} is out of range"),
            Self::MissingTypeName { field, field_type } => write!(
                f,
                "field of type {} requires type name ({field})",
                *field_type as u8
            ),
            Self::UnexpectedTypeName { field, field_type } => write!(
                f,
                "invalid type for field with type_name set ({field}, {})",
                *field_type as u8
            ),
            Self::InvalidFieldType { field, value } => {
                write!(f, "invalid type for field {field} ({value})")
            }
            Self::InvalidLabel { field, value } => {
                write!(f, "invalid label for field {field} ({value})")
            }
            Self::Proto3Required { field } => {
                write!(f, "proto3 fields cannot be required ({field})")
            }
            Self::OneofLabel { field } => {
                write!(f, "fields in oneof must have OPTIONAL label ({field})")
            }
            Self::OneofIndex { field, index } => {
                write!(f, "oneof_index {index} out of range ({field})")
            }
            Self::ExtensionInOneof { field } => {
                write!(f, "oneof_index provided for extension field ({field})")
            }
            Self::Proto3OptionalOutsideOneof { field } => write!(
                f,
                "non-extension field ({field}) with proto3_optional was not in a oneof"
            ),
            Self::FieldNumber { field, number } => {
                write!(f, "invalid field number ({number}) for {field}")
            }
            Self::DuplicateFieldName { name } => write!(f, "duplicate field name ({name})"),
            Self::DuplicateJsonName { name } => write!(f, "duplicate json_name ({name})"),
            Self::DuplicateFieldNumber { number } => {
                write!(f, "duplicate field number ({number})")
            }
            Self::DuplicateOneofName { name } => write!(f, "duplicate oneof name ({name})"),
            Self::DuplicateOneofField { oneof, field } => {
                write!(f, "oneof fields have the same name or number ({oneof}: {field})")
            }
            Self::SyntheticOneofSize { oneof, count } => write!(
                f,
                "Synthetic oneofs must have one field, not {count}: {oneof}"
            ),
            Self::SyntheticOneofOrder { oneof } => {
                write!(f, "Synthetic oneofs must be after all other oneofs: {oneof}")
            }
            Self::MessageSetFields { message } => write!(f, "invalid message set ({message})"),
            Self::MapEntryFields { message, count } => write!(
                f,
                "map entry {message} must have exactly two fields, not {count}"
            ),
            Self::ExtensionRange { start, end, message } => write!(
                f,
                "Extension range ({start}, {end}) is invalid, message={message}"
            ),
            Self::ReservedRange { start, end, message } => write!(
                f,
                "Reserved range ({start}, {end}) is invalid, message={message}"
            ),
            Self::EnumReservedRange { start, end, name } => write!(
                f,
                "Reserved range ({start}, {end}) is invalid, enum={name}"
            ),
            Self::EmptyEnum { name } => {
                write!(f, "enums must contain at least one value ({name})")
            }
            Self::Proto3EnumZero { name } => {
                write!(f, "for proto3, the first enum value must be zero ({name})")
            }
            Self::UnresolvedName { name } => write!(f, "couldn't resolve name '{name}'"),
            Self::TypeMismatch { name, expected } => write!(
                f,
                "type mismatch when resolving {name}: expected {expected}"
            ),
            Self::MissingExtendee { field } => {
                write!(f, "extension for field '{field}' had no extendee")
            }
            Self::ExtensionNumber {
                number,
                field,
                message,
            } => write!(
                f,
                "field number {number} in extension {field} has no extension range in message {message}"
            ),
            Self::Proto3Default { field } => {
                write!(f, "proto3 fields cannot have explicit defaults ({field})")
            }
            Self::MessageDefault { field } => {
                write!(f, "message fields cannot have explicit defaults ({field})")
            }
            Self::InvalidDefault {
                value,
                field,
                field_type,
            } => write!(
                f,
                "Invalid default '{value}' for field {field} of type {}",
                *field_type as u8
            ),
            Self::DefaultTooLong { value } => write!(f, "Default too long: {value}"),
            Self::LayoutCount {
                kind,
                expected,
                found,
            } => write!(
                f,
                "{kind} count did not match layout ({found} vs {expected})"
            ),
            Self::PlatformLocked => {
                write!(f, "platform cannot change once files are loaded")
            }
            Self::Layout { name, source } => write!(f, "{name}: {source}"),
            Self::Decode(e) => write!(f, "invalid descriptor: {e}"),
            Self::OutOfMemory(_) => write!(f, "Out of memory"),
        }
    }
}

impl Error for DefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Layout { source, .. } => Some(source),
            Self::Decode(e) => Some(e),
            Self::OutOfMemory(e) => Some(e),
            _ => None,
        }
    }
}

impl DefError {
    /// Wrap a layout-compiler failure for the def `name`. Arena failures
    /// surface as [`DefError::OutOfMemory`].
    pub(crate) fn layout(name: &str, source: MiniTableError) -> Self {
        match source {
            MiniTableError::Arena(e) => Self::OutOfMemory(e),
            source => Self::Layout {
                name: name.to_owned(),
                source,
            },
        }
    }
}

impl From<ArenaError> for DefError {
    fn from(e: ArenaError) -> Self {
        Self::OutOfMemory(e)
    }
}

impl From<DecodeError> for DefError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_count_message() {
        let e = DefError::LayoutCount {
            kind: "Extension",
            expected: 2,
            found: 1,
        };
        assert_eq!(e.to_string(), "Extension count did not match layout (1 vs 2)");
    }

    #[test]
    fn out_of_memory_has_source() {
        let e = DefError::from(ArenaError::OutOfMemory { requested: 64 });
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "Out of memory");
    }

    #[test]
    fn default_message_names_type_number() {
        let e = DefError::InvalidDefault {
            value: "abc".into(),
            field: "pkg.M.x".into(),
            field_type: FieldType::Int32,
        };
        assert_eq!(e.to_string(), "Invalid default 'abc' for field pkg.M.x of type 5");
    }
}
