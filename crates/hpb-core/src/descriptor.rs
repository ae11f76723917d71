//! Descriptor constants: field types, C types, labels and syntax.
//!
//! The numeric values of [`FieldType`] and [`Label`] are the ones used on
//! the wire by `FieldDescriptorProto`, so they convert losslessly to and
//! from the raw `i32` found in a descriptor.

use std::fmt;

use crate::error::ConstantError;

/// The declared type of a field, as numbered in `FieldDescriptorProto.Type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    /// `double`
    Double = 1,
    /// `float`
    Float = 2,
    /// `int64`
    Int64 = 3,
    /// `uint64`
    UInt64 = 4,
    /// `int32`
    Int32 = 5,
    /// `fixed64`
    Fixed64 = 6,
    /// `fixed32`
    Fixed32 = 7,
    /// `bool`
    Bool = 8,
    /// `string`
    String = 9,
    /// Legacy delimited group.
    Group = 10,
    /// Embedded message.
    Message = 11,
    /// `bytes`
    Bytes = 12,
    /// `uint32`
    UInt32 = 13,
    /// Enum value (int32 on the wire).
    Enum = 14,
    /// `sfixed32`
    SFixed32 = 15,
    /// `sfixed64`
    SFixed64 = 16,
    /// `sint32` (zigzag)
    SInt32 = 17,
    /// `sint64` (zigzag)
    SInt64 = 18,
}

impl FieldType {
    /// All field types in numeric order.
    pub const ALL: [FieldType; 18] = [
        Self::Double,
        Self::Float,
        Self::Int64,
        Self::UInt64,
        Self::Int32,
        Self::Fixed64,
        Self::Fixed32,
        Self::Bool,
        Self::String,
        Self::Group,
        Self::Message,
        Self::Bytes,
        Self::UInt32,
        Self::Enum,
        Self::SFixed32,
        Self::SFixed64,
        Self::SInt32,
        Self::SInt64,
    ];

    /// Convert a raw descriptor value, returning `None` outside `1..=18`.
    pub fn from_i32(v: i32) -> Option<Self> {
        if (1..=18).contains(&v) {
            Some(Self::ALL[(v - 1) as usize])
        } else {
            None
        }
    }

    /// Whether a repeated field of this type may use packed encoding.
    pub fn is_packable(self) -> bool {
        !matches!(
            self,
            Self::String | Self::Bytes | Self::Message | Self::Group
        )
    }

    /// The in-memory value type that holds this field type.
    pub fn ctype(self) -> CType {
        match self {
            Self::Double => CType::Double,
            Self::Float => CType::Float,
            Self::Int64 | Self::SInt64 | Self::SFixed64 => CType::Int64,
            Self::Int32 | Self::SFixed32 | Self::SInt32 => CType::Int32,
            Self::UInt64 | Self::Fixed64 => CType::UInt64,
            Self::UInt32 | Self::Fixed32 => CType::UInt32,
            Self::Enum => CType::Enum,
            Self::Bool => CType::Bool,
            Self::String => CType::String,
            Self::Bytes => CType::Bytes,
            Self::Group | Self::Message => CType::Message,
        }
    }
}

impl TryFrom<i32> for FieldType {
    type Error = ConstantError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_i32(value).ok_or(ConstantError::InvalidFieldType { value })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// The in-memory representation class of a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CType {
    /// `bool`
    Bool = 1,
    /// `f32`
    Float = 2,
    /// `i32`
    Int32 = 3,
    /// `u32`
    UInt32 = 4,
    /// Enum values are stored as `i32`.
    Enum = 5,
    /// Reference to a sub-message.
    Message = 6,
    /// `f64`
    Double = 7,
    /// `i64`
    Int64 = 8,
    /// `u64`
    UInt64 = 9,
    /// UTF-8 string.
    String = 10,
    /// Raw bytes.
    Bytes = 11,
}

/// Field cardinality, as numbered in `FieldDescriptorProto.Label`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Label {
    /// Singular field.
    Optional = 1,
    /// Singular field that must be present (proto2 only).
    Required = 2,
    /// Repeated field.
    Repeated = 3,
}

impl Label {
    /// Convert a raw descriptor value, returning `None` outside `1..=3`.
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Self::Optional),
            2 => Some(Self::Required),
            3 => Some(Self::Repeated),
            _ => None,
        }
    }
}

impl TryFrom<i32> for Label {
    type Error = ConstantError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_i32(value).ok_or(ConstantError::InvalidLabel { value })
    }
}

/// Schema language revision of a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `syntax = "proto2"` (also the default when unspecified).
    #[default]
    Proto2 = 2,
    /// `syntax = "proto3"`.
    Proto3 = 3,
}

impl Syntax {
    /// Parse the `syntax` field of a file descriptor. `None` means absent.
    pub fn parse(s: Option<&str>) -> Result<Self, ConstantError> {
        match s {
            None | Some("proto2") => Ok(Self::Proto2),
            Some("proto3") => Ok(Self::Proto3),
            Some(other) => Err(ConstantError::InvalidSyntax {
                value: other.to_string(),
            }),
        }
    }

    /// The string spelling used in descriptors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proto2 => "proto2",
            Self::Proto3 => "proto3",
        }
    }
}

/// Target pointer width for compiled layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 4-byte pointers.
    Bits32,
    /// 8-byte pointers.
    Bits64,
    /// Whatever the host uses.
    #[default]
    Native,
}

impl Platform {
    /// Resolve `Native` to the host pointer width.
    pub fn resolve(self) -> Self {
        match self {
            Self::Native if cfg!(target_pointer_width = "32") => Self::Bits32,
            Self::Native => Self::Bits64,
            other => other,
        }
    }

    /// Pointer size in bytes on this platform.
    pub fn pointer_size(self) -> u16 {
        match self.resolve() {
            Self::Bits32 => 4,
            _ => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trips_raw_values() {
        for (i, ty) in FieldType::ALL.iter().enumerate() {
            assert_eq!(*ty as i32, i as i32 + 1);
            assert_eq!(FieldType::from_i32(i as i32 + 1), Some(*ty));
        }
        assert_eq!(FieldType::from_i32(0), None);
        assert_eq!(FieldType::from_i32(19), None);
    }

    #[test]
    fn unpackable_types() {
        let unpackable: Vec<_> = FieldType::ALL
            .iter()
            .filter(|t| !t.is_packable())
            .copied()
            .collect();
        assert_eq!(
            unpackable,
            vec![
                FieldType::String,
                FieldType::Group,
                FieldType::Message,
                FieldType::Bytes
            ]
        );
    }

    #[test]
    fn syntax_defaults_to_proto2() {
        assert_eq!(Syntax::parse(None).unwrap(), Syntax::Proto2);
        assert_eq!(Syntax::parse(Some("proto3")).unwrap(), Syntax::Proto3);
        let err = Syntax::parse(Some("proto4")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid syntax 'proto4'");
    }

    #[test]
    fn label_rejects_zero() {
        assert!(Label::try_from(0).is_err());
        assert_eq!(Label::try_from(3).unwrap(), Label::Repeated);
    }

    #[test]
    fn platform_pointer_sizes() {
        assert_eq!(Platform::Bits32.pointer_size(), 4);
        assert_eq!(Platform::Bits64.pointer_size(), 8);
        assert_ne!(Platform::Native.resolve(), Platform::Native);
    }
}
