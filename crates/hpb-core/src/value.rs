//! Dynamically typed field values.

use crate::descriptor::CType;

/// Size marker for string and bytes elements, which are boxed rather
/// than stored inline.
pub const MAP_TYPE_STRING: usize = 0;

/// Byte width of a map key or value of the given C type.
///
/// String-like types return [`MAP_TYPE_STRING`].
pub const fn ctype_size(ctype: CType) -> usize {
    match ctype {
        CType::Bool => 1,
        CType::Float | CType::Int32 | CType::UInt32 | CType::Enum => 4,
        CType::Message => 8,
        CType::Double | CType::Int64 | CType::UInt64 => 8,
        CType::String | CType::Bytes => MAP_TYPE_STRING,
    }
}

/// Opaque reference to a message instance owned outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageRef(pub u64);

/// A single field value, tagged by its C type.
///
/// Enum values travel as [`MessageValue::Int32`]; string and bytes values
/// share [`MessageValue::Str`].
#[derive(Clone, Debug, PartialEq)]
pub enum MessageValue {
    /// Boolean value.
    Bool(bool),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Signed 32-bit integer (also enums).
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// String or bytes payload.
    Str(Vec<u8>),
    /// Sub-message reference; `None` for an unset message default.
    Message(Option<MessageRef>),
}

impl MessageValue {
    /// The zero value for a C type: `0`, `false`, empty, or no message.
    pub fn zero(ctype: CType) -> Self {
        match ctype {
            CType::Bool => Self::Bool(false),
            CType::Float => Self::Float(0.0),
            CType::Double => Self::Double(0.0),
            CType::Int32 | CType::Enum => Self::Int32(0),
            CType::Int64 => Self::Int64(0),
            CType::UInt32 => Self::UInt32(0),
            CType::UInt64 => Self::UInt64(0),
            CType::String | CType::Bytes => Self::Str(Vec::new()),
            CType::Message => Self::Message(None),
        }
    }

    /// Encode a fixed-width value into the low bytes of a 64-bit word.
    ///
    /// Returns `None` for string values, which cannot be stored inline.
    pub fn to_word(&self) -> Option<u64> {
        Some(match self {
            Self::Bool(v) => *v as u64,
            Self::Float(v) => v.to_bits() as u64,
            Self::Double(v) => v.to_bits(),
            Self::Int32(v) => *v as u32 as u64,
            Self::Int64(v) => *v as u64,
            Self::UInt32(v) => *v as u64,
            Self::UInt64(v) => *v,
            Self::Message(m) => m.map_or(0, |m| m.0),
            Self::Str(_) => return None,
        })
    }

    /// Decode a fixed-width value of the given C type from a 64-bit word.
    ///
    /// String types decode to an empty payload; callers that box strings
    /// resolve them before reaching this point.
    pub fn from_word(ctype: CType, word: u64) -> Self {
        match ctype {
            CType::Bool => Self::Bool(word & 0xff != 0),
            CType::Float => Self::Float(f32::from_bits(word as u32)),
            CType::Double => Self::Double(f64::from_bits(word)),
            CType::Int32 | CType::Enum => Self::Int32(word as u32 as i32),
            CType::Int64 => Self::Int64(word as i64),
            CType::UInt32 => Self::UInt32(word as u32),
            CType::UInt64 => Self::UInt64(word),
            CType::Message => Self::Message((word != 0).then_some(MessageRef(word))),
            CType::String | CType::Bytes => Self::Str(Vec::new()),
        }
    }

    /// Borrow the payload of a string value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Str(b) => Some(b),
            _ => None,
        }
    }

    /// Integer payload widened to `i64`, if the value is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt32(v) => Some(*v as i64),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctype_size_table() {
        assert_eq!(ctype_size(CType::Bool), 1);
        assert_eq!(ctype_size(CType::Float), 4);
        assert_eq!(ctype_size(CType::Enum), 4);
        assert_eq!(ctype_size(CType::Message), 8);
        assert_eq!(ctype_size(CType::UInt64), 8);
        assert_eq!(ctype_size(CType::String), MAP_TYPE_STRING);
        assert_eq!(ctype_size(CType::Bytes), MAP_TYPE_STRING);
    }

    #[test]
    fn negative_int32_survives_word() {
        let w = MessageValue::Int32(-7).to_word().unwrap();
        assert_eq!(w, 0xffff_fff9);
        assert_eq!(MessageValue::from_word(CType::Int32, w), MessageValue::Int32(-7));
    }

    #[test]
    fn strings_are_not_words() {
        assert_eq!(MessageValue::Str(b"x".to_vec()).to_word(), None);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn double_bits_preserved(v in any::<f64>()) {
                let w = MessageValue::Double(v).to_word().unwrap();
                match MessageValue::from_word(CType::Double, w) {
                    MessageValue::Double(back) => prop_assert_eq!(back.to_bits(), v.to_bits()),
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
            }
        }
    }
}
