//! Error type for the descriptor codec.

use std::fmt;

/// Errors raised while decoding a serialized descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended inside a value.
    Truncated {
        /// What was being read.
        detail: &'static str,
    },
    /// A varint ran past ten bytes.
    VarintTooLong,
    /// A tag carried field number zero or an unknown wire type.
    InvalidTag {
        /// The raw tag value.
        tag: u64,
    },
    /// A known field arrived with the wrong wire type.
    WireTypeMismatch {
        /// Message and field name, e.g. `"FieldDescriptorProto.name"`.
        field: &'static str,
        /// The wire type found.
        found: u8,
    },
    /// A string field was not valid UTF-8.
    InvalidUtf8 {
        /// Message and field name.
        field: &'static str,
    },
    /// An end-group tag without a matching start, or the reverse.
    UnbalancedGroup {
        /// Field number of the group.
        number: u32,
    },
    /// Messages nested deeper than the recursion limit.
    RecursionLimit,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { detail } => write!(f, "truncated input reading {detail}"),
            Self::VarintTooLong => write!(f, "varint longer than ten bytes"),
            Self::InvalidTag { tag } => write!(f, "invalid tag {tag:#x}"),
            Self::WireTypeMismatch { field, found } => {
                write!(f, "unexpected wire type {found} for {field}")
            }
            Self::InvalidUtf8 { field } => write!(f, "invalid UTF-8 in {field}"),
            Self::UnbalancedGroup { number } => write!(f, "unbalanced group {number}"),
            Self::RecursionLimit => write!(f, "nesting exceeds recursion limit"),
        }
    }
}

impl std::error::Error for DecodeError {}
