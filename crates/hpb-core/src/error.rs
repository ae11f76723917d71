//! Error types for descriptor constant conversion.

use std::error::Error;
use std::fmt;

/// A raw descriptor number did not name a known constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstantError {
    /// The value is not a valid `FieldDescriptorProto.Type`.
    InvalidFieldType {
        /// The raw value found in the descriptor.
        value: i32,
    },
    /// The value is not a valid `FieldDescriptorProto.Label`.
    InvalidLabel {
        /// The raw value found in the descriptor.
        value: i32,
    },
    /// The string is neither `"proto2"` nor `"proto3"`.
    InvalidSyntax {
        /// The syntax string found in the descriptor.
        value: String,
    },
}

impl fmt::Display for ConstantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFieldType { value } => write!(f, "invalid field type {value}"),
            Self::InvalidLabel { value } => write!(f, "invalid label {value}"),
            Self::InvalidSyntax { value } => write!(f, "Invalid syntax '{value}'"),
        }
    }
}

impl Error for ConstantError {}
