//! Messages with special meaning to serializers.

/// A message from `google/protobuf` that JSON and text formats treat
/// specially.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    /// Any other message.
    #[default]
    Unspecified,
    /// `google.protobuf.Any`
    Any,
    /// `google.protobuf.FieldMask`
    FieldMask,
    /// `google.protobuf.Duration`
    Duration,
    /// `google.protobuf.Timestamp`
    Timestamp,
    /// `google.protobuf.DoubleValue`
    DoubleValue,
    /// `google.protobuf.FloatValue`
    FloatValue,
    /// `google.protobuf.Int64Value`
    Int64Value,
    /// `google.protobuf.UInt64Value`
    UInt64Value,
    /// `google.protobuf.Int32Value`
    Int32Value,
    /// `google.protobuf.UInt32Value`
    UInt32Value,
    /// `google.protobuf.StringValue`
    StringValue,
    /// `google.protobuf.BytesValue`
    BytesValue,
    /// `google.protobuf.BoolValue`
    BoolValue,
    /// `google.protobuf.Value`
    Value,
    /// `google.protobuf.ListValue`
    ListValue,
    /// `google.protobuf.Struct`
    Struct,
}

impl WellKnownType {
    /// Classify a message by its full name.
    pub fn from_full_name(name: &str) -> Self {
        let Some(short) = name.strip_prefix("google.protobuf.") else {
            return Self::Unspecified;
        };
        match short {
            "Any" => Self::Any,
            "FieldMask" => Self::FieldMask,
            "Duration" => Self::Duration,
            "Timestamp" => Self::Timestamp,
            "DoubleValue" => Self::DoubleValue,
            "FloatValue" => Self::FloatValue,
            "Int64Value" => Self::Int64Value,
            "UInt64Value" => Self::UInt64Value,
            "Int32Value" => Self::Int32Value,
            "UInt32Value" => Self::UInt32Value,
            "StringValue" => Self::StringValue,
            "BytesValue" => Self::BytesValue,
            "BoolValue" => Self::BoolValue,
            "Value" => Self::Value,
            "ListValue" => Self::ListValue,
            "Struct" => Self::Struct,
            _ => Self::Unspecified,
        }
    }

    /// Whether this is one of the scalar wrapper messages.
    pub fn is_wrapper(self) -> bool {
        matches!(
            self,
            Self::DoubleValue
                | Self::FloatValue
                | Self::Int64Value
                | Self::UInt64Value
                | Self::Int32Value
                | Self::UInt32Value
                | Self::StringValue
                | Self::BytesValue
                | Self::BoolValue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_full_name() {
        assert_eq!(WellKnownType::from_full_name("google.protobuf.Any"), WellKnownType::Any);
        assert_eq!(
            WellKnownType::from_full_name("google.protobuf.BoolValue"),
            WellKnownType::BoolValue
        );
        assert_eq!(WellKnownType::from_full_name("Any"), WellKnownType::Unspecified);
        assert_eq!(
            WellKnownType::from_full_name("google.protobuf.FileDescriptorProto"),
            WellKnownType::Unspecified
        );
        assert!(WellKnownType::Int32Value.is_wrapper());
        assert!(!WellKnownType::Struct.is_wrapper());
    }
}
