//! Compiled extension layouts.

use hpb_core::Platform;

use crate::decode;
use crate::error::MiniTableError;
use crate::field::MiniTableField;
use crate::id::{MiniTableEnumId, MiniTableId};
use crate::message::{MiniTable, MiniTableSub};

/// One extension: its field, the message it extends, and its sub-table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiniTableExtension {
    pub(crate) field: MiniTableField,
    pub(crate) extendee: MiniTableId,
    pub(crate) sub: MiniTableSub,
}

impl MiniTableExtension {
    /// Compile an extension descriptor against `extendee`, which is stored
    /// under `extendee_id`.
    ///
    /// A message-set extendee only accepts singular sub-message
    /// extensions.
    pub fn build(
        data: &[u8],
        extendee_id: MiniTableId,
        extendee: &MiniTable,
        sub: MiniTableSub,
        platform: Platform,
    ) -> Result<Self, MiniTableError> {
        decode::build_extension(data, extendee_id, extendee, sub, platform)
    }

    /// The extension field. Its offset and presence are always zero.
    pub fn field(&self) -> &MiniTableField {
        &self.field
    }

    /// Field number.
    pub fn number(&self) -> u32 {
        self.field.number
    }

    /// The extended message.
    pub fn extendee(&self) -> MiniTableId {
        self.extendee
    }

    /// The sub-table slot.
    pub fn sub(&self) -> MiniTableSub {
        self.sub
    }

    /// The sub-message layout, for message-typed extensions.
    pub fn sub_message(&self) -> Option<MiniTableId> {
        match self.sub {
            MiniTableSub::Message(id) => id,
            MiniTableSub::Enum(_) => None,
        }
    }

    /// The sub-enum table, for closed-enum extensions.
    pub fn sub_enum(&self) -> Option<MiniTableEnumId> {
        match self.sub {
            MiniTableSub::Enum(id) => id,
            MiniTableSub::Message(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MtDataEncoder;
    use crate::wire::field_modifier;
    use hpb_core::FieldType;

    fn ext_data(t: FieldType, number: u32, mods: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        MtDataEncoder::new(&mut buf)
            .encode_extension(t, number, mods)
            .unwrap();
        buf
    }

    #[test]
    fn builds_single_field() {
        let data = ext_data(FieldType::Int32, 1000, 0);
        let ext = MiniTableExtension::build(
            &data,
            MiniTableId(3),
            &MiniTable::empty(),
            MiniTableSub::Message(None),
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(ext.number(), 1000);
        assert_eq!(ext.extendee(), MiniTableId(3));
        assert!(ext.field().is_extension());
        assert_eq!(ext.field().offset(), 0);
        assert!(!ext.field().has_presence());
    }

    #[test]
    fn message_set_requires_singular_message() {
        let mut set = MiniTable::empty();
        set.ext = crate::message::ExtMode::IsMessageSet;

        let bad = ext_data(FieldType::Int32, 10, 0);
        assert!(matches!(
            MiniTableExtension::build(&bad, MiniTableId(0), &set, MiniTableSub::Message(None), Platform::Bits64),
            Err(MiniTableError::InvalidMessageSetExtension { number: 10 })
        ));

        let repeated = ext_data(FieldType::Message, 11, field_modifier::IS_REPEATED);
        assert!(MiniTableExtension::build(
            &repeated,
            MiniTableId(0),
            &set,
            MiniTableSub::Message(None),
            Platform::Bits64
        )
        .is_err());

        let good = ext_data(FieldType::Message, 12, 0);
        let ext = MiniTableExtension::build(
            &good,
            MiniTableId(0),
            &set,
            MiniTableSub::Message(Some(MiniTableId(7))),
            Platform::Bits64,
        )
        .unwrap();
        assert_eq!(ext.sub_message(), Some(MiniTableId(7)));
        assert_eq!(ext.sub_enum(), None);
    }

    #[test]
    fn extensions_reject_message_constructs() {
        let empty = MiniTable::empty();
        let build = |data: &[u8]| {
            MiniTableExtension::build(data, MiniTableId(0), &empty, MiniTableSub::Message(None), Platform::Bits64)
        };
        assert!(matches!(build(b"#L"), Err(MiniTableError::ExtensionModifiers)));
        assert!(matches!(build(b"#(^"), Err(MiniTableError::ExtensionOneofs)));
        assert!(matches!(build(b"#"), Err(MiniTableError::ExtensionFieldCount { count: 0 })));
        assert!(matches!(build(b""), Err(MiniTableError::ExtensionFieldCount { count: 0 })));
        assert!(matches!(
            build(b"$("),
            Err(MiniTableError::InvalidVersion { kind: "ext", .. })
        ));
    }
}
