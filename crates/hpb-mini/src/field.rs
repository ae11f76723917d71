//! Compiled field records.

use hpb_core::{CType, FieldType, Platform};

/// Storage class of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldMode {
    /// Map field (a repeated message whose sub-table is a map entry).
    Map,
    /// Repeated field.
    Array,
    /// Singular field.
    Scalar,
}

/// In-memory representation of a field slot. Ordered by the value the
/// layout sort uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldRep {
    /// One byte (`bool`).
    OneByte = 0,
    /// Four bytes (32-bit scalars, and pointers on 32-bit targets).
    FourByte = 1,
    /// A string view: pointer plus length.
    StringView = 2,
    /// Eight bytes (64-bit scalars, and pointers on 64-bit targets).
    EightByte = 3,
}

impl FieldRep {
    /// The representation of a pointer on `platform`.
    pub fn pointer(platform: Platform) -> Self {
        if platform.pointer_size() == 4 {
            Self::FourByte
        } else {
            Self::EightByte
        }
    }

    /// Size in bytes on `platform`.
    pub fn size(self, platform: Platform) -> usize {
        match self {
            Self::OneByte => 1,
            Self::FourByte => 4,
            Self::StringView => 2 * platform.pointer_size() as usize,
            Self::EightByte => 8,
        }
    }

    /// Alignment in bytes on `platform`.
    pub fn align(self, platform: Platform) -> usize {
        match self {
            Self::OneByte => 1,
            Self::FourByte => 4,
            Self::StringView => platform.pointer_size() as usize,
            Self::EightByte => 8,
        }
    }
}

/// One field of a [`MiniTable`](crate::MiniTable) or the single field of a
/// [`MiniTableExtension`](crate::MiniTableExtension).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiniTableField {
    pub(crate) number: u32,
    pub(crate) offset: u16,
    /// `> 0`: hasbit index. `< 0`: bitwise-not of the oneof case offset.
    pub(crate) presence: i16,
    pub(crate) sub_index: Option<u16>,
    pub(crate) descriptor_type: FieldType,
    pub(crate) mode: FieldMode,
    pub(crate) rep: FieldRep,
    pub(crate) packed: bool,
    pub(crate) extension: bool,
    /// `Int32` standing in for an open enum, or `Bytes` for an unchecked
    /// string.
    pub(crate) alternate: bool,
}

impl MiniTableField {
    /// Field number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Byte offset of the field's storage in the message.
    pub fn offset(&self) -> u16 {
        self.offset
    }

    /// Raw presence word.
    pub fn presence(&self) -> i16 {
        self.presence
    }

    /// Whether the field tracks presence (hasbit or oneof case).
    pub fn has_presence(&self) -> bool {
        self.presence != 0
    }

    /// Hasbit index, for fields tracked by a hasbit.
    pub fn hasbit(&self) -> Option<u16> {
        (self.presence > 0).then_some(self.presence as u16)
    }

    /// Offset of the oneof case slot, for oneof members.
    pub fn oneof_case_offset(&self) -> Option<u16> {
        (self.presence < 0).then_some(!self.presence as u16)
    }

    /// Index into the owning table's sub list.
    pub fn sub_index(&self) -> Option<u16> {
        self.sub_index
    }

    /// The type used on the wire after open-enum and UTF-8 rewriting.
    pub fn descriptor_type(&self) -> FieldType {
        self.descriptor_type
    }

    /// The declared field type, undoing the alternate-type rewrite.
    pub fn field_type(&self) -> FieldType {
        match (self.descriptor_type, self.alternate) {
            (FieldType::Int32, true) => FieldType::Enum,
            (FieldType::Bytes, true) => FieldType::String,
            (t, _) => t,
        }
    }

    /// The C type of the declared field type.
    pub fn ctype(&self) -> CType {
        self.field_type().ctype()
    }

    /// Storage class.
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Representation of the field slot.
    pub fn rep(&self) -> FieldRep {
        self.rep
    }

    /// Whether repeated values use packed encoding.
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// Whether this is the field of an extension.
    pub fn is_extension(&self) -> bool {
        self.extension
    }

    /// Whether the field is repeated or a map.
    pub fn is_repeated_or_map(&self) -> bool {
        self.mode != FieldMode::Scalar
    }

    /// Whether the field is a map.
    pub fn is_map(&self) -> bool {
        self.mode == FieldMode::Map
    }

    /// Whether the field holds a message or group.
    pub fn is_sub_message(&self) -> bool {
        matches!(self.descriptor_type, FieldType::Message | FieldType::Group)
    }

    /// Whether the field is a closed enum (values checked against a
    /// [`MiniTableEnum`](crate::MiniTableEnum)).
    pub fn is_closed_enum(&self) -> bool {
        self.descriptor_type == FieldType::Enum
    }

    /// Whether a repeated field of this type could be packed.
    pub(crate) fn is_packable(&self) -> bool {
        self.mode == FieldMode::Array && self.descriptor_type.is_packable()
    }
}
