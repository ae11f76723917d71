//! Fields and extensions.

use hpb_core::{CType, FieldType, Label, MessageValue};
use hpb_descriptor::{FieldOptions, Options};
use hpb_mini::{field_modifier, MiniTableExtensionId, MiniTableField, MtDataEncoder};

use crate::error::DefError;
use crate::id::{EnumId, FileId, MessageId, OneofId};
use crate::names;
use crate::pool::DefPool;

/// What a message, group or enum field refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SubDef {
    Message(MessageId),
    Enum(EnumId),
}

/// A field of a message, or an extension.
///
/// For an extension, [`containing_type`](Self::containing_type) is the
/// extended message and [`extension_scope`](Self::extension_scope) is the
/// message it was declared in, if any.
#[derive(Debug)]
pub struct FieldDef {
    pub(crate) full_name: String,
    pub(crate) json_name: String,
    pub(crate) has_json_name: bool,
    pub(crate) number: u32,
    pub(crate) index: u32,
    pub(crate) layout_index: u32,
    pub(crate) label: Label,
    pub(crate) field_type: FieldType,
    pub(crate) file: FileId,
    pub(crate) is_extension: bool,
    pub(crate) is_packed: bool,
    pub(crate) has_presence: bool,
    pub(crate) proto3_optional: bool,
    pub(crate) containing_type: MessageId,
    pub(crate) extension_scope: Option<MessageId>,
    pub(crate) oneof: Option<OneofId>,
    pub(crate) sub: Option<SubDef>,
    pub(crate) closed_enum: bool,
    pub(crate) is_map: bool,
    pub(crate) default: MessageValue,
    pub(crate) has_default: bool,
    pub(crate) layout_ext: Option<MiniTableExtensionId>,
    pub(crate) options: Option<Options<FieldOptions>>,
}

impl FieldDef {
    /// Fully qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// JSON name, declared or derived from the name.
    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    /// Whether the descriptor declared `json_name` explicitly.
    pub fn has_json_name(&self) -> bool {
        self.has_json_name
    }

    /// Field number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Position in the declaring message's field list, or in the
    /// extension list of its scope.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Position of this field's slot in the compiled layout. For an
    /// extension, its position among the file's extensions.
    pub fn layout_index(&self) -> u32 {
        self.layout_index
    }

    /// Declared label.
    pub fn label(&self) -> Label {
        self.label
    }

    /// Declared type, with an unspecified type resolved to message or enum.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// In-memory value type.
    pub fn ctype(&self) -> CType {
        self.field_type.ctype()
    }

    /// The defining file.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Whether this is an extension.
    pub fn is_extension(&self) -> bool {
        self.is_extension
    }

    /// Whether the label is `repeated`.
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    /// Whether the label is `required`.
    pub fn is_required(&self) -> bool {
        self.label == Label::Required
    }

    /// Whether the label is `optional`.
    pub fn is_optional(&self) -> bool {
        self.label == Label::Optional
    }

    /// Whether repeated values use packed encoding.
    pub fn is_packed(&self) -> bool {
        self.is_packed
    }

    /// Whether set-ness is tracked separately from the value.
    pub fn has_presence(&self) -> bool {
        self.has_presence
    }

    /// Whether this is a repeated field of a map-entry message.
    pub fn is_map(&self) -> bool {
        self.is_map
    }

    /// Neither string-like nor a sub-message.
    pub fn is_primitive(&self) -> bool {
        !self.is_string() && !self.is_sub_message()
    }

    /// `string` or `bytes`.
    pub fn is_string(&self) -> bool {
        matches!(self.ctype(), CType::String | CType::Bytes)
    }

    /// A message or group field.
    pub fn is_sub_message(&self) -> bool {
        self.ctype() == CType::Message
    }

    /// Whether [`message_sub_def`](Self::message_sub_def) or
    /// [`enum_sub_def`](Self::enum_sub_def) is set.
    pub fn has_sub_def(&self) -> bool {
        self.sub.is_some()
    }

    /// An enum field whose enum is closed.
    pub fn is_closed_enum(&self) -> bool {
        self.closed_enum
    }

    /// Whether this was declared proto3 `optional`.
    pub fn is_proto3_optional(&self) -> bool {
        self.proto3_optional
    }

    /// The owning message, or the extended message for an extension.
    pub fn containing_type(&self) -> MessageId {
        self.containing_type
    }

    /// The message an extension was declared in.
    pub fn extension_scope(&self) -> Option<MessageId> {
        self.extension_scope
    }

    /// The oneof this field belongs to, synthetic or not.
    pub fn containing_oneof(&self) -> Option<OneofId> {
        self.oneof
    }

    /// The containing oneof, unless it only wraps a proto3 `optional`.
    pub fn real_containing_oneof(&self) -> Option<OneofId> {
        if self.proto3_optional {
            None
        } else {
            self.oneof
        }
    }

    /// The message type of a message or group field.
    pub fn message_sub_def(&self) -> Option<MessageId> {
        match self.sub {
            Some(SubDef::Message(m)) => Some(m),
            _ => None,
        }
    }

    /// The enum type of an enum field.
    pub fn enum_sub_def(&self) -> Option<EnumId> {
        match self.sub {
            Some(SubDef::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// Default value: the declared one, or zero, false, empty, or the
    /// enum's first value. Message fields report `Message(None)`.
    pub fn default(&self) -> &MessageValue {
        &self.default
    }

    /// Whether a default was declared.
    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Id of an extension's compiled layout.
    pub fn extension_layout(&self) -> Option<MiniTableExtensionId> {
        self.layout_ext
    }

    /// The compiled slot of this field.
    pub fn mini_table_field<'p>(&self, pool: &'p DefPool) -> Option<&'p MiniTableField> {
        if self.is_extension {
            return self
                .layout_ext
                .and_then(|id| pool.layouts().extension(id))
                .map(|ext| ext.field());
        }
        pool.message(self.containing_type)
            .mini_table(pool)?
            .field(self.layout_index as usize)
    }

    /// `FieldOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<FieldOptions>> {
        self.options.as_ref()
    }

    /// Modifier bits for the mini descriptor.
    pub fn modifiers(&self) -> u64 {
        let mut out = if self.is_packed {
            field_modifier::IS_PACKED
        } else {
            0
        };
        match self.label {
            Label::Optional if !self.has_presence => out |= field_modifier::IS_PROTO3_SINGULAR,
            Label::Optional => {}
            Label::Repeated => out |= field_modifier::IS_REPEATED,
            Label::Required => out |= field_modifier::IS_REQUIRED,
        }
        if self.closed_enum {
            out |= field_modifier::IS_CLOSED_ENUM;
        }
        out
    }

    /// Append an extension's mini descriptor to `out`.
    pub fn mini_descriptor_encode(&self, out: &mut Vec<u8>) -> Result<(), DefError> {
        debug_assert!(self.is_extension);
        MtDataEncoder::new(out)
            .encode_extension(self.field_type, self.number, self.modifiers())
            .map_err(|source| DefError::layout(&self.full_name, source))
    }
}
