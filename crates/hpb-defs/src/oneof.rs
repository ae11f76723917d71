//! Oneof declarations.

use hpb_descriptor::{OneofOptions, Options};
use hpb_table::{IntTable, StrTable};

use crate::id::{FieldId, MessageId};
use crate::names;

/// A oneof. It is synthetic when it only wraps one proto3 `optional`
/// field.
#[derive(Debug)]
pub struct OneofDef {
    pub(crate) full_name: String,
    pub(crate) containing_type: MessageId,
    pub(crate) index: u32,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) synthetic: bool,
    pub(crate) itof: IntTable,
    pub(crate) ntof: StrTable,
    pub(crate) options: Option<Options<OneofOptions>>,
}

impl OneofDef {
    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// Fully qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Position among the message's oneofs.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The owning message.
    pub fn containing_type(&self) -> MessageId {
        self.containing_type
    }

    /// Number of members.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Members in declaration order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// The `i`th member.
    pub fn field(&self, i: usize) -> Option<FieldId> {
        self.fields.get(i).copied()
    }

    /// Look a member up by number.
    pub fn find_field_by_number(&self, number: u32) -> Option<FieldId> {
        self.itof.lookup(u64::from(number)).map(|v| FieldId(v as u32))
    }

    /// Look a member up by name.
    pub fn find_field_by_name(&self, name: &str) -> Option<FieldId> {
        self.ntof.lookup(name.as_bytes()).map(|v| FieldId(v as u32))
    }

    /// Whether this only wraps a proto3 `optional` field.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// `OneofOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<OneofOptions>> {
        self.options.as_ref()
    }
}
