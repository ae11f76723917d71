//! Enum types and their values.

use hpb_descriptor::{EnumOptions, EnumValueOptions, Options};
use hpb_mini::{MiniTableEnumId, MtDataEncoder};
use hpb_table::{IntTable, StrTable};

use crate::error::DefError;
use crate::id::{EnumId, EnumValueId, FileId, MessageId};
use crate::names;
use crate::pool::DefPool;

/// A reserved range of enum numbers. Unlike message ranges, `end` is
/// inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumReservedRange {
    pub(crate) start: i32,
    pub(crate) end: i32,
}

impl EnumReservedRange {
    /// First reserved number.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last reserved number.
    pub fn end(&self) -> i32 {
        self.end
    }
}

/// An enum type.
#[derive(Debug)]
pub struct EnumDef {
    pub(crate) full_name: String,
    pub(crate) file: FileId,
    pub(crate) containing_type: Option<MessageId>,
    pub(crate) values: Vec<EnumValueId>,
    pub(crate) ntoi: StrTable,
    pub(crate) iton: IntTable,
    pub(crate) default: i32,
    pub(crate) is_closed: bool,
    pub(crate) reserved_ranges: Vec<EnumReservedRange>,
    pub(crate) reserved_names: Vec<String>,
    pub(crate) layout: Option<MiniTableEnumId>,
    pub(crate) options: Option<Options<EnumOptions>>,
}

fn number_key(number: i32) -> u64 {
    u64::from(number as u32)
}

impl EnumDef {
    /// Fully qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// The defining file.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// The enclosing message of a nested enum.
    pub fn containing_type(&self) -> Option<MessageId> {
        self.containing_type
    }

    /// Values in declaration order.
    pub fn values(&self) -> &[EnumValueId] {
        &self.values
    }

    /// Number of values, aliases included.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// The `i`th value.
    pub fn value(&self, i: usize) -> Option<EnumValueId> {
        self.values.get(i).copied()
    }

    /// Look a value up by short name.
    pub fn find_value_by_name(&self, name: &str) -> Option<EnumValueId> {
        self.ntoi.lookup(name.as_bytes()).map(|v| EnumValueId(v as u32))
    }

    /// Look a value up by number. Of several aliases, the first declared
    /// wins.
    pub fn find_value_by_number(&self, number: i32) -> Option<EnumValueId> {
        self.iton.lookup(number_key(number)).map(|v| EnumValueId(v as u32))
    }

    /// The first declared value's number.
    pub fn default_value(&self) -> i32 {
        self.default
    }

    /// Whether unknown numbers are rejected (proto2 semantics).
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Whether `number` is acceptable for a field of this enum.
    ///
    /// An open enum accepts every number. A closed enum consults its
    /// compiled table.
    pub fn check_number(&self, pool: &DefPool, number: i32) -> bool {
        if !self.is_closed {
            return true;
        }
        match self.layout.and_then(|id| pool.layouts().enum_table(id)) {
            Some(table) => table.check_value(number as u32),
            None => self.find_value_by_number(number).is_some(),
        }
    }

    /// Reserved number ranges.
    pub fn reserved_ranges(&self) -> &[EnumReservedRange] {
        &self.reserved_ranges
    }

    /// Reserved value names.
    pub fn reserved_names(&self) -> &[String] {
        &self.reserved_names
    }

    /// Id of the compiled table; closed enums only.
    pub fn layout(&self) -> Option<MiniTableEnumId> {
        self.layout
    }

    /// `EnumOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<EnumOptions>> {
        self.options.as_ref()
    }

    /// Append this enum's mini descriptor to `out`. Each distinct number
    /// is written once, in unsigned order.
    pub fn mini_descriptor_encode(&self, pool: &DefPool, out: &mut Vec<u8>) -> Result<(), DefError> {
        let mut numbers: Vec<u32> = self
            .values
            .iter()
            .map(|&v| pool.enum_value(v).number() as u32)
            .collect();
        numbers.sort_unstable();
        numbers.dedup();

        let mut e = MtDataEncoder::new(out);
        e.start_enum();
        for n in numbers {
            e.put_enum_value(n).map_err(|source| DefError::layout(&self.full_name, source))?;
        }
        e.end_enum();
        Ok(())
    }
}

/// One enum value.
#[derive(Debug)]
pub struct EnumValueDef {
    pub(crate) full_name: String,
    pub(crate) number: i32,
    pub(crate) parent: EnumId,
    pub(crate) index: u32,
    pub(crate) options: Option<Options<EnumValueOptions>>,
}

impl EnumValueDef {
    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// Fully qualified name. Values live in their enum's enclosing scope,
    /// so this is `pkg.VALUE`, not `pkg.Enum.VALUE`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Numeric value.
    pub fn number(&self) -> i32 {
        self.number
    }

    /// The owning enum.
    pub fn enum_def(&self) -> EnumId {
        self.parent
    }

    /// Position in the owning enum.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// `EnumValueOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<EnumValueOptions>> {
        self.options.as_ref()
    }
}

pub(crate) fn value_key(number: i32) -> u64 {
    number_key(number)
}
