//! Identifiers for tables held by a [`LayoutStore`](crate::LayoutStore).

use std::fmt;

/// Identifies a compiled message layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiniTableId(pub u32);

impl fmt::Display for MiniTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MiniTableId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a compiled enum table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiniTableEnumId(pub u32);

impl fmt::Display for MiniTableEnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MiniTableEnumId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a compiled extension layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiniTableExtensionId(pub u32);

impl fmt::Display for MiniTableExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MiniTableExtensionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
