//! Typed indices into the per-kind arrays of a [`DefPool`](crate::DefPool).
//!
//! An id is only meaningful for the pool that issued it. Ids of a file whose
//! load failed are never handed out.

use std::fmt;

macro_rules! def_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

def_id!(
    /// Identifies a loaded file.
    FileId
);
def_id!(
    /// Identifies a message type.
    MessageId
);
def_id!(
    /// Identifies a field or an extension.
    FieldId
);
def_id!(
    /// Identifies a oneof.
    OneofId
);
def_id!(
    /// Identifies an enum type.
    EnumId
);
def_id!(
    /// Identifies one enum value.
    EnumValueId
);
def_id!(
    /// Identifies a service.
    ServiceId
);
def_id!(
    /// Identifies a service method.
    MethodId
);

/// Placeholder index for references filled in by a later build phase.
pub(crate) const PENDING: u32 = u32::MAX;
