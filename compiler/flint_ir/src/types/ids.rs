//! Arena index newtypes for declarations in a [`TypeSystem`](super::TypeSystem).

use std::fmt;

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an index from a raw value.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_len(len: usize) -> Self {
                match u32::try_from(len) {
                    Ok(raw) => Self(raw),
                    Err(_) => panic!(concat!(stringify!($name), " count exceeds u32::MAX")),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_index!(
    /// A type declaration (class, interface or struct).
    TypeDeclId,
    "decl#"
);
define_index!(
    /// A field declaration.
    FieldId,
    "field#"
);
define_index!(
    /// A method declaration, including property accessors and constructors.
    MethodId,
    "method#"
);
define_index!(
    /// A property declaration.
    PropertyId,
    "prop#"
);
