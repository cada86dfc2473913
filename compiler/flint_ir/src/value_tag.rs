//! Data-flow value identities.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Name;

/// Opaque identity of a value produced by exactly one instruction or
/// block parameter.
///
/// Tags are allocated by their [`FlowGraph`](crate::FlowGraph); equality and
/// hashing look only at the identity, never at the debug name.
#[derive(Clone, Copy)]
pub struct ValueTag {
    id: u32,
    name: Option<Name>,
}

impl ValueTag {
    #[inline]
    pub(crate) fn new(id: u32, name: Option<Name>) -> Self {
        Self { id, name }
    }

    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }

    /// Debug name given when the tag was allocated.
    #[inline]
    pub fn name(self) -> Option<Name> {
        self.name
    }
}

impl PartialEq for ValueTag {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueTag {}

impl Hash for ValueTag {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ValueTag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueTag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.id)
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.id)
    }
}
