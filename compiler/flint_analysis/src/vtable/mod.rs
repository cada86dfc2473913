//! Virtual method table resolution.
//!
//! A [`VTable`] maps each virtual or abstract method (property accessors
//! included) reachable from a type to the method that overrides it in that
//! type's view. Tables are built bottom-up: a type starts from the merged
//! tables of its bases, then records an entry `base -> method` for every
//! base method that one of its own methods overrides or implements.
//!
//! [`VTable::get_implementation`] follows entries to a fixed point, so in a
//! diamond the most-derived override wins even if a base's entry points at
//! an intermediate override.
//!
//! The base-type graph is assumed acyclic.

mod cache;

use flint_ir::types::{MethodId, TypeDeclId, TypeSystem};
use rustc_hash::FxHashMap;

pub use cache::VTableCache;

/// The override map of one declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VTable {
    decl: TypeDeclId,
    implementations: FxHashMap<MethodId, MethodId>,
}

impl VTable {
    /// Build the table for `decl` from its bases' tables, given in the
    /// order the bases are declared.
    pub(crate) fn build<'t>(
        decl: TypeDeclId,
        bases: impl IntoIterator<Item = &'t VTable>,
        types: &TypeSystem,
    ) -> Self {
        let mut implementations = FxHashMap::default();
        for base in bases {
            implementations.extend(base.overrides());
        }
        for method in types.methods_and_accessors(decl) {
            for &overridden in &types.method(method).base_methods {
                implementations.insert(overridden, method);
            }
        }
        VTable {
            decl,
            implementations,
        }
    }

    #[inline]
    pub fn decl(&self) -> TypeDeclId {
        self.decl
    }

    /// The most-derived implementation of `method` visible from this type.
    ///
    /// Returns `method` itself when nothing overrides it. Idempotent:
    /// resolving a result again returns it unchanged.
    pub fn get_implementation(&self, method: MethodId) -> MethodId {
        let mut current = method;
        while let Some(&next) = self.implementations.get(&current) {
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// The recorded `(overridden, overriding)` entries.
    pub fn overrides(&self) -> impl Iterator<Item = (MethodId, MethodId)> + '_ {
        self.implementations.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
