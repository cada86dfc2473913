//! Concurrent memoization of vtables.

use std::sync::Arc;

use dashmap::DashMap;
use flint_ir::types::{MethodId, TypeDeclId, TypeSystem};
use flint_ir::{MethodLookup, Prototype, PrototypeKind};
use rustc_hash::FxBuildHasher;

use super::VTable;

/// Per-type vtable cache, keyed by declaration index.
///
/// Keys are arena indices rather than references, so the cache never keeps
/// a declaration alive; [`clear`](Self::clear) drops every table when the
/// type system is torn down. Population is last-writer-wins: two threads
/// racing on the same type both compute it, and either result may stay.
/// Both are equal, since a table is a pure function of the type system.
pub struct VTableCache {
    tables: DashMap<TypeDeclId, Arc<VTable>, FxBuildHasher>,
}

impl VTableCache {
    pub fn new() -> Self {
        Self {
            tables: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// The vtable of `decl`, computing it (and its bases') on first use.
    pub fn get(&self, decl: TypeDeclId, types: &TypeSystem) -> Arc<VTable> {
        if let Some(table) = self.tables.get(&decl) {
            return Arc::clone(&table);
        }

        // No map guard may be held here: computing the bases re-enters.
        let bases: Vec<Arc<VTable>> = types
            .decl(decl)
            .bases
            .iter()
            .map(|&base| self.get(base, types))
            .collect();
        let table = Arc::new(VTable::build(decl, bases.iter().map(|base| &**base), types));
        tracing::trace!(
            decl = decl.raw(),
            name = types.decl_name(decl),
            entries = table.len(),
            "computed vtable"
        );
        self.tables.insert(decl, Arc::clone(&table));
        table
    }

    /// The method a call prototype reaches when its receiver's runtime type
    /// is `receiver`. `None` for prototypes that are not calls.
    pub fn resolve_call(
        &self,
        call: &Prototype,
        receiver: TypeDeclId,
        types: &TypeSystem,
    ) -> Option<MethodId> {
        match call.kind() {
            PrototypeKind::Call {
                callee,
                lookup: MethodLookup::Virtual,
            }
            | PrototypeKind::NewDelegate {
                callee,
                lookup: MethodLookup::Virtual,
                ..
            } => Some(self.get(receiver, types).get_implementation(*callee)),
            PrototypeKind::Call {
                callee,
                lookup: MethodLookup::Static,
            }
            | PrototypeKind::NewDelegate {
                callee,
                lookup: MethodLookup::Static,
                ..
            } => Some(*callee),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, decl: TypeDeclId) -> bool {
        self.tables.contains_key(&decl)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&self) {
        self.tables.clear();
    }
}

impl Default for VTableCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VTableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VTableCache")
            .field("len", &self.len())
            .finish()
    }
}
