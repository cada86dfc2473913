//! Sharded prototype interner.
//!
//! Follows the same layout as the name table: per-shard `RwLock`, a read
//! lock fast path, and a double-checked insert under the write lock. Two
//! threads racing on the same kind both end up with the single instance
//! that won the insert.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use super::{Prototype, PrototypeKind};
use crate::mapping::MemberMapping;
use crate::types::TypeSystem;

const NUM_SHARDS: usize = 16;

/// Interning table that makes structurally equal prototypes identical.
///
/// Owned by a compilation session. Prototypes from different interners
/// never compare equal.
pub struct PrototypeInterner {
    shards: [RwLock<FxHashMap<PrototypeKind, Prototype>>; NUM_SHARDS],
    count: AtomicUsize,
}

impl PrototypeInterner {
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| RwLock::new(FxHashMap::default())),
            count: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn shard_for(kind: &PrototypeKind) -> usize {
        let mut hasher = FxHasher::default();
        kind.hash(&mut hasher);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "truncation is fine for hash-based shard selection"
        )]
        let hash = hasher.finish() as usize;
        hash % NUM_SHARDS
    }

    /// Return the unique prototype for `kind`, creating it on first use.
    ///
    /// `types` must be the type system the kind's references point into;
    /// it is used to compute the prototype's arity and result type.
    pub fn intern(&self, kind: PrototypeKind, types: &TypeSystem) -> Prototype {
        let shard = &self.shards[Self::shard_for(&kind)];

        if let Some(existing) = shard.read().get(&kind) {
            return existing.clone();
        }

        let mut guard = shard.write();
        if let Some(existing) = guard.get(&kind) {
            return existing.clone();
        }
        tracing::trace!(?kind, "interning prototype");
        let proto = Prototype::new(kind.clone(), types);
        guard.insert(kind, proto.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        proto
    }

    /// Rewrite every type, field and method reference in `proto` through
    /// `mapping` and intern the result.
    ///
    /// Mapping one of this interner's prototypes through the identity
    /// returns the very same instance.
    pub fn map(
        &self,
        proto: &Prototype,
        mapping: &dyn MemberMapping,
        types: &TypeSystem,
    ) -> Prototype {
        self.intern(proto.kind().map(mapping), types)
    }

    /// Number of distinct prototypes interned so far.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PrototypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrototypeInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrototypeInterner")
            .field("len", &self.len())
            .finish()
    }
}
