//! Interned names.
//!
//! Qualified type names, member names, intrinsic operation names and value
//! debug names are all stored once in a [`NameTable`] and referred to by a
//! compact [`Name`] handle.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned string handle.
///
/// Layout: shard (4 bits) + local index (28 bits), like the identifier
/// handles of the front end. Two names from the same [`NameTable`] are equal
/// iff their strings are equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Maximum local index per shard.
    pub const MAX_LOCAL: u32 = 0x0FFF_FFFF;

    /// Number of shards.
    pub const NUM_SHARDS: usize = 16;

    #[inline]
    const fn new(shard: u32, local: u32) -> Self {
        debug_assert!(shard < 16);
        debug_assert!(local <= Self::MAX_LOCAL);
        Name((shard << 28) | local)
    }

    /// Create from a raw `u32` value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    #[inline]
    const fn shard(self) -> usize {
        (self.0 >> 28) as usize
    }

    #[inline]
    const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}:{})", self.shard(), self.local())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Error when interning a name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// A shard ran out of local indices.
    #[error("name table shard {shard_idx} is full ({count} names)")]
    ShardOverflow { shard_idx: usize, count: usize },
}

struct NameShard {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl NameShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        shard.map.insert("", 0);
        shard.strings.push("");
        shard
    }
}

/// Sharded, thread-safe string interner.
///
/// Interned strings are leaked: names live as long as the process, so
/// [`lookup`](Self::lookup) can hand out `&'static str`.
pub struct NameTable {
    shards: [RwLock<NameShard>; Name::NUM_SHARDS],
    total_count: AtomicUsize,
}

impl NameTable {
    /// Create a table holding only the empty name.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(NameShard::with_empty())
            } else {
                RwLock::new(NameShard::new())
            }
        });
        Self {
            shards,
            total_count: AtomicUsize::new(1),
        }
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        if s.is_empty() {
            return 0;
        }
        let mut hash = 0u32;
        for byte in s.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::NUM_SHARDS
    }

    /// Intern a string, reporting shard overflow instead of panicking.
    pub fn try_intern(&self, s: &str) -> Result<Name, NameError> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        if let Some(&local) = shard.read().map.get(s) {
            return Ok(Name::new(shard_u32, local));
        }

        let mut guard = shard.write();
        if let Some(&local) = guard.map.get(s) {
            return Ok(Name::new(shard_u32, local));
        }

        let count = guard.strings.len();
        let local = u32::try_from(count)
            .ok()
            .filter(|&l| l <= Name::MAX_LOCAL)
            .ok_or(NameError::ShardOverflow { shard_idx, count })?;
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);
        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_u32, local))
    }

    /// Intern a string.
    ///
    /// # Panics
    /// Panics if a shard overflows. Use [`try_intern`](Self::try_intern) to
    /// handle that case.
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// The name for `s` if it has already been interned.
    pub fn get(&self, s: &str) -> Option<Name> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_u32 = shard_idx as u32;
        let local = *self.shards[shard_idx].read().map.get(s)?;
        Some(Name::new(shard_u32, local))
    }

    /// Look up the string for a name.
    ///
    /// # Panics
    /// Panics if `name` did not come from this table.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.shards[name.shard()].read();
        match guard.strings.get(name.local()) {
            Some(s) => s,
            None => panic!("{name:?} was not interned by this name table"),
        }
    }

    /// Number of interned names, including the empty name.
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// `true` if only the empty name is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable").field("len", &self.len()).finish()
    }
}
