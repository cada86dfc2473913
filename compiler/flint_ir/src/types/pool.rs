//! Interned type references.
//!
//! Declarations live in the [`TypeSystem`](super::TypeSystem) arena; every
//! *use* of a type (a field's type, a pointer to it, an array of it, a
//! generic parameter) is a [`TypeId`] interned here. Interning goes through
//! `&self` so constructed types can be created while the type system is
//! shared, e.g. while computing a prototype's result type.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{MethodId, TypeDeclId};

/// Interned type reference.
///
/// Primitives are pre-interned at fixed indices, exposed as constants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const INT8: TypeId = TypeId(3);
    pub const INT16: TypeId = TypeId(4);
    pub const INT32: TypeId = TypeId(5);
    pub const INT64: TypeId = TypeId(6);
    pub const UINT8: TypeId = TypeId(7);
    pub const UINT16: TypeId = TypeId(8);
    pub const UINT32: TypeId = TypeId(9);
    pub const UINT64: TypeId = TypeId(10);
    pub const FLOAT32: TypeId = TypeId(11);
    pub const FLOAT64: TypeId = TypeId(12);

    /// First index handed out for non-primitive types.
    pub const FIRST_CONSTRUCTED: u32 = 13;

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::FIRST_CONSTRUCTED
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match PrimitiveType::ALL.get(self.0 as usize) {
            Some(prim) => write!(f, "{}", prim.as_str()),
            None => write!(f, "type#{}", self.0),
        }
    }
}

/// Built-in value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveType {
    Void,
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl PrimitiveType {
    /// All primitives, in `TypeId` order.
    pub const ALL: [PrimitiveType; 13] = [
        PrimitiveType::Void,
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::UInt8,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
        }
    }

    #[inline]
    fn type_id(self) -> TypeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "PrimitiveType has 13 variants"
        )]
        let raw = self as u32;
        TypeId(raw)
    }
}

/// How a pointer refers to its pointee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerKind {
    /// Unmanaged pointer, only valid for the current frame.
    Transient,
    /// Managed interior reference (e.g. the address of a field).
    Reference,
    /// Reference to a heap-allocated object or boxed value.
    Box,
}

/// The declaration that introduces a generic parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenericOwner {
    Type(TypeDeclId),
    Method(MethodId),
}

/// Structure of an interned type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeData {
    Primitive(PrimitiveType),
    Declared(TypeDeclId),
    Pointer { pointee: TypeId, kind: PointerKind },
    Array { element: TypeId, rank: u32 },
    GenericParameter { owner: GenericOwner, index: u32 },
}

struct PoolTable {
    map: FxHashMap<TypeData, TypeId>,
    types: Vec<TypeData>,
}

/// Thread-safe interner for [`TypeData`].
pub struct TypePool {
    table: RwLock<PoolTable>,
}

impl TypePool {
    /// Create a pool with the primitives pre-interned.
    pub fn new() -> Self {
        let mut table = PoolTable {
            map: FxHashMap::default(),
            types: Vec::with_capacity(64),
        };
        for prim in PrimitiveType::ALL {
            let data = TypeData::Primitive(prim);
            table.map.insert(data, prim.type_id());
            table.types.push(data);
        }
        Self {
            table: RwLock::new(table),
        }
    }

    /// Intern a type, returning the existing id if it was interned before.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let TypeData::Primitive(prim) = data {
            return prim.type_id();
        }
        if let Some(&id) = self.table.read().map.get(&data) {
            return id;
        }

        let mut guard = self.table.write();
        if let Some(&id) = guard.map.get(&data) {
            return id;
        }
        let id = match u32::try_from(guard.types.len()) {
            Ok(raw) => TypeId(raw),
            Err(_) => panic!("type pool exceeds u32::MAX types"),
        };
        guard.types.push(data);
        guard.map.insert(data, id);
        id
    }

    /// Look up the structure of an interned type.
    ///
    /// # Panics
    /// Panics if `id` was not interned by this pool.
    pub fn get(&self, id: TypeId) -> TypeData {
        match self.table.read().types.get(id.0 as usize) {
            Some(&data) => data,
            None => panic!("{id:?} was not interned by this type pool"),
        }
    }

    /// Number of interned types, primitives included.
    pub fn len(&self) -> usize {
        self.table.read().types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
