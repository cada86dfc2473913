//! Member and type declarations stored in the type-system arena.

use bitflags::bitflags;
use smallvec::SmallVec;

use super::{FieldId, MethodId, PropertyId, TypeDeclId, TypeId};
use crate::Name;

/// What sort of type a declaration introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeDeclKind {
    Class,
    Interface,
    Struct,
}

/// A declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    /// Fully qualified name, e.g. `System.IndexOutOfRangeException`.
    pub name: Name,
    pub kind: TypeDeclKind,
    /// Direct base types and implemented interfaces, in declaration order.
    pub bases: SmallVec<[TypeDeclId; 2]>,
    pub fields: Vec<FieldId>,
    /// Methods declared directly on this type. Property accessors live on
    /// their property instead.
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
    /// Number of generic parameters the declaration introduces.
    pub generic_arity: u32,
}

/// A field declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Name,
    pub owner: TypeDeclId,
    pub field_type: TypeId,
    pub is_static: bool,
}

bitflags! {
    /// Method modifiers relevant to the IR and its analyses.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u8 {
        /// No receiver argument.
        const STATIC = 1 << 0;
        /// Dispatched through the vtable.
        const VIRTUAL = 1 << 1;
        /// Declared without a body; implies `VIRTUAL`.
        const ABSTRACT = 1 << 2;
        /// Object constructor.
        const CONSTRUCTOR = 1 << 3;
    }
}

/// Closed set of method attributes the analyses understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    /// The method never throws.
    NoThrow,
    /// The method may throw exactly this exception type (one attribute per type).
    Throws(TypeDeclId),
    /// The method is implemented by the named intrinsic.
    Intrinsic(Name),
}

/// A method declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: Name,
    pub owner: TypeDeclId,
    pub flags: MethodFlags,
    pub parameter_types: SmallVec<[TypeId; 4]>,
    pub return_type: TypeId,
    /// Base methods this method overrides or implements.
    pub base_methods: SmallVec<[MethodId; 1]>,
    pub attributes: SmallVec<[Attribute; 1]>,
}

impl MethodDecl {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.flags
            .intersects(MethodFlags::VIRTUAL | MethodFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MethodFlags::CONSTRUCTOR)
    }

    /// Number of arguments a direct call passes, receiver included.
    pub fn call_arity(&self) -> usize {
        self.parameter_types.len() + usize::from(!self.is_static())
    }
}

/// A property declaration; its getter/setter are ordinary methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: Name,
    pub owner: TypeDeclId,
    pub property_type: TypeId,
    pub accessors: SmallVec<[MethodId; 2]>,
}
