//! Instruction prototypes.
//!
//! A prototype describes an operation independently of its operands: its
//! kind and static parameters (the field it touches, the method it calls,
//! the type it allocates), its arity, and its result type. Prototypes are
//! interned by a [`PrototypeInterner`]: structurally equal kinds produce the
//! *same* [`Prototype`] object, so equality and hashing are by identity.
//!
//! # Fused prototypes
//!
//! [`LoadField`](PrototypeKind::LoadField) and
//! [`StoreField`](PrototypeKind::StoreField) stand for short sequences of
//! primitive instructions. They keep the IR readable for optimizations and
//! are lowered by [`expand_fused`](crate::expand_fused) before emission.

mod conformance;
mod interner;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use conformance::{ConformanceError, ExpectedArgument};
pub use interner::PrototypeInterner;

use crate::types::{FieldId, MethodId, PointerKind, TypeId, TypeSystem};
use crate::{Constant, Instruction, Name, ValueTag};

/// How a call or delegate resolves its callee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodLookup {
    /// Call exactly the named method.
    Static,
    /// Dispatch through the receiver's vtable.
    Virtual,
}

/// The operation a prototype performs, with its static parameters.
///
/// This is the interning key: two kinds that compare equal describe the same
/// operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrototypeKind {
    /// Stack-allocate one value; yields a transient pointer.
    Alloca { element_type: TypeId },
    /// Stack-allocate `count` values (argument 0).
    AllocaArray { element_type: TypeId },
    /// Copy a value (argument 0) to the heap; yields a box pointer.
    Box { element_type: TypeId },
    /// Call a method. Instance methods take the receiver as argument 0.
    Call { callee: MethodId, lookup: MethodLookup },
    Constant { value: Constant, result_type: TypeId },
    Copy { result_type: TypeId },
    /// Checked pointer cast; yields null when the cast fails.
    DynamicCast { target_type: TypeId },
    /// Address of an instance field of the object at argument 0.
    GetFieldPointer { field: FieldId },
    GetStaticFieldPointer { field: FieldId },
    /// Call through a delegate (argument 0).
    IndirectCall {
        result_type: TypeId,
        parameter_types: Box<[TypeId]>,
    },
    /// A named built-in operation such as `array.store_element`.
    Intrinsic {
        name: Name,
        result_type: TypeId,
        parameter_types: Box<[TypeId]>,
    },
    /// Read through the pointer at argument 0.
    Load { result_type: TypeId },
    NewDelegate {
        result_type: TypeId,
        callee: MethodId,
        has_this_argument: bool,
        lookup: MethodLookup,
    },
    /// Allocate an object and run its constructor on the arguments.
    NewObject { constructor: MethodId },
    /// Unchecked pointer cast.
    ReinterpretCast { target_type: TypeId },
    /// Write argument 1 through the pointer at argument 0; yields argument 1.
    Store { result_type: TypeId },
    /// Address of the value inside the box at argument 0.
    Unbox { element_type: TypeId },
    /// Fused `GetFieldPointer` + `Load`.
    LoadField { field: FieldId },
    /// Fused `GetFieldPointer` + `Store`.
    StoreField { field: FieldId },
}

/// Fieldless discriminator for [`PrototypeKind`], used as a rule key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrototypeTag {
    Alloca,
    AllocaArray,
    Box,
    Call,
    Constant,
    Copy,
    DynamicCast,
    GetFieldPointer,
    GetStaticFieldPointer,
    IndirectCall,
    Intrinsic,
    Load,
    NewDelegate,
    NewObject,
    ReinterpretCast,
    Store,
    Unbox,
    LoadField,
    StoreField,
}

impl PrototypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [PrototypeTag; 19] = [
        PrototypeTag::Alloca,
        PrototypeTag::AllocaArray,
        PrototypeTag::Box,
        PrototypeTag::Call,
        PrototypeTag::Constant,
        PrototypeTag::Copy,
        PrototypeTag::DynamicCast,
        PrototypeTag::GetFieldPointer,
        PrototypeTag::GetStaticFieldPointer,
        PrototypeTag::IndirectCall,
        PrototypeTag::Intrinsic,
        PrototypeTag::Load,
        PrototypeTag::NewDelegate,
        PrototypeTag::NewObject,
        PrototypeTag::ReinterpretCast,
        PrototypeTag::Store,
        PrototypeTag::Unbox,
        PrototypeTag::LoadField,
        PrototypeTag::StoreField,
    ];

    /// `true` for composite kinds that must be expanded before emission.
    #[inline]
    pub fn is_fused(self) -> bool {
        matches!(self, PrototypeTag::LoadField | PrototypeTag::StoreField)
    }
}

impl PrototypeKind {
    pub fn tag(&self) -> PrototypeTag {
        match self {
            PrototypeKind::Alloca { .. } => PrototypeTag::Alloca,
            PrototypeKind::AllocaArray { .. } => PrototypeTag::AllocaArray,
            PrototypeKind::Box { .. } => PrototypeTag::Box,
            PrototypeKind::Call { .. } => PrototypeTag::Call,
            PrototypeKind::Constant { .. } => PrototypeTag::Constant,
            PrototypeKind::Copy { .. } => PrototypeTag::Copy,
            PrototypeKind::DynamicCast { .. } => PrototypeTag::DynamicCast,
            PrototypeKind::GetFieldPointer { .. } => PrototypeTag::GetFieldPointer,
            PrototypeKind::GetStaticFieldPointer { .. } => PrototypeTag::GetStaticFieldPointer,
            PrototypeKind::IndirectCall { .. } => PrototypeTag::IndirectCall,
            PrototypeKind::Intrinsic { .. } => PrototypeTag::Intrinsic,
            PrototypeKind::Load { .. } => PrototypeTag::Load,
            PrototypeKind::NewDelegate { .. } => PrototypeTag::NewDelegate,
            PrototypeKind::NewObject { .. } => PrototypeTag::NewObject,
            PrototypeKind::ReinterpretCast { .. } => PrototypeTag::ReinterpretCast,
            PrototypeKind::Store { .. } => PrototypeTag::Store,
            PrototypeKind::Unbox { .. } => PrototypeTag::Unbox,
            PrototypeKind::LoadField { .. } => PrototypeTag::LoadField,
            PrototypeKind::StoreField { .. } => PrototypeTag::StoreField,
        }
    }

    /// Build an intrinsic kind.
    pub fn intrinsic(
        name: Name,
        result_type: TypeId,
        parameter_types: impl IntoIterator<Item = TypeId>,
    ) -> Self {
        PrototypeKind::Intrinsic {
            name,
            result_type,
            parameter_types: parameter_types.into_iter().collect(),
        }
    }

    /// Number of arguments an instance of this kind takes.
    pub fn arity(&self, types: &TypeSystem) -> usize {
        match self {
            PrototypeKind::Alloca { .. }
            | PrototypeKind::Constant { .. }
            | PrototypeKind::GetStaticFieldPointer { .. } => 0,

            PrototypeKind::AllocaArray { .. }
            | PrototypeKind::Box { .. }
            | PrototypeKind::Copy { .. }
            | PrototypeKind::DynamicCast { .. }
            | PrototypeKind::GetFieldPointer { .. }
            | PrototypeKind::Load { .. }
            | PrototypeKind::ReinterpretCast { .. }
            | PrototypeKind::Unbox { .. }
            | PrototypeKind::LoadField { .. } => 1,

            PrototypeKind::Store { .. } | PrototypeKind::StoreField { .. } => 2,

            PrototypeKind::Call { callee, .. } => types.method(*callee).call_arity(),
            PrototypeKind::IndirectCall {
                parameter_types, ..
            } => 1 + parameter_types.len(),
            PrototypeKind::Intrinsic {
                parameter_types, ..
            } => parameter_types.len(),
            PrototypeKind::NewDelegate {
                has_this_argument, ..
            } => usize::from(*has_this_argument),
            PrototypeKind::NewObject { constructor } => {
                types.method(*constructor).parameter_types.len()
            }
        }
    }

    /// Type of the value an instance of this kind produces.
    pub fn result_type(&self, types: &TypeSystem) -> TypeId {
        match self {
            PrototypeKind::Alloca { element_type } | PrototypeKind::AllocaArray { element_type } => {
                types.pointer_to(*element_type, PointerKind::Transient)
            }
            PrototypeKind::Box { element_type } => {
                types.pointer_to(*element_type, PointerKind::Box)
            }
            PrototypeKind::Unbox { element_type } => {
                types.pointer_to(*element_type, PointerKind::Reference)
            }
            PrototypeKind::Call { callee, .. } => types.method(*callee).return_type,
            PrototypeKind::GetFieldPointer { field }
            | PrototypeKind::GetStaticFieldPointer { field } => {
                types.pointer_to(types.field(*field).field_type, PointerKind::Reference)
            }
            PrototypeKind::LoadField { field } | PrototypeKind::StoreField { field } => {
                types.field(*field).field_type
            }
            PrototypeKind::NewObject { constructor } => {
                let owner = types.method(*constructor).owner;
                types.pointer_to(types.declared(owner), PointerKind::Box)
            }
            PrototypeKind::Constant { result_type, .. }
            | PrototypeKind::Copy { result_type }
            | PrototypeKind::IndirectCall { result_type, .. }
            | PrototypeKind::Intrinsic { result_type, .. }
            | PrototypeKind::Load { result_type }
            | PrototypeKind::NewDelegate { result_type, .. }
            | PrototypeKind::Store { result_type } => *result_type,
            PrototypeKind::DynamicCast { target_type }
            | PrototypeKind::ReinterpretCast { target_type } => *target_type,
        }
    }
}

struct PrototypeData {
    kind: PrototypeKind,
    arity: usize,
    result_type: TypeId,
}

/// An interned prototype.
///
/// Cheap to clone. Equality and hashing are by identity, which coincides
/// with structural equality for prototypes from the same interner.
#[derive(Clone)]
pub struct Prototype(Arc<PrototypeData>);

impl Prototype {
    pub(crate) fn new(kind: PrototypeKind, types: &TypeSystem) -> Self {
        let arity = kind.arity(types);
        let result_type = kind.result_type(types);
        Prototype(Arc::new(PrototypeData {
            kind,
            arity,
            result_type,
        }))
    }

    #[inline]
    pub fn kind(&self) -> &PrototypeKind {
        &self.0.kind
    }

    #[inline]
    pub fn tag(&self) -> PrototypeTag {
        self.0.kind.tag()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.0.arity
    }

    #[inline]
    pub fn result_type(&self) -> TypeId {
        self.0.result_type
    }

    #[inline]
    pub fn is_fused(&self) -> bool {
        self.tag().is_fused()
    }

    /// The intrinsic name, for intrinsic prototypes.
    pub fn intrinsic_name(&self) -> Option<Name> {
        match self.kind() {
            PrototypeKind::Intrinsic { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Create an instruction applying this prototype to `arguments`.
    ///
    /// # Panics
    /// Panics if the argument count differs from [`arity`](Self::arity); a
    /// mismatch means a transformation built a malformed instruction.
    pub fn instantiate(&self, arguments: impl IntoIterator<Item = ValueTag>) -> Instruction {
        Instruction::new(self.clone(), arguments)
    }

    #[inline]
    pub fn ptr_eq(a: &Prototype, b: &Prototype) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Prototype {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Prototype::ptr_eq(self, other)
    }
}

impl Eq for Prototype {}

impl Hash for Prototype {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0.kind, f)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
