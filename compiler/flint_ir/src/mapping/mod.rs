//! Member mapping: rewriting the type, field and method references embedded
//! in IR through a substitution, e.g. to instantiate a generic body.
//!
//! Every `map` here is total: each embedded reference goes through the
//! mapping, so no stale generic parameter survives an instantiation. The
//! matches are written without `..` so adding a field to a prototype kind
//! forces this module to handle it.

use rustc_hash::FxHashMap;

use crate::graph::{BlockFlow, BlockParameter, FlowGraph};
use crate::types::{FieldId, MethodId, TypeData, TypeId, TypeSystem};
use crate::{Constant, Instruction, PrototypeInterner, PrototypeKind};

/// A substitution over type, field and method references.
pub trait MemberMapping {
    fn map_type(&self, ty: TypeId) -> TypeId;
    fn map_field(&self, field: FieldId) -> FieldId;
    fn map_method(&self, method: MethodId) -> MethodId;
}

/// Maps every reference to itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityMapping;

impl MemberMapping for IdentityMapping {
    #[inline]
    fn map_type(&self, ty: TypeId) -> TypeId {
        ty
    }

    #[inline]
    fn map_field(&self, field: FieldId) -> FieldId {
        field
    }

    #[inline]
    fn map_method(&self, method: MethodId) -> MethodId {
        method
    }
}

/// Explicit substitution tables.
///
/// Types are substituted structurally: a pointer to (or array of) a
/// substituted type becomes a pointer to (or array of) its replacement.
/// References without an entry map to themselves.
pub struct SubstitutionMapping<'a> {
    types: &'a TypeSystem,
    type_map: FxHashMap<TypeId, TypeId>,
    field_map: FxHashMap<FieldId, FieldId>,
    method_map: FxHashMap<MethodId, MethodId>,
}

impl<'a> SubstitutionMapping<'a> {
    pub fn new(types: &'a TypeSystem) -> Self {
        Self {
            types,
            type_map: FxHashMap::default(),
            field_map: FxHashMap::default(),
            method_map: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, from: TypeId, to: TypeId) -> Self {
        self.type_map.insert(from, to);
        self
    }

    #[must_use]
    pub fn with_field(mut self, from: FieldId, to: FieldId) -> Self {
        self.field_map.insert(from, to);
        self
    }

    #[must_use]
    pub fn with_method(mut self, from: MethodId, to: MethodId) -> Self {
        self.method_map.insert(from, to);
        self
    }
}

impl MemberMapping for SubstitutionMapping<'_> {
    fn map_type(&self, ty: TypeId) -> TypeId {
        if let Some(&mapped) = self.type_map.get(&ty) {
            return mapped;
        }
        match self.types.type_data(ty) {
            TypeData::Pointer { pointee, kind } => {
                let mapped = self.map_type(pointee);
                if mapped == pointee {
                    ty
                } else {
                    self.types.pointer_to(mapped, kind)
                }
            }
            TypeData::Array { element, rank } => {
                let mapped = self.map_type(element);
                if mapped == element {
                    ty
                } else {
                    self.types.array_of(mapped, rank)
                }
            }
            TypeData::Primitive(_) | TypeData::Declared(_) | TypeData::GenericParameter { .. } => ty,
        }
    }

    fn map_field(&self, field: FieldId) -> FieldId {
        self.field_map.get(&field).copied().unwrap_or(field)
    }

    fn map_method(&self, method: MethodId) -> MethodId {
        self.method_map.get(&method).copied().unwrap_or(method)
    }
}

impl Constant {
    /// Map the type/field/method token a constant carries, if any.
    pub fn map(self, mapping: &dyn MemberMapping) -> Constant {
        match self {
            Constant::Default(ty) => Constant::Default(mapping.map_type(ty)),
            Constant::TypeToken(ty) => Constant::TypeToken(mapping.map_type(ty)),
            Constant::FieldToken(field) => Constant::FieldToken(mapping.map_field(field)),
            Constant::MethodToken(method) => Constant::MethodToken(mapping.map_method(method)),
            Constant::Null
            | Constant::Bool(_)
            | Constant::Int { .. }
            | Constant::Float32(_)
            | Constant::Float64(_)
            | Constant::Char(_)
            | Constant::String(_) => self,
        }
    }
}

fn map_types(list: &[TypeId], mapping: &dyn MemberMapping) -> Box<[TypeId]> {
    list.iter().map(|&ty| mapping.map_type(ty)).collect()
}

impl PrototypeKind {
    /// Rewrite every embedded reference through `mapping`.
    pub fn map(&self, mapping: &dyn MemberMapping) -> PrototypeKind {
        match self {
            PrototypeKind::Alloca { element_type } => PrototypeKind::Alloca {
                element_type: mapping.map_type(*element_type),
            },
            PrototypeKind::AllocaArray { element_type } => PrototypeKind::AllocaArray {
                element_type: mapping.map_type(*element_type),
            },
            PrototypeKind::Box { element_type } => PrototypeKind::Box {
                element_type: mapping.map_type(*element_type),
            },
            PrototypeKind::Call { callee, lookup } => PrototypeKind::Call {
                callee: mapping.map_method(*callee),
                lookup: *lookup,
            },
            PrototypeKind::Constant { value, result_type } => PrototypeKind::Constant {
                value: value.map(mapping),
                result_type: mapping.map_type(*result_type),
            },
            PrototypeKind::Copy { result_type } => PrototypeKind::Copy {
                result_type: mapping.map_type(*result_type),
            },
            PrototypeKind::DynamicCast { target_type } => PrototypeKind::DynamicCast {
                target_type: mapping.map_type(*target_type),
            },
            PrototypeKind::GetFieldPointer { field } => PrototypeKind::GetFieldPointer {
                field: mapping.map_field(*field),
            },
            PrototypeKind::GetStaticFieldPointer { field } => PrototypeKind::GetStaticFieldPointer {
                field: mapping.map_field(*field),
            },
            PrototypeKind::IndirectCall {
                result_type,
                parameter_types,
            } => PrototypeKind::IndirectCall {
                result_type: mapping.map_type(*result_type),
                parameter_types: map_types(parameter_types, mapping),
            },
            PrototypeKind::Intrinsic {
                name,
                result_type,
                parameter_types,
            } => PrototypeKind::Intrinsic {
                name: *name,
                result_type: mapping.map_type(*result_type),
                parameter_types: map_types(parameter_types, mapping),
            },
            PrototypeKind::Load { result_type } => PrototypeKind::Load {
                result_type: mapping.map_type(*result_type),
            },
            PrototypeKind::NewDelegate {
                result_type,
                callee,
                has_this_argument,
                lookup,
            } => PrototypeKind::NewDelegate {
                result_type: mapping.map_type(*result_type),
                callee: mapping.map_method(*callee),
                has_this_argument: *has_this_argument,
                lookup: *lookup,
            },
            PrototypeKind::NewObject { constructor } => PrototypeKind::NewObject {
                constructor: mapping.map_method(*constructor),
            },
            PrototypeKind::ReinterpretCast { target_type } => PrototypeKind::ReinterpretCast {
                target_type: mapping.map_type(*target_type),
            },
            PrototypeKind::Store { result_type } => PrototypeKind::Store {
                result_type: mapping.map_type(*result_type),
            },
            PrototypeKind::Unbox { element_type } => PrototypeKind::Unbox {
                element_type: mapping.map_type(*element_type),
            },
            PrototypeKind::LoadField { field } => PrototypeKind::LoadField {
                field: mapping.map_field(*field),
            },
            PrototypeKind::StoreField { field } => PrototypeKind::StoreField {
                field: mapping.map_field(*field),
            },
        }
    }
}

impl BlockParameter {
    pub fn map(&self, mapping: &dyn MemberMapping) -> BlockParameter {
        BlockParameter {
            tag: self.tag,
            ty: mapping.map_type(self.ty),
            is_const: self.is_const,
        }
    }
}

impl Instruction {
    /// The same instruction with its prototype mapped and re-interned.
    pub fn map(
        &self,
        mapping: &dyn MemberMapping,
        interner: &PrototypeInterner,
        types: &TypeSystem,
    ) -> Instruction {
        let prototype = interner.map(self.prototype(), mapping, types);
        Instruction::new(prototype, self.arguments().iter().copied())
    }
}

impl FlowGraph {
    /// Map every instruction, block parameter, switch constant and try-flow
    /// instruction of the body through `mapping`. Tags are preserved.
    pub fn map_members(
        &mut self,
        mapping: &dyn MemberMapping,
        interner: &PrototypeInterner,
        types: &TypeSystem,
    ) {
        for block in self.blocks_mut() {
            for param in &mut block.parameters {
                *param = param.map(mapping);
            }
            for ti in &mut block.instructions {
                ti.instruction = ti.instruction.map(mapping, interner, types);
            }
            match &mut block.flow {
                BlockFlow::Switch { cases, .. } => {
                    for (constant, _) in cases {
                        *constant = constant.map(mapping);
                    }
                }
                BlockFlow::Try { instruction, .. } => {
                    *instruction = instruction.map(mapping, interner, types);
                }
                BlockFlow::Unreachable | BlockFlow::Jump(_) | BlockFlow::Return(_) => {}
            }
        }
    }
}
