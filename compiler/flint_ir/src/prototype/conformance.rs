//! Argument-type conformance checks for instructions.

use smallvec::SmallVec;

use super::{Prototype, PrototypeKind};
use crate::types::{TypeData, TypeId, TypeSystem};
use crate::{FlowGraph, Instruction, ValueTag};

/// What a prototype expects at one argument position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedArgument {
    /// Exactly this type (pointers to declared types also accept pointers
    /// to subtypes).
    Exactly(TypeId),
    /// A pointer of any kind whose pointee is this type or a subtype of it.
    PointerTo(TypeId),
    /// A pointer of any kind to anything.
    AnyPointer,
    /// No constraint.
    Any,
}

/// A reason an instruction does not conform to its prototype.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConformanceError {
    #[error("expected {expected} argument(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("argument {index} ({tag}) is not defined in the graph")]
    UndefinedArgument { index: usize, tag: ValueTag },
    #[error("argument {index} has type {actual:?}, expected {expected:?}")]
    ArgumentType {
        index: usize,
        expected: ExpectedArgument,
        actual: TypeId,
    },
}

impl Prototype {
    /// Expected type of each argument, in order.
    pub fn parameter_types(&self, types: &TypeSystem) -> SmallVec<[ExpectedArgument; 4]> {
        use ExpectedArgument::{Any, AnyPointer, Exactly, PointerTo};

        let receiver = |owner| PointerTo(types.declared(owner));
        match self.kind() {
            PrototypeKind::Alloca { .. }
            | PrototypeKind::Constant { .. }
            | PrototypeKind::GetStaticFieldPointer { .. } => SmallVec::new(),
            PrototypeKind::AllocaArray { .. } => smallvec::smallvec![Any],
            PrototypeKind::Box { element_type } => smallvec::smallvec![Exactly(*element_type)],
            PrototypeKind::Copy { result_type } => smallvec::smallvec![Exactly(*result_type)],
            PrototypeKind::DynamicCast { .. }
            | PrototypeKind::ReinterpretCast { .. }
            | PrototypeKind::Unbox { .. } => smallvec::smallvec![AnyPointer],
            PrototypeKind::Load { result_type } => smallvec::smallvec![PointerTo(*result_type)],
            PrototypeKind::Store { result_type } => {
                smallvec::smallvec![PointerTo(*result_type), Exactly(*result_type)]
            }
            PrototypeKind::GetFieldPointer { field } | PrototypeKind::LoadField { field } => {
                smallvec::smallvec![receiver(types.field(*field).owner)]
            }
            PrototypeKind::StoreField { field } => {
                let decl = types.field(*field);
                smallvec::smallvec![receiver(decl.owner), Exactly(decl.field_type)]
            }
            PrototypeKind::Call { callee, .. } => {
                let method = types.method(*callee);
                let mut expected = SmallVec::new();
                if !method.is_static() {
                    expected.push(receiver(method.owner));
                }
                expected.extend(method.parameter_types.iter().map(|&t| Exactly(t)));
                expected
            }
            PrototypeKind::NewObject { constructor } => types
                .method(*constructor)
                .parameter_types
                .iter()
                .map(|&t| Exactly(t))
                .collect(),
            PrototypeKind::NewDelegate {
                callee,
                has_this_argument,
                ..
            } => {
                if *has_this_argument {
                    smallvec::smallvec![receiver(types.method(*callee).owner)]
                } else {
                    SmallVec::new()
                }
            }
            PrototypeKind::IndirectCall {
                parameter_types, ..
            } => std::iter::once(Any)
                .chain(parameter_types.iter().map(|&t| Exactly(t)))
                .collect(),
            PrototypeKind::Intrinsic {
                parameter_types, ..
            } => parameter_types.iter().map(|&t| Exactly(t)).collect(),
        }
    }

    /// Check `instruction` (which must use this prototype) against the
    /// argument types recorded in `graph`.
    pub fn check_conformance(
        &self,
        instruction: &Instruction,
        graph: &FlowGraph,
        types: &TypeSystem,
    ) -> Vec<ConformanceError> {
        let mut errors = Vec::new();
        let args = instruction.arguments();
        if args.len() != self.arity() {
            errors.push(ConformanceError::ArityMismatch {
                expected: self.arity(),
                actual: args.len(),
            });
            return errors;
        }

        for (index, (&tag, expected)) in args
            .iter()
            .zip(self.parameter_types(types))
            .enumerate()
        {
            let Some(actual) = graph.value_type(tag) else {
                errors.push(ConformanceError::UndefinedArgument { index, tag });
                continue;
            };
            if !conforms(actual, expected, types) {
                errors.push(ConformanceError::ArgumentType {
                    index,
                    expected,
                    actual,
                });
            }
        }
        errors
    }
}

fn conforms(actual: TypeId, expected: ExpectedArgument, types: &TypeSystem) -> bool {
    match expected {
        ExpectedArgument::Any => true,
        ExpectedArgument::AnyPointer => types.pointee(actual).is_some(),
        ExpectedArgument::PointerTo(pointee) => types
            .pointee(actual)
            .is_some_and(|(actual_pointee, _)| type_conforms(actual_pointee, pointee, types)),
        ExpectedArgument::Exactly(ty) => {
            if actual == ty {
                return true;
            }
            match (types.pointee(actual), types.pointee(ty)) {
                (Some((a, a_kind)), Some((e, e_kind))) => {
                    a_kind == e_kind && type_conforms(a, e, types)
                }
                _ => false,
            }
        }
    }
}

fn type_conforms(actual: TypeId, expected: TypeId, types: &TypeSystem) -> bool {
    if actual == expected {
        return true;
    }
    match (types.type_data(actual), types.type_data(expected)) {
        (TypeData::Declared(sub), TypeData::Declared(sup)) => types.is_subtype(sub, sup),
        _ => false,
    }
}
