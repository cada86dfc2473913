//! Shared fixtures for IR tests. Only compiled in test builds.

use crate::types::{
    FieldId, MethodFlags, MethodId, MethodSignature, PointerKind, TypeDeclId, TypeDeclKind, TypeId,
    TypeSystem,
};
use crate::{FlowGraph, Prototype, PrototypeInterner, PrototypeKind, ValueTag};

/// A small type system: `Shapes.Point { x: int32, y: int32 }` with a
/// constructor and a virtual `Length() -> float64`.
pub(crate) struct Fixture {
    pub types: TypeSystem,
    pub interner: PrototypeInterner,
    pub point: TypeDeclId,
    pub x: FieldId,
    pub y: FieldId,
    pub ctor: MethodId,
    pub length: MethodId,
    /// `box* Shapes.Point`
    pub point_ptr: TypeId,
}

impl Fixture {
    pub(crate) fn proto(&self, kind: PrototypeKind) -> Prototype {
        self.interner.intern(kind, &self.types)
    }

    pub(crate) fn load_x(&self) -> Prototype {
        self.proto(PrototypeKind::LoadField { field: self.x })
    }

    pub(crate) fn store_x(&self) -> Prototype {
        self.proto(PrototypeKind::StoreField { field: self.x })
    }

    pub(crate) fn int32(&self, value: i32) -> Prototype {
        self.proto(PrototypeKind::Constant {
            value: crate::Constant::int32(value),
            result_type: TypeId::INT32,
        })
    }

    /// A graph whose entry block takes one `box* Shapes.Point` parameter.
    pub(crate) fn point_graph(&self) -> (FlowGraph, ValueTag) {
        let mut graph = FlowGraph::new();
        let entry = graph.entry();
        let name = self.types.intern_name("p");
        let p = graph.add_parameter(entry, self.point_ptr, false, Some(name));
        (graph, p)
    }
}

pub(crate) fn fixture() -> Fixture {
    let mut types = TypeSystem::new();
    let point = types.declare_type("Shapes.Point", TypeDeclKind::Class);
    let x = types.declare_field(point, "x", TypeId::INT32, false);
    let y = types.declare_field(point, "y", TypeId::INT32, false);

    let ctor_name = types.intern_name(".ctor");
    let ctor = types.declare_method(
        point,
        MethodSignature::new(
            ctor_name,
            MethodFlags::CONSTRUCTOR,
            [TypeId::INT32, TypeId::INT32],
            TypeId::VOID,
        ),
    );
    let length_name = types.intern_name("Length");
    let length = types.declare_method(
        point,
        MethodSignature::new(length_name, MethodFlags::VIRTUAL, [], TypeId::FLOAT64),
    );

    let point_ptr = types.pointer_to(types.declared(point), PointerKind::Box);
    Fixture {
        types,
        interner: PrototypeInterner::new(),
        point,
        x,
        y,
        ctor,
        length,
        point_ptr,
    }
}
