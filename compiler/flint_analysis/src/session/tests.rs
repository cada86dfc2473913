use flint_ir::types::{FieldId, GenericOwner, PointerKind, TypeDeclKind, TypeId, TypeSystem};
use flint_ir::{
    BlockFlow, FlowGraph, MethodLookup, PrototypeKind, PrototypeTag, SubstitutionMapping, ValueTag,
};
use pretty_assertions::assert_eq;

use super::*;
use crate::exceptions::{ExceptionRule, ExceptionRulesConfig};
use crate::test_helpers::{declare_diamond, declare_runtime};

fn session() -> (CompilationSession, FieldId, TypeId) {
    let mut types = TypeSystem::new();
    let _ = declare_runtime(&mut types);
    let point = types.declare_type("Shapes.Point", TypeDeclKind::Class);
    let x = types.declare_field(point, "x", TypeId::INT32, false);
    let point_ptr = types.pointer_to(types.declared(point), PointerKind::Box);
    let session = CompilationSession::new(types, &ExceptionRulesConfig::default())
        .unwrap_or_else(|e| panic!("session: {e}"));
    (session, x, point_ptr)
}

/// `return p.x` with `p` an entry parameter.
fn load_body(
    session: &CompilationSession,
    x: FieldId,
    point_ptr: TypeId,
) -> (FlowGraph, ValueTag) {
    let mut graph = FlowGraph::new();
    let entry = graph.entry();
    let p = graph.add_parameter(entry, point_ptr, false, None);
    let value = graph.append(
        entry,
        session
            .prototype(PrototypeKind::LoadField { field: x })
            .instantiate([p]),
        None,
    );
    graph.set_flow(entry, BlockFlow::Return(value));
    (graph, value)
}

#[test]
fn new_fails_without_runtime_types() {
    let err = CompilationSession::new(TypeSystem::new(), &ExceptionRulesConfig::default())
        .unwrap_err();
    assert!(matches!(err, RuleConfigError::Missing { .. }));
}

#[test]
fn lower_expands_and_keeps_tags() {
    let (session, x, point_ptr) = session();
    let (mut graph, value) = load_body(&session, x, point_ptr);

    assert_eq!(session.lower(&mut graph), 1);
    assert!(graph.is_primitive_only());
    assert_eq!(graph.value_type(value), Some(TypeId::INT32));
    assert_eq!(graph.validate(), vec![]);
}

#[test]
fn lower_all_processes_every_body() {
    let (session, x, point_ptr) = session();
    let mut bodies: Vec<FlowGraph> = (0..16)
        .map(|_| load_body(&session, x, point_ptr).0)
        .collect();

    assert_eq!(session.lower_all(&mut bodies), 16);
    assert!(bodies.iter().all(FlowGraph::is_primitive_only));
    // All bodies share the session's interned prototypes.
    let first = bodies[0].blocks()[0].instructions[0].instruction.prototype().clone();
    for body in &bodies[1..] {
        assert_eq!(body.blocks()[0].instructions[0].instruction.prototype(), &first);
    }
}

#[test]
fn exception_spec_uses_session_rules() {
    let (session, x, point_ptr) = session();
    let (graph, value) = load_body(&session, x, point_ptr);
    let null_reference = session.types().resolve_by_name("System.NullReferenceException")[0];

    let instruction = graph.instruction(value).cloned();
    assert_eq!(
        instruction.map(|i| session.exception_spec(&i)),
        Some(ExceptionSpecification::NullCheck {
            argument: 0,
            exception: null_reference,
        })
    );
    let report = session.analyze_exceptions(&graph);
    assert_eq!(report.instructions.len(), 1);
}

#[test]
fn with_rules_accepts_override_layers() {
    let mut types = TypeSystem::new();
    let _ = declare_runtime(&mut types);
    let base = Arc::new(
        ExceptionRules::defaults(&types, &ExceptionRulesConfig::default())
            .unwrap_or_else(|e| panic!("{e}")),
    );
    let mut layer = ExceptionRules::with_base(base);
    layer.register_kind(
        PrototypeTag::Copy,
        ExceptionRule::Constant(ExceptionSpecification::ThrowAny),
    );
    let session = CompilationSession::with_rules(types, Arc::new(layer));

    let copy = session.prototype(PrototypeKind::Copy {
        result_type: TypeId::INT32,
    });
    let mut graph = FlowGraph::new();
    let entry = graph.entry();
    let v = graph.add_parameter(entry, TypeId::INT32, false, None);
    let instruction = copy.instantiate([v]);
    assert_eq!(session.exception_spec(&instruction), ExceptionSpecification::ThrowAny);
}

#[test]
fn vtables_and_call_resolution() {
    let mut types = TypeSystem::new();
    let _ = declare_runtime(&mut types);
    let d = declare_diamond(&mut types);
    let session = CompilationSession::new(types, &ExceptionRulesConfig::default())
        .unwrap_or_else(|e| panic!("{e}"));

    let table = session.vtable(d.derived);
    assert_eq!(table.decl(), d.derived);
    assert!(Arc::ptr_eq(&table, &session.vtable(d.derived)));

    let call = session.prototype(PrototypeKind::Call {
        callee: d.base_m,
        lookup: MethodLookup::Virtual,
    });
    assert_eq!(session.resolve_call(&call, d.mid1), Some(d.mid1_m));
    assert_eq!(session.resolve_call(&call, d.derived), Some(d.derived_m));
    assert_eq!(session.vtables().len(), 4);
}

#[test]
fn map_body_instantiates_generic_code() {
    let mut types = TypeSystem::new();
    let _ = declare_runtime(&mut types);
    let boxed = types.declare_generic_type("Collections.Boxed`1", TypeDeclKind::Class, 1);
    let t = types.generic_parameter(GenericOwner::Type(boxed), 0);
    let session = CompilationSession::new(types, &ExceptionRulesConfig::default())
        .unwrap_or_else(|e| panic!("{e}"));

    let mut graph = FlowGraph::new();
    let entry = graph.entry();
    let v = graph.add_parameter(entry, t, false, None);
    let boxed_value = graph.append(
        entry,
        session
            .prototype(PrototypeKind::Box { element_type: t })
            .instantiate([v]),
        None,
    );

    let mapping = SubstitutionMapping::new(session.types()).with_type(t, TypeId::CHAR);
    session.map_body(&mut graph, &mapping);

    assert_eq!(
        graph.value_type(boxed_value),
        Some(session.types().pointer_to(TypeId::CHAR, PointerKind::Box))
    );
}
