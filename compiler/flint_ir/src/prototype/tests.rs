use pretty_assertions::assert_eq;

use super::*;
use crate::graph::FlowGraph;
use crate::test_helpers::fixture;
use crate::types::{PointerKind, TypeId};

#[test]
fn equal_kinds_intern_to_the_same_instance() {
    let f = fixture();
    let a = f.load_x();
    let b = f.load_x();
    assert!(Prototype::ptr_eq(&a, &b));
    assert_eq!(a, b);

    let c = f.proto(PrototypeKind::LoadField { field: f.y });
    assert!(!Prototype::ptr_eq(&a, &c));
    assert_ne!(a, c);
    assert_eq!(f.interner.len(), 2);
}

#[test]
fn prototypes_from_different_interners_differ() {
    let f = fixture();
    let other = PrototypeInterner::new();
    let a = f.load_x();
    let b = other.intern(PrototypeKind::LoadField { field: f.x }, &f.types);
    assert_eq!(a.kind(), b.kind());
    assert_ne!(a, b);
}

#[test]
fn concurrent_interning_yields_one_instance() {
    let f = fixture();
    let kinds: Vec<PrototypeKind> = (0..32)
        .map(|i| PrototypeKind::Constant {
            value: Constant::int32(i),
            result_type: TypeId::INT32,
        })
        .collect();

    let results: Vec<Vec<Prototype>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    kinds
                        .iter()
                        .map(|kind| f.interner.intern(kind.clone(), &f.types))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    for other in &results[1..] {
        for (a, b) in results[0].iter().zip(other) {
            assert!(Prototype::ptr_eq(a, b));
        }
    }
    assert_eq!(f.interner.len(), 32);
}

#[test]
fn arity_follows_the_kind() {
    let f = fixture();
    assert_eq!(f.load_x().arity(), 1);
    assert_eq!(f.store_x().arity(), 2);
    assert_eq!(f.int32(7).arity(), 0);
    // Constructor: two parameters, no receiver.
    assert_eq!(f.proto(PrototypeKind::NewObject { constructor: f.ctor }).arity(), 2);
    // Instance call: receiver only.
    let call = f.proto(PrototypeKind::Call {
        callee: f.length,
        lookup: MethodLookup::Virtual,
    });
    assert_eq!(call.arity(), 1);
    let delegate = f.proto(PrototypeKind::NewDelegate {
        result_type: TypeId::INT32,
        callee: f.length,
        has_this_argument: true,
        lookup: MethodLookup::Static,
    });
    assert_eq!(delegate.arity(), 1);
}

#[test]
fn result_types() {
    let f = fixture();
    let types = &f.types;
    assert_eq!(f.load_x().result_type(), TypeId::INT32);
    assert_eq!(
        f.proto(PrototypeKind::GetFieldPointer { field: f.x }).result_type(),
        types.pointer_to(TypeId::INT32, PointerKind::Reference)
    );
    assert_eq!(
        f.proto(PrototypeKind::NewObject { constructor: f.ctor }).result_type(),
        f.point_ptr
    );
    assert_eq!(
        f.proto(PrototypeKind::Alloca {
            element_type: TypeId::FLOAT64
        })
        .result_type(),
        types.pointer_to(TypeId::FLOAT64, PointerKind::Transient)
    );
    let call = f.proto(PrototypeKind::Call {
        callee: f.length,
        lookup: MethodLookup::Static,
    });
    assert_eq!(call.result_type(), TypeId::FLOAT64);
}

#[test]
fn fused_kinds_are_flagged() {
    let fused: Vec<PrototypeTag> = PrototypeTag::ALL
        .into_iter()
        .filter(|tag| tag.is_fused())
        .collect();
    assert_eq!(fused, vec![PrototypeTag::LoadField, PrototypeTag::StoreField]);

    let f = fixture();
    assert!(f.load_x().is_fused());
    assert!(!f.int32(1).is_fused());
}

#[test]
fn intrinsic_name_is_exposed() {
    let f = fixture();
    let name = f.types.intern_name("array.get_length");
    let proto = f.proto(PrototypeKind::intrinsic(name, TypeId::INT32, [TypeId::INT32]));
    assert_eq!(proto.intrinsic_name(), Some(name));
    assert_eq!(proto.tag(), PrototypeTag::Intrinsic);
    assert_eq!(f.load_x().intrinsic_name(), None);
}

#[test]
fn instantiate_checks_arity() {
    let f = fixture();
    let (mut graph, p) = f.point_graph();
    let instruction = f.load_x().instantiate([p]);
    assert_eq!(instruction.arguments(), &[p]);
    let tag = graph.append(graph.entry(), instruction, None);
    assert_eq!(graph.value_type(tag), Some(TypeId::INT32));
}

#[test]
#[should_panic(expected = "takes 2 argument(s), got 1")]
fn instantiate_with_wrong_arity_panics() {
    let f = fixture();
    let (_, p) = f.point_graph();
    let _ = f.store_x().instantiate([p]);
}

#[test]
fn conforming_instruction_has_no_errors() {
    let f = fixture();
    let (mut graph, p) = f.point_graph();
    let entry = graph.entry();
    let seven = graph.append(entry, f.int32(7).instantiate([]), None);
    let store = f.store_x().instantiate([p, seven]);
    assert_eq!(store.prototype().check_conformance(&store, &graph, &f.types), vec![]);
}

#[test]
fn conformance_reports_type_and_definition_errors() {
    let f = fixture();
    let (mut graph, p) = f.point_graph();
    let entry = graph.entry();
    let seven = graph.append(entry, f.int32(7).instantiate([]), None);

    // Receiver and value swapped.
    let swapped = f.store_x().instantiate([seven, p]);
    let errors = swapped
        .prototype()
        .check_conformance(&swapped, &graph, &f.types);
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        errors[0],
        ConformanceError::ArgumentType { index: 0, actual: TypeId::INT32, .. }
    ));

    // A tag from another graph, past every tag `graph` has handed out.
    let mut scratch = FlowGraph::new();
    let stray = (0..8)
        .map(|_| scratch.fresh_tag(None))
        .last()
        .unwrap();
    let dangling = f.load_x().instantiate([stray]);
    assert_eq!(
        dangling
            .prototype()
            .check_conformance(&dangling, &graph, &f.types),
        vec![ConformanceError::UndefinedArgument { index: 0, tag: stray }]
    );
}
