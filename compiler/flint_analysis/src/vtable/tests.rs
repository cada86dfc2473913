use std::sync::Arc;

use flint_ir::types::{MethodFlags, MethodSignature, TypeDeclKind, TypeId, TypeSystem};
use flint_ir::{MethodLookup, PrototypeInterner, PrototypeKind};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{declare_diamond, method};

#[test]
fn diamond_resolves_to_most_derived_override() {
    let mut types = TypeSystem::new();
    let d = declare_diamond(&mut types);
    let cache = VTableCache::new();

    let derived = cache.get(d.derived, &types);
    assert_eq!(derived.get_implementation(d.base_m), d.derived_m);
    assert_eq!(derived.get_implementation(d.mid1_m), d.derived_m);
    assert_eq!(derived.get_implementation(d.mid2_m), d.derived_m);

    let mid1 = cache.get(d.mid1, &types);
    assert_eq!(mid1.get_implementation(d.base_m), d.mid1_m);
    let mid2 = cache.get(d.mid2, &types);
    assert_eq!(mid2.get_implementation(d.base_m), d.mid2_m);

    let base = cache.get(d.base, &types);
    assert!(base.is_empty());
    assert_eq!(base.get_implementation(d.base_m), d.base_m);
}

#[test]
fn resolution_is_idempotent() {
    let mut types = TypeSystem::new();
    let d = declare_diamond(&mut types);
    let cache = VTableCache::new();
    for decl in [d.base, d.mid1, d.mid2, d.derived] {
        let table = cache.get(decl, &types);
        for m in [d.base_m, d.mid1_m, d.mid2_m, d.derived_m] {
            let resolved = table.get_implementation(m);
            assert_eq!(table.get_implementation(resolved), resolved);
        }
    }
}

#[test]
fn bases_are_computed_and_cached_once() {
    let mut types = TypeSystem::new();
    let d = declare_diamond(&mut types);
    let cache = VTableCache::new();
    assert!(cache.is_empty());

    let first = cache.get(d.derived, &types);
    assert_eq!(cache.len(), 4);
    assert!(cache.contains(d.base));
    let again = cache.get(d.derived, &types);
    assert!(Arc::ptr_eq(&first, &again));

    cache.clear();
    assert!(cache.is_empty());
    let rebuilt = cache.get(d.derived, &types);
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(*first, *rebuilt);
}

#[test]
fn property_accessors_participate() {
    let mut types = TypeSystem::new();
    let shape = types.declare_type("Shapes.Shape", TypeDeclKind::Class);
    let circle = types.declare_type("Shapes.Circle", TypeDeclKind::Class);
    types.add_base(circle, shape);

    let get_area = types.intern_name("get_Area");
    let area = types.declare_property(shape, "Area", TypeId::FLOAT64);
    let base_getter = types.declare_accessor(
        area,
        MethodSignature::new(get_area, MethodFlags::ABSTRACT, [], TypeId::FLOAT64),
    );
    let circle_area = types.declare_property(circle, "Area", TypeId::FLOAT64);
    let circle_getter = types.declare_accessor(
        circle_area,
        MethodSignature::new(get_area, MethodFlags::VIRTUAL, [], TypeId::FLOAT64),
    );
    types.add_base_method(circle_getter, base_getter);

    let cache = VTableCache::new();
    let table = cache.get(circle, &types);
    assert_eq!(table.get_implementation(base_getter), circle_getter);
    assert_eq!(
        table.overrides().collect::<Vec<_>>(),
        vec![(base_getter, circle_getter)]
    );
}

#[test]
fn later_own_override_replaces_inherited_entry() {
    let mut types = TypeSystem::new();
    let animal = types.declare_type("Zoo.Animal", TypeDeclKind::Class);
    let dog = types.declare_type("Zoo.Dog", TypeDeclKind::Class);
    let puppy = types.declare_type("Zoo.Puppy", TypeDeclKind::Class);
    types.add_base(dog, animal);
    types.add_base(puppy, dog);

    let speak = method(&mut types, animal, "Speak", MethodFlags::VIRTUAL);
    let dog_speak = method(&mut types, dog, "Speak", MethodFlags::VIRTUAL);
    let puppy_speak = method(&mut types, puppy, "Speak", MethodFlags::VIRTUAL);
    types.add_base_method(dog_speak, speak);
    // Overrides the root method directly rather than the intermediate one.
    types.add_base_method(puppy_speak, speak);

    let cache = VTableCache::new();
    let table = cache.get(puppy, &types);
    assert_eq!(table.get_implementation(speak), puppy_speak);
    assert_eq!(table.get_implementation(dog_speak), dog_speak);
    assert_eq!(cache.get(dog, &types).get_implementation(speak), dog_speak);
}

#[test]
fn resolve_call_devirtualizes_virtual_calls_only() {
    let mut types = TypeSystem::new();
    let d = declare_diamond(&mut types);
    let interner = PrototypeInterner::new();
    let cache = VTableCache::new();

    let virtual_call = interner.intern(
        PrototypeKind::Call {
            callee: d.base_m,
            lookup: MethodLookup::Virtual,
        },
        &types,
    );
    let static_call = interner.intern(
        PrototypeKind::Call {
            callee: d.mid1_m,
            lookup: MethodLookup::Static,
        },
        &types,
    );
    let not_a_call = interner.intern(
        PrototypeKind::Copy {
            result_type: TypeId::INT32,
        },
        &types,
    );

    assert_eq!(cache.resolve_call(&virtual_call, d.mid2, &types), Some(d.mid2_m));
    assert_eq!(cache.resolve_call(&virtual_call, d.derived, &types), Some(d.derived_m));
    assert_eq!(cache.resolve_call(&static_call, d.derived, &types), Some(d.mid1_m));
    assert_eq!(cache.resolve_call(&not_a_call, d.derived, &types), None);
}

#[test]
fn concurrent_population_agrees() {
    let mut types = TypeSystem::new();
    let d = declare_diamond(&mut types);
    let cache = VTableCache::new();
    let base_m = d.base_m;

    let resolved: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (types, cache) = (&types, &cache);
                let decl = if i % 2 == 0 { d.derived } else { d.mid1 };
                s.spawn(move || cache.get(decl, types).get_implementation(base_m))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, m) in resolved.into_iter().enumerate() {
        let expected = if i % 2 == 0 { d.derived_m } else { d.mid1_m };
        assert_eq!(m, expected);
    }
    assert_eq!(cache.len(), 4);
}
