use pretty_assertions::assert_eq;

use super::ExceptionSpecification as Spec;
use super::*;
use crate::test_helpers::declare_runtime;

fn ids() -> (TypeDeclId, TypeDeclId, TypeDeclId) {
    (TypeDeclId::new(1), TypeDeclId::new(2), TypeDeclId::new(3))
}

#[test]
fn union_with_more_members_differs_from_exact() {
    let (a, b, _) = ids();
    assert_ne!(Spec::union([Spec::Exact(a), Spec::Exact(b)]), Spec::Exact(a));
}

#[test]
fn nested_unions_flatten() {
    let (a, b, _) = ids();
    let nested = Spec::union([Spec::union([Spec::Exact(a)]), Spec::Exact(b)]);
    assert_eq!(nested, Spec::union([Spec::Exact(a), Spec::Exact(b)]));
    assert_eq!(nested.members().len(), 2);

    let deep = Spec::Union(Box::new([
        Spec::Union(Box::new([Spec::Exact(a), Spec::Exact(b)])),
        Spec::Exact(a),
    ]));
    assert_eq!(Spec::union([deep]).members(), &[Spec::Exact(a), Spec::Exact(b)]);
}

#[test]
fn union_equality_ignores_order() {
    let (a, b, c) = ids();
    let left = Spec::union([Spec::Exact(a), Spec::Exact(b), Spec::Exact(c)]);
    let right = Spec::union([Spec::Exact(c), Spec::Exact(a), Spec::Exact(b)]);
    assert_eq!(left, right);
    assert_ne!(left.to_string(), right.to_string());
}

#[test]
fn union_canonicalizes() {
    let (a, _, _) = ids();
    assert_eq!(Spec::union([]), Spec::NoThrow);
    assert_eq!(Spec::union([Spec::NoThrow, Spec::NoThrow]), Spec::NoThrow);
    assert_eq!(Spec::union([Spec::Exact(a)]), Spec::Exact(a));
    assert_eq!(Spec::union([Spec::Exact(a), Spec::Exact(a)]), Spec::Exact(a));
    assert_eq!(Spec::union([Spec::NoThrow, Spec::Exact(a)]), Spec::Exact(a));
    assert_eq!(Spec::union([Spec::Exact(a), Spec::ThrowAny]), Spec::ThrowAny);
    assert_eq!(Spec::Exact(a).or(Spec::NoThrow), Spec::Exact(a));
}

#[test]
fn hand_built_unions_compare_by_canonical_form() {
    let (a, b, _) = ids();
    assert_eq!(Spec::Union(Box::new([Spec::Exact(a)])), Spec::Exact(a));
    assert_eq!(Spec::Exact(a), Spec::Union(Box::new([Spec::Exact(a), Spec::Exact(a)])));
    assert_eq!(Spec::Union(Box::new([])), Spec::NoThrow);
    assert_eq!(
        Spec::Union(Box::new([Spec::Exact(b), Spec::NoThrow, Spec::Exact(a)])),
        Spec::union([Spec::Exact(a), Spec::Exact(b)])
    );
    assert_eq!(
        Spec::Union(Box::new([Spec::Exact(a), Spec::ThrowAny])),
        Spec::ThrowAny
    );
    assert_ne!(Spec::Union(Box::new([Spec::Exact(a)])), Spec::Exact(b));
}

#[test]
fn can_throw() {
    let (a, _, _) = ids();
    assert!(!Spec::NoThrow.can_throw());
    assert!(Spec::ThrowAny.can_throw());
    assert!(Spec::Exact(a).can_throw());
    assert!(Spec::NullCheck {
        argument: 0,
        exception: a
    }
    .can_throw());
}

#[test]
fn may_throw_follows_subtyping() {
    let mut types = TypeSystem::new();
    let rt = declare_runtime(&mut types);
    let spec = Spec::union([
        Spec::NullCheck {
            argument: 0,
            exception: rt.null_reference,
        },
        Spec::Exact(rt.index_out_of_range),
    ]);

    assert!(spec.may_throw(rt.exception, &types));
    assert!(spec.may_throw(rt.null_reference, &types));
    assert!(spec.may_throw(rt.index_out_of_range, &types));
    assert!(!spec.may_throw(rt.invalid_cast, &types));
    assert!(!Spec::Exact(rt.exception).may_throw(rt.null_reference, &types));
    assert!(Spec::ThrowAny.may_throw(rt.invalid_cast, &types));
    assert!(!Spec::NoThrow.may_throw(rt.exception, &types));
}

#[test]
fn refine_resolves_known_null_checks() {
    let (a, b, _) = ids();
    let spec = Spec::union([
        Spec::NullCheck {
            argument: 0,
            exception: a,
        },
        Spec::NullCheck {
            argument: 1,
            exception: a,
        },
        Spec::Exact(b),
    ]);

    let non_null_receiver = spec.refine(|i| {
        if i == 0 {
            Nullability::NonNull
        } else {
            Nullability::Unknown
        }
    });
    assert_eq!(
        non_null_receiver,
        Spec::union([
            Spec::NullCheck {
                argument: 1,
                exception: a
            },
            Spec::Exact(b)
        ])
    );

    let all_null = spec.refine(|_| Nullability::Null);
    assert_eq!(all_null, Spec::union([Spec::Exact(a), Spec::Exact(b)]));

    let lone_check = Spec::NullCheck {
        argument: 0,
        exception: a,
    };
    assert_eq!(lone_check.refine(|_| Nullability::NonNull), Spec::NoThrow);
    assert_eq!(lone_check.refine(|_| Nullability::Unknown), lone_check);
}

#[test]
fn display_forms() {
    let mut types = TypeSystem::new();
    let rt = declare_runtime(&mut types);
    let spec = Spec::union([
        Spec::NullCheck {
            argument: 0,
            exception: rt.null_reference,
        },
        Spec::Exact(rt.invalid_cast),
    ]);
    assert_eq!(
        spec.display(&types).to_string(),
        "if null(#0) throws(System.NullReferenceException) | throws(System.InvalidCastException)"
    );
    assert_eq!(Spec::NoThrow.to_string(), "nothrow");
    assert_eq!(Spec::ThrowAny.to_string(), "throws(*)");
    assert_eq!(
        Spec::Exact(rt.invalid_cast).to_string(),
        format!("throws({:?})", rt.invalid_cast)
    );
}
