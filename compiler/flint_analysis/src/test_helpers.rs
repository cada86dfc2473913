//! Shared fixtures for analysis tests. Only compiled in test builds.

use flint_ir::types::{
    MethodFlags, MethodId, MethodSignature, TypeDeclId, TypeDeclKind, TypeId, TypeSystem,
};

/// The runtime exception hierarchy the default rules resolve.
pub(crate) struct Runtime {
    pub exception: TypeDeclId,
    pub null_reference: TypeDeclId,
    pub index_out_of_range: TypeDeclId,
    pub array_type_mismatch: TypeDeclId,
    pub invalid_cast: TypeDeclId,
}

/// Declare `System.Exception` and the well-known exceptions deriving from it.
pub(crate) fn declare_runtime(types: &mut TypeSystem) -> Runtime {
    let exception = types.declare_type("System.Exception", TypeDeclKind::Class);
    let mut derived = |name: &str| {
        let decl = types.declare_type(name, TypeDeclKind::Class);
        types.add_base(decl, exception);
        decl
    };
    Runtime {
        exception,
        null_reference: derived("System.NullReferenceException"),
        index_out_of_range: derived("System.IndexOutOfRangeException"),
        array_type_mismatch: derived("System.ArrayTypeMismatchException"),
        invalid_cast: derived("System.InvalidCastException"),
    }
}

pub(crate) fn method(
    types: &mut TypeSystem,
    owner: TypeDeclId,
    name: &str,
    flags: MethodFlags,
) -> MethodId {
    let name = types.intern_name(name);
    types.declare_method(owner, MethodSignature::new(name, flags, [], TypeId::VOID))
}

/// `Base.M`; `Mid1.M` and `Mid2.M` override it; `Derived : Mid1, Mid2`
/// overrides both.
pub(crate) struct Diamond {
    pub base: TypeDeclId,
    pub mid1: TypeDeclId,
    pub mid2: TypeDeclId,
    pub derived: TypeDeclId,
    pub base_m: MethodId,
    pub mid1_m: MethodId,
    pub mid2_m: MethodId,
    pub derived_m: MethodId,
}

pub(crate) fn declare_diamond(types: &mut TypeSystem) -> Diamond {
    let base = types.declare_type("Shapes.Base", TypeDeclKind::Interface);
    let mid1 = types.declare_type("Shapes.Mid1", TypeDeclKind::Class);
    let mid2 = types.declare_type("Shapes.Mid2", TypeDeclKind::Class);
    let derived = types.declare_type("Shapes.Derived", TypeDeclKind::Class);
    types.add_base(mid1, base);
    types.add_base(mid2, base);
    types.add_base(derived, mid1);
    types.add_base(derived, mid2);

    let base_m = method(types, base, "M", MethodFlags::ABSTRACT);
    let mid1_m = method(types, mid1, "M", MethodFlags::VIRTUAL);
    let mid2_m = method(types, mid2, "M", MethodFlags::VIRTUAL);
    let derived_m = method(types, derived, "M", MethodFlags::VIRTUAL);
    types.add_base_method(mid1_m, base_m);
    types.add_base_method(mid2_m, base_m);
    types.add_base_method(derived_m, mid1_m);
    types.add_base_method(derived_m, mid2_m);

    Diamond {
        base,
        mid1,
        mid2,
        derived,
        base_m,
        mid1_m,
        mid2_m,
        derived_m,
    }
}
