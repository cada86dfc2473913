//! The built-in rule set.

use flint_ir::types::{Attribute, MethodId, TypeSystem};
use flint_ir::{PrototypeKind, PrototypeTag};

use super::{
    ExceptionRule, ExceptionRules, ExceptionRulesConfig, ExceptionSpecification as Spec,
    RuleConfigError, WellKnownExceptions,
};

/// Intrinsics that cannot trap.
const PURE_INTRINSICS: &[&str] = &[
    "arith.add",
    "arith.sub",
    "arith.mul",
    "arith.neg",
    "arith.and",
    "arith.or",
    "arith.xor",
    "arith.not",
    "arith.shl",
    "arith.shr",
    "arith.eq",
    "arith.ne",
    "arith.lt",
    "arith.le",
    "arith.gt",
    "arith.ge",
    "arith.convert",
    "exception.capture",
    "exception.get_captured",
];

/// Intrinsics that raise a caller-supplied exception.
const THROWING_INTRINSICS: &[&str] = &["exception.throw", "exception.rethrow"];

/// What a method declares it may throw: `NoThrow` for a `NoThrow`
/// attribute, the union of its `Throws` attributes, or `ThrowAny` when it
/// declares nothing.
pub fn declared_spec(method: MethodId, types: &TypeSystem) -> Spec {
    let attributes = &types.method(method).attributes;
    if attributes.contains(&Attribute::NoThrow) {
        return Spec::NoThrow;
    }
    let thrown: Vec<Spec> = attributes
        .iter()
        .filter_map(|attr| match attr {
            Attribute::Throws(ty) => Some(Spec::Exact(*ty)),
            Attribute::NoThrow | Attribute::Intrinsic(_) => None,
        })
        .collect();
    if thrown.is_empty() {
        Spec::ThrowAny
    } else {
        Spec::union(thrown)
    }
}

impl ExceptionRules {
    /// The built-in rules, with exception types resolved from `config`.
    ///
    /// Every configured type must name exactly one declaration; resolution
    /// happens here, once, never per instruction.
    pub fn defaults(
        types: &TypeSystem,
        config: &ExceptionRulesConfig,
    ) -> Result<Self, RuleConfigError> {
        let known = WellKnownExceptions::resolve(config, types)?;
        let null_check = |argument| Spec::NullCheck {
            argument,
            exception: known.null_reference,
        };
        let out_of_range = Spec::Exact(known.index_out_of_range);
        let type_mismatch = Spec::Exact(known.array_type_mismatch);

        let mut rules = ExceptionRules::new();

        for tag in [
            PrototypeTag::Alloca,
            PrototypeTag::AllocaArray,
            PrototypeTag::Box,
            PrototypeTag::Constant,
            PrototypeTag::Copy,
            PrototypeTag::DynamicCast,
            PrototypeTag::GetStaticFieldPointer,
            PrototypeTag::Load,
            PrototypeTag::ReinterpretCast,
            PrototypeTag::Store,
        ] {
            rules.register_kind(tag, Spec::NoThrow);
        }
        for tag in [
            PrototypeTag::GetFieldPointer,
            PrototypeTag::LoadField,
            PrototypeTag::StoreField,
        ] {
            rules.register_kind(tag, null_check(0));
        }
        rules.register_kind(
            PrototypeTag::Unbox,
            Spec::union([null_check(0), Spec::Exact(known.invalid_cast)]),
        );
        rules.register_kind(PrototypeTag::IndirectCall, Spec::ThrowAny);
        rules.register_kind(PrototypeTag::Intrinsic, config.intrinsic_fallback.spec());

        let nre = known.null_reference;
        rules.register_kind(
            PrototypeTag::Call,
            ExceptionRule::computed(move |proto, types| match proto.kind() {
                PrototypeKind::Call { callee, .. } => {
                    let declared = declared_spec(*callee, types);
                    if types.method(*callee).is_static() {
                        declared
                    } else {
                        Spec::union([
                            Spec::NullCheck {
                                argument: 0,
                                exception: nre,
                            },
                            declared,
                        ])
                    }
                }
                _ => Spec::ThrowAny,
            }),
        );
        rules.register_kind(
            PrototypeTag::NewObject,
            ExceptionRule::computed(|proto, types| match proto.kind() {
                PrototypeKind::NewObject { constructor } => declared_spec(*constructor, types),
                _ => Spec::ThrowAny,
            }),
        );
        rules.register_kind(
            PrototypeTag::NewDelegate,
            ExceptionRule::computed(move |proto, _| match proto.kind() {
                PrototypeKind::NewDelegate {
                    has_this_argument: true,
                    lookup: flint_ir::MethodLookup::Virtual,
                    ..
                } => Spec::NullCheck {
                    argument: 0,
                    exception: nre,
                },
                PrototypeKind::NewDelegate { .. } => Spec::NoThrow,
                _ => Spec::ThrowAny,
            }),
        );

        let names = types.names();
        rules.register_intrinsic(
            names.intern("array.store_element"),
            Spec::union([null_check(0), out_of_range.clone(), type_mismatch.clone()]),
        );
        rules.register_intrinsic(
            names.intern("array.get_element_pointer"),
            Spec::union([null_check(0), out_of_range.clone(), type_mismatch]),
        );
        rules.register_intrinsic(
            names.intern("array.load_element"),
            Spec::union([null_check(0), out_of_range.clone()]),
        );
        rules.register_intrinsic(names.intern("array.get_length"), null_check(0));
        rules.register_intrinsic(names.intern("array.new_array"), out_of_range);
        for name in PURE_INTRINSICS {
            rules.register_intrinsic(names.intern(name), Spec::NoThrow);
        }
        for name in THROWING_INTRINSICS {
            rules.register_intrinsic(names.intern(name), Spec::ThrowAny);
        }

        tracing::debug!(rules = rules.len(), "default exception rules built");
        Ok(rules)
    }
}
