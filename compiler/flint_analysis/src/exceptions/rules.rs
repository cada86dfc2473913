//! The exception rule registry.
//!
//! A registry maps a [`RuleKey`] (a prototype kind, or an intrinsic's
//! qualified name) to an [`ExceptionRule`]. Registries layer: a registry
//! built [`on top of`](ExceptionRules::with_base) a shared base consults its
//! own rules first and falls through to the base, so a hosting environment
//! can override a few built-in rules without rebuilding the rest.
//!
//! Lookup order for a prototype:
//!
//! 1. For intrinsics, and for calls to methods carrying
//!    [`Attribute::Intrinsic`], the rule for the intrinsic's name.
//! 2. The rule for the prototype's kind.
//! 3. [`ThrowAny`](ExceptionSpecification::ThrowAny).
//!
//! Each step searches every layer, innermost first, before moving on.

use std::fmt;
use std::sync::Arc;

use flint_ir::types::{Attribute, TypeSystem};
use flint_ir::{Name, Prototype, PrototypeKind, PrototypeTag};
use rustc_hash::FxHashMap;

use super::ExceptionSpecification;

/// Signature of a computed rule.
pub type RuleFn = dyn Fn(&Prototype, &TypeSystem) -> ExceptionSpecification + Send + Sync;

/// How to derive the specification of a prototype.
#[derive(Clone)]
pub enum ExceptionRule {
    /// The same specification for every prototype the rule covers.
    Constant(ExceptionSpecification),
    /// A function of the prototype's static parameters.
    Computed(Arc<RuleFn>),
}

impl ExceptionRule {
    pub fn computed(
        f: impl Fn(&Prototype, &TypeSystem) -> ExceptionSpecification + Send + Sync + 'static,
    ) -> Self {
        ExceptionRule::Computed(Arc::new(f))
    }

    pub fn evaluate(&self, proto: &Prototype, types: &TypeSystem) -> ExceptionSpecification {
        match self {
            ExceptionRule::Constant(spec) => spec.clone(),
            ExceptionRule::Computed(f) => f(proto, types),
        }
    }
}

impl From<ExceptionSpecification> for ExceptionRule {
    fn from(spec: ExceptionSpecification) -> Self {
        ExceptionRule::Constant(spec)
    }
}

impl fmt::Debug for ExceptionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionRule::Constant(spec) => f.debug_tuple("Constant").field(spec).finish(),
            ExceptionRule::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// What a rule is registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKey {
    Kind(PrototypeTag),
    Intrinsic(Name),
}

/// A layered rule registry.
#[derive(Clone, Debug, Default)]
pub struct ExceptionRules {
    base: Option<Arc<ExceptionRules>>,
    rules: FxHashMap<RuleKey, ExceptionRule>,
}

impl ExceptionRules {
    /// An empty registry; every lookup yields `ThrowAny`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty layer over `base`.
    pub fn with_base(base: Arc<ExceptionRules>) -> Self {
        Self {
            base: Some(base),
            rules: FxHashMap::default(),
        }
    }

    /// Register `rule` for `key` in this layer, returning the rule it
    /// replaces in this layer.
    pub fn register(&mut self, key: RuleKey, rule: impl Into<ExceptionRule>) -> Option<ExceptionRule> {
        self.rules.insert(key, rule.into())
    }

    pub fn register_kind(
        &mut self,
        tag: PrototypeTag,
        rule: impl Into<ExceptionRule>,
    ) -> Option<ExceptionRule> {
        self.register(RuleKey::Kind(tag), rule)
    }

    pub fn register_intrinsic(
        &mut self,
        name: Name,
        rule: impl Into<ExceptionRule>,
    ) -> Option<ExceptionRule> {
        self.register(RuleKey::Intrinsic(name), rule)
    }

    /// The rule for `key`, searching this layer then its bases.
    pub fn get(&self, key: RuleKey) -> Option<&ExceptionRule> {
        let mut layer = Some(self);
        while let Some(current) = layer {
            if let Some(rule) = current.rules.get(&key) {
                return Some(rule);
            }
            layer = current.base.as_deref();
        }
        None
    }

    /// Number of rules registered in this layer alone.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule that applies to `proto`, if any.
    pub fn rule_for(&self, proto: &Prototype, types: &TypeSystem) -> Option<&ExceptionRule> {
        intrinsic_name(proto, types)
            .and_then(|name| self.get(RuleKey::Intrinsic(name)))
            .or_else(|| self.get(RuleKey::Kind(proto.tag())))
    }

    /// The specification of `proto`; `ThrowAny` when no rule applies.
    pub fn spec_of(&self, proto: &Prototype, types: &TypeSystem) -> ExceptionSpecification {
        match self.rule_for(proto, types) {
            Some(rule) => rule.evaluate(proto, types),
            None => {
                tracing::trace!(kind = ?proto.tag(), "no exception rule; assuming ThrowAny");
                ExceptionSpecification::ThrowAny
            }
        }
    }
}

/// The intrinsic a prototype stands for: its own name, or the name on the
/// callee of a direct call.
fn intrinsic_name(proto: &Prototype, types: &TypeSystem) -> Option<Name> {
    match proto.kind() {
        PrototypeKind::Intrinsic { name, .. } => Some(*name),
        PrototypeKind::Call { callee, .. } => {
            types
                .method(*callee)
                .attributes
                .iter()
                .find_map(|attr| match attr {
                    Attribute::Intrinsic(name) => Some(*name),
                    Attribute::NoThrow | Attribute::Throws(_) => None,
                })
        }
        _ => None,
    }
}
