//! Configuration for the default exception rules.

use flint_ir::types::{TypeDeclId, TypeSystem};

use super::ExceptionSpecification;

/// What an intrinsic without a registered rule may throw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntrinsicFallback {
    /// Anything (the top specification).
    #[default]
    ThrowAny,
    /// Nothing. Only sound when every throwing intrinsic has a rule.
    NoThrow,
}

impl IntrinsicFallback {
    pub fn spec(self) -> ExceptionSpecification {
        match self {
            IntrinsicFallback::ThrowAny => ExceptionSpecification::ThrowAny,
            IntrinsicFallback::NoThrow => ExceptionSpecification::NoThrow,
        }
    }
}

/// The well-known exception types the default rules throw, by qualified
/// name, and the fallback for unregistered intrinsics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExceptionRulesConfig {
    pub null_reference: String,
    pub index_out_of_range: String,
    pub array_type_mismatch: String,
    pub invalid_cast: String,
    pub intrinsic_fallback: IntrinsicFallback,
}

impl Default for ExceptionRulesConfig {
    fn default() -> Self {
        Self {
            null_reference: "System.NullReferenceException".to_owned(),
            index_out_of_range: "System.IndexOutOfRangeException".to_owned(),
            array_type_mismatch: "System.ArrayTypeMismatchException".to_owned(),
            invalid_cast: "System.InvalidCastException".to_owned(),
            intrinsic_fallback: IntrinsicFallback::default(),
        }
    }
}

/// A configured exception type that does not resolve to exactly one
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleConfigError {
    #[error("well-known exception type `{name}` is not declared")]
    Missing { name: String },
    #[error("well-known exception type `{name}` is ambiguous ({count} declarations)")]
    Ambiguous { name: String, count: usize },
}

/// The configured exception types, resolved against a type system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownExceptions {
    pub null_reference: TypeDeclId,
    pub index_out_of_range: TypeDeclId,
    pub array_type_mismatch: TypeDeclId,
    pub invalid_cast: TypeDeclId,
}

impl WellKnownExceptions {
    /// Resolve every configured name to exactly one declaration.
    pub fn resolve(
        config: &ExceptionRulesConfig,
        types: &TypeSystem,
    ) -> Result<Self, RuleConfigError> {
        Ok(Self {
            null_reference: resolve_one(types, &config.null_reference)?,
            index_out_of_range: resolve_one(types, &config.index_out_of_range)?,
            array_type_mismatch: resolve_one(types, &config.array_type_mismatch)?,
            invalid_cast: resolve_one(types, &config.invalid_cast)?,
        })
    }
}

fn resolve_one(types: &TypeSystem, name: &str) -> Result<TypeDeclId, RuleConfigError> {
    let found = types.resolve_by_name(name);
    match found.as_slice() {
        [only] => Ok(*only),
        [] => Err(RuleConfigError::Missing {
            name: name.to_owned(),
        }),
        many => Err(RuleConfigError::Ambiguous {
            name: name.to_owned(),
            count: many.len(),
        }),
    }
}
