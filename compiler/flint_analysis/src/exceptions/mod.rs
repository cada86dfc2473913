//! Exception-specification inference.
//!
//! - **[`ExceptionSpecification`]**: the algebra (`NoThrow`, `ThrowAny`,
//!   `Exact`, `NullCheck`, `Union`)
//! - **[`ExceptionRules`]**: layered registry from prototype kinds and
//!   intrinsic names to rules
//! - **[`ExceptionAnalysis`]**: per-instruction queries over a flow graph

mod analysis;
mod config;
mod defaults;
mod rules;
mod spec;

pub use analysis::{nullability, BodyExceptions, ExceptionAnalysis};
pub use config::{ExceptionRulesConfig, IntrinsicFallback, RuleConfigError, WellKnownExceptions};
pub use defaults::declared_spec;
pub use rules::{ExceptionRule, ExceptionRules, RuleFn, RuleKey};
pub use spec::{ExceptionSpecification, Nullability};
