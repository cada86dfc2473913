//! Analyses over the Flint IR.
//!
//! - **Exception specifications** ([`exceptions`]): which exceptions each
//!   instruction may throw, from a layered, declarative rule registry.
//! - **VTables** ([`vtable`]): per-type override maps, resolved bottom-up
//!   and memoized in a concurrent cache.
//! - **Sessions** ([`CompilationSession`]): the owner of the interner,
//!   caches and rules shared by one compilation.

pub mod exceptions;
mod session;
pub mod vtable;

#[cfg(test)]
mod test_helpers;

pub use exceptions::{
    ExceptionAnalysis, ExceptionRule, ExceptionRules, ExceptionRulesConfig, ExceptionSpecification,
    IntrinsicFallback, Nullability, RuleConfigError,
};
pub use session::CompilationSession;
pub use vtable::{VTable, VTableCache};
