//! Compilation sessions.
//!
//! A [`CompilationSession`] owns the shared state of one compilation: the
//! type system, the prototype interner, the vtable cache and the exception
//! rules. Nothing here is global; independent sessions (and tests) never
//! observe each other's caches.
//!
//! The session is `Sync`. Bodies are rewritten one worker at a time, but
//! many bodies may be lowered in parallel against the same session.

use std::sync::Arc;

use flint_ir::types::{MethodId, TypeDeclId, TypeSystem};
use flint_ir::{
    expand_fused, FlowGraph, Instruction, MemberMapping, Prototype, PrototypeInterner,
    PrototypeKind,
};
use rayon::prelude::*;

use crate::exceptions::{
    BodyExceptions, ExceptionAnalysis, ExceptionRules, ExceptionRulesConfig,
    ExceptionSpecification, RuleConfigError,
};
use crate::vtable::{VTable, VTableCache};

pub struct CompilationSession {
    types: TypeSystem,
    interner: PrototypeInterner,
    vtables: VTableCache,
    rules: Arc<ExceptionRules>,
}

impl CompilationSession {
    /// Create a session with the default exception rules.
    ///
    /// Fails if a configured well-known exception type does not resolve to
    /// exactly one declaration in `types`.
    pub fn new(types: TypeSystem, config: &ExceptionRulesConfig) -> Result<Self, RuleConfigError> {
        let rules = ExceptionRules::defaults(&types, config)?;
        Ok(Self::with_rules(types, Arc::new(rules)))
    }

    /// Create a session with an explicit rule registry, e.g. a layer of
    /// overrides over shared defaults.
    pub fn with_rules(types: TypeSystem, rules: Arc<ExceptionRules>) -> Self {
        tracing::debug!(
            decls = types.decl_count(),
            rules = rules.len(),
            "compilation session created"
        );
        Self {
            types,
            interner: PrototypeInterner::new(),
            vtables: VTableCache::new(),
            rules,
        }
    }

    #[inline]
    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    #[inline]
    pub fn interner(&self) -> &PrototypeInterner {
        &self.interner
    }

    #[inline]
    pub fn rules(&self) -> &Arc<ExceptionRules> {
        &self.rules
    }

    #[inline]
    pub fn vtables(&self) -> &VTableCache {
        &self.vtables
    }

    /// Intern `kind` against this session's type system.
    pub fn prototype(&self, kind: PrototypeKind) -> Prototype {
        self.interner.intern(kind, &self.types)
    }

    /// Expand every fused instruction in `graph`.
    pub fn lower(&self, graph: &mut FlowGraph) -> usize {
        expand_fused(graph, &self.interner, &self.types)
    }

    /// Lower many bodies in parallel. Returns the total number of fused
    /// instructions expanded.
    pub fn lower_all(&self, graphs: &mut [FlowGraph]) -> usize {
        let expanded: usize = graphs.par_iter_mut().map(|graph| self.lower(graph)).sum();
        tracing::debug!(bodies = graphs.len(), expanded, "lowered bodies");
        expanded
    }

    /// Instantiate `graph` through `mapping`.
    pub fn map_body(&self, graph: &mut FlowGraph, mapping: &dyn MemberMapping) {
        graph.map_members(mapping, &self.interner, &self.types);
    }

    pub fn vtable(&self, decl: TypeDeclId) -> Arc<VTable> {
        self.vtables.get(decl, &self.types)
    }

    /// The method a call reaches for a receiver of runtime type `receiver`.
    pub fn resolve_call(&self, call: &Prototype, receiver: TypeDeclId) -> Option<MethodId> {
        self.vtables.resolve_call(call, receiver, &self.types)
    }

    pub fn exception_analysis(&self) -> ExceptionAnalysis<'_> {
        ExceptionAnalysis::new(&self.rules, &self.types)
    }

    pub fn exception_spec(&self, instruction: &Instruction) -> ExceptionSpecification {
        self.exception_analysis().spec_of(instruction)
    }

    pub fn analyze_exceptions(&self, graph: &FlowGraph) -> BodyExceptions {
        self.exception_analysis().analyze(graph)
    }
}

impl std::fmt::Debug for CompilationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationSession")
            .field("types", &self.types)
            .field("interner", &self.interner)
            .field("vtables", &self.vtables)
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
